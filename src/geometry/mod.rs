//! Sensor geometry queries and the corner scan.
//!
//! The detector description is only reachable through point queries: a
//! sensor can map local points to the global frame and tell whether a global
//! point lies inside it. [`scan`] recovers the bounding cuboid of a sensor by
//! walking to its faces along the local axes.

pub mod export;
pub mod scan;
pub mod sensor;

pub use export::{format_position_line, module_element_path, CornerExport};
pub use scan::{
    find_corners, find_corners_with, scan_sensors, scan_to_edge, CornerLabel, CuboidCorners,
    SensorCorners, DEFAULT_MAX_PROBES, SCAN_PRECISION,
};
pub use sensor::{BoxSensor, BoxSensorSpec, SensorGeometry};

use serde::{Deserialize, Serialize};

/// Local coordinate axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    #[inline]
    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}
