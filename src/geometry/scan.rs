//! Corner discovery by edge walking.
//!
//! `scan_to_edge` walks from an interior point along one local axis in steps
//! of `direction`. When a probe leaves the volume it steps back and divides
//! the step by ten, so each face is located one decade at a time rather than
//! by true bisection. The walk stops once the step is at most
//! [`SCAN_PRECISION`] local units and then retreats one final step so the
//! returned point is guaranteed to be inside.
//!
//! Corner labels depend on the scan order in [`find_corners_with`]: A is the
//! most negative corner, B/D/E are reached from A along +X/+Y/+Z, C from B
//! along +Y, G from C along +Z, and F/H from G along -Y/-X.

use super::{Axis, SensorGeometry};
use crate::error::ScanError;
use log::debug;
use nalgebra::Point3;
use serde::Serialize;

/// Step size at which the walk stops (local units).
pub const SCAN_PRECISION: f64 = 1e-8;
/// Probe budget for one axis walk.
pub const DEFAULT_MAX_PROBES: usize = 1000;

const START: [f64; 3] = [1e-5, 1e-5, 1e-5];

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum CornerLabel {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl CornerLabel {
    pub const ALL: [CornerLabel; 8] = [
        CornerLabel::A,
        CornerLabel::B,
        CornerLabel::C,
        CornerLabel::D,
        CornerLabel::E,
        CornerLabel::F,
        CornerLabel::G,
        CornerLabel::H,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CornerLabel::A => "A",
            CornerLabel::B => "B",
            CornerLabel::C => "C",
            CornerLabel::D => "D",
            CornerLabel::E => "E",
            CornerLabel::F => "F",
            CornerLabel::G => "G",
            CornerLabel::H => "H",
        }
    }

    #[inline]
    fn index(self) -> usize {
        self as usize
    }
}

/// Eight labelled corners of a sensor in the local and global frames.
#[derive(Clone, Debug, PartialEq)]
pub struct CuboidCorners {
    local: [Point3<f64>; 8],
    global: [Point3<f64>; 8],
}

impl CuboidCorners {
    pub fn local(&self, label: CornerLabel) -> Point3<f64> {
        self.local[label.index()]
    }

    pub fn global(&self, label: CornerLabel) -> Point3<f64> {
        self.global[label.index()]
    }
}

/// Corners of one named sensor.
#[derive(Clone, Debug)]
pub struct SensorCorners {
    pub name: String,
    pub corners: CuboidCorners,
}

/// Walks from `start` along `axis` until the face of the volume is found.
pub fn scan_to_edge<G: SensorGeometry + ?Sized>(
    geo: &G,
    start: Point3<f64>,
    axis: Axis,
    direction: f64,
    max_probes: usize,
) -> Result<Point3<f64>, ScanError> {
    let inside = |p: &Point3<f64>| geo.is_inside(&geo.to_global(p));
    let i = axis.index();
    let mut p = start;
    if !inside(&p) {
        return Err(ScanError::StartOutside {
            sensor: geo.name().to_string(),
            axis,
            x: p.x,
            y: p.y,
            z: p.z,
        });
    }

    let mut step = direction;
    let mut probes = 0usize;
    while step.abs() > SCAN_PRECISION {
        if probes >= max_probes {
            return Err(ScanError::NotConverged {
                sensor: geo.name().to_string(),
                axis,
                steps: probes,
            });
        }
        probes += 1;
        if inside(&p) {
            p[i] += step;
        } else {
            p[i] -= step;
            step /= 10.0;
        }
    }
    // Retreat once more so rounding cannot leave the point on the face.
    p[i] -= step;
    if !inside(&p) {
        return Err(ScanError::EndOutside {
            sensor: geo.name().to_string(),
            axis,
        });
    }
    Ok(p)
}

/// Finds the eight corners of a box-shaped sensor.
pub fn find_corners<G: SensorGeometry + ?Sized>(geo: &G) -> Result<CuboidCorners, ScanError> {
    find_corners_with(geo, DEFAULT_MAX_PROBES)
}

pub fn find_corners_with<G: SensorGeometry + ?Sized>(
    geo: &G,
    max_probes: usize,
) -> Result<CuboidCorners, ScanError> {
    let scan = |from: Point3<f64>, axis: Axis, dir: f64| scan_to_edge(geo, from, axis, dir, max_probes);

    let a = scan(Point3::from(START), Axis::X, -1.0)?;
    let a = scan(a, Axis::Y, -1.0)?;
    let a = scan(a, Axis::Z, -1.0)?;
    let b = scan(a, Axis::X, 1.0)?;
    let d = scan(a, Axis::Y, 1.0)?;
    let e = scan(a, Axis::Z, 1.0)?;
    let c = scan(b, Axis::Y, 1.0)?;
    let g = scan(c, Axis::Z, 1.0)?;
    let f = scan(g, Axis::Y, -1.0)?;
    let h = scan(g, Axis::X, -1.0)?;

    let local = [a, b, c, d, e, f, g, h];
    let global = local.map(|p| geo.to_global(&p));
    debug!("corner scan: {} A={:?} G={:?}", geo.name(), a, g);
    Ok(CuboidCorners { local, global })
}

/// Scans every sensor, failing on the first sensor that cannot be scanned.
#[cfg(not(feature = "parallel"))]
pub fn scan_sensors<G: SensorGeometry + Sync>(sensors: &[G]) -> Result<Vec<SensorCorners>, ScanError> {
    sensors.iter().map(scan_one).collect()
}

/// Scans every sensor, failing on the first sensor that cannot be scanned.
#[cfg(feature = "parallel")]
pub fn scan_sensors<G: SensorGeometry + Sync>(sensors: &[G]) -> Result<Vec<SensorCorners>, ScanError> {
    use rayon::prelude::*;
    sensors.par_iter().map(scan_one).collect()
}

fn scan_one<G: SensorGeometry>(geo: &G) -> Result<SensorCorners, ScanError> {
    Ok(SensorCorners {
        name: geo.name().to_string(),
        corners: find_corners(geo)?,
    })
}
