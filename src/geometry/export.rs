//! Corner-geometry exchange files and ladder position dumps.
use super::scan::{CornerLabel, SensorCorners};
use crate::io::write_json_file;
use nalgebra::Point3;
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::Path;

type CornerMap = BTreeMap<String, BTreeMap<&'static str, [f64; 3]>>;

/// Sensor name → corner label → coordinates, for both frames.
#[derive(Clone, Debug, Default, Serialize)]
pub struct CornerExport {
    pub local: CornerMap,
    pub global: CornerMap,
}

impl CornerExport {
    pub fn from_sensors(sensors: &[SensorCorners]) -> Self {
        let mut export = Self::default();
        for sensor in sensors {
            let mut local = BTreeMap::new();
            let mut global = BTreeMap::new();
            for label in CornerLabel::ALL {
                local.insert(label.as_str(), to_array(&sensor.corners.local(label)));
                global.insert(label.as_str(), to_array(&sensor.corners.global(label)));
            }
            export.local.insert(sensor.name.clone(), local);
            export.global.insert(sensor.name.clone(), global);
        }
        export
    }

    /// Writes the local and global maps as two separate JSON documents.
    pub fn write(&self, local_path: &Path, global_path: &Path) -> Result<(), String> {
        write_json_file(local_path, &self.local)?;
        write_json_file(global_path, &self.global)
    }
}

fn to_array(p: &Point3<f64>) -> [f64; 3] {
    [p.x, p.y, p.z]
}

/// Detector-element path of a VP module; even modules sit on the left half.
pub fn module_element_path(module: usize) -> String {
    let side = if module % 2 == 1 { "Right" } else { "Left" };
    format!(
        "/dd/Structure/LHCb/BeforeMagnetRegion/VP/VP{side}/Module{module:02}WithSupport/Module{module:02}"
    )
}

/// One line of the ladder-centre dump used to compare alignment databases.
pub fn format_position_line(name: &str, position: &Point3<f64>) -> String {
    format!(
        "{name:>85}{:>18}{:>18}{:>18}\n",
        format!("{:.12}", position.x),
        format!("{:.12}", position.y),
        format!("{:.12}", position.z)
    )
}
