use crate::geometry::BoxSensorSpec;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct CornerToolConfig {
    pub sensors: Vec<BoxSensorSpec>,
    pub output: CornerOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct CornerOutputConfig {
    pub local_json: PathBuf,
    pub global_json: PathBuf,
    /// Fixed-width dump of sensor centres in the global frame.
    #[serde(default)]
    pub positions_txt: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<CornerToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
