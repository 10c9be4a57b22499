use crate::alignment::PerturbationParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct AlignmentToolConfig {
    #[serde(default)]
    pub perturbation: PerturbationParams,
    pub output: AlignmentOutputConfig,
}

#[derive(Debug, Deserialize)]
pub struct AlignmentOutputConfig {
    /// System and half conditions.
    pub global_xml: PathBuf,
    /// Per-module conditions.
    pub modules_xml: PathBuf,
    /// Optional JSON dump of the generated records.
    #[serde(default)]
    pub records_json: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<AlignmentToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
