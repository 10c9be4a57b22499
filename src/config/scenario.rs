use crate::aggregate::AggregatorConfig;
use crate::residual::{ParabolicExtrapolator, ResidualFitParams};
use crate::vertex::LinearVertexFitter;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct ScenarioToolConfig {
    /// JSON Lines event dump of the scenario.
    pub events: PathBuf,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    /// Output directory of the undistorted scenario; enables true residuals.
    #[serde(default)]
    pub reference_dir: Option<PathBuf>,
    #[serde(default)]
    pub residual: ResidualFitParams,
    #[serde(default)]
    pub extrapolator: ParabolicExtrapolator,
    #[serde(default)]
    pub vertex: LinearVertexFitter,
    #[serde(default)]
    pub report_json: Option<PathBuf>,
}

pub fn load_config(path: &Path) -> Result<ScenarioToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}
