use crate::stats::SummaryOptions;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
pub struct SummaryToolConfig {
    /// Scenario output directory holding `tracks_*.jsonl` and `residuals_*.jsonl`.
    pub input_dir: PathBuf,
    #[serde(default)]
    pub options: SummaryOptions,
    pub output_json: PathBuf,
}

pub fn load_config(path: &Path) -> Result<SummaryToolConfig, String> {
    let data = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    serde_json::from_str(&data)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binning_override() {
        let cfg: SummaryToolConfig = serde_json::from_str(
            r#"{
                "input_dir": "out/x50",
                "options": { "inv_pt": { "bins": 10, "min": 0.0, "max": 2.0 }, "track_types": ["Long"] },
                "output_json": "summary.json"
            }"#,
        )
        .unwrap();
        assert_eq!(cfg.options.inv_pt.bins, 10);
        assert_eq!(cfg.options.momentum.bins, 25);
        assert_eq!(cfg.options.track_types, vec!["Long".to_string()]);
    }
}
