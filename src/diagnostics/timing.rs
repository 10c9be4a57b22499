use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Wall time spent in one phase of a scenario run.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub label: String,
    pub elapsed_ms: f64,
}

/// Total run time and its split over the emit and flush phases.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingBreakdown {
    pub total_ms: f64,
    pub stages: Vec<StageTiming>,
}

impl TimingBreakdown {
    /// Elapsed time of the stage with this label.
    pub fn stage_ms(&self, label: &str) -> Option<f64> {
        self.stages
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.elapsed_ms)
    }
}

/// Accumulates wall time per stage over every event of a run.
///
/// Stages keep the order they were registered in and report zero when
/// never charged.
#[derive(Clone, Debug)]
pub struct StageClock {
    started: Instant,
    stages: Vec<(&'static str, f64)>,
}

impl StageClock {
    pub fn new(labels: &[&'static str]) -> Self {
        Self {
            started: Instant::now(),
            stages: labels.iter().map(|&label| (label, 0.0)).collect(),
        }
    }

    /// Restarts the total without clearing the stages.
    pub fn restart(&mut self) {
        self.started = Instant::now();
    }

    /// Charges the time since `since` to `label`, registering it if new.
    pub fn charge(&mut self, label: &'static str, since: Instant) {
        let ms = millis(since);
        match self.stages.iter_mut().find(|(l, _)| *l == label) {
            Some((_, total)) => *total += ms,
            None => self.stages.push((label, ms)),
        }
    }

    pub fn breakdown(&self) -> TimingBreakdown {
        TimingBreakdown {
            total_ms: millis(self.started),
            stages: self
                .stages
                .iter()
                .map(|&(label, elapsed_ms)| StageTiming {
                    label: label.to_string(),
                    elapsed_ms,
                })
                .collect(),
        }
    }
}

fn millis(since: Instant) -> f64 {
    since.elapsed().as_secs_f64() * 1000.0
}
