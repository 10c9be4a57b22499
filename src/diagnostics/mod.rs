//! Run diagnostics reported next to the scenario tables.
pub mod timing;

pub use timing::{StageClock, StageTiming, TimingBreakdown};
