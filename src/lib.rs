#![doc = include_str!("../README.md")]

// Scenario inputs.
pub mod alignment;
pub mod geometry;

// Event-level analysis.
pub mod event;
pub mod residual;
pub mod session;
pub mod track;
pub mod vertex;

// Tables and their summaries.
pub mod aggregate;
pub mod stats;

pub mod config;
pub mod diagnostics;
pub mod error;
pub mod io;

// --- High-level re-exports -------------------------------------------------

pub use crate::aggregate::{AggregatorConfig, ScenarioAggregator, ScenarioReport};
pub use crate::alignment::{build as build_alignment, AlignmentConditions, PerturbationParams};
pub use crate::event::{EventStore, MemoryEventStore};
pub use crate::session::AnalysisSession;

// --- Prelude ---------------------------------------------------------------

/// Small prelude for scenario scripts.
///
/// ```no_run
/// use vp_distortions::prelude::*;
/// use std::path::Path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = MemoryEventStore::open(Path::new("events.jsonl"))?;
/// let mut session = AnalysisSession::new(
///     store,
///     ResidualFitter::new(ParabolicExtrapolator::default(), Default::default()),
///     LinearVertexFitter::default(),
/// );
/// let mut aggregator = ScenarioAggregator::new(AggregatorConfig::default(), None);
/// let report = aggregator.run(&mut session)?;
/// println!("events={} residuals={}", report.events, report.residuals);
/// # Ok(())
/// # }
/// ```
pub mod prelude {
    pub use crate::residual::{ParabolicExtrapolator, ResidualFitter};
    pub use crate::vertex::LinearVertexFitter;
    pub use crate::{AggregatorConfig, AnalysisSession, MemoryEventStore, ScenarioAggregator};
}
