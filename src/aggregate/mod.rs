//! Per-scenario event loop and its tabular outputs.
//!
//! [`ScenarioAggregator`] walks the event store through an
//! [`AnalysisSession`](crate::session::AnalysisSession), turns every event
//! into cluster, track, residual, particle and primary-vertex rows, and
//! appends them to JSON Lines tables in batches.

mod aggregator;
mod records;
mod reference;
mod table;

pub use aggregator::{AggregatorConfig, Phase, ScenarioAggregator, ScenarioReport};
pub use records::{ClusterRow, ParticleRow, ResidualRow, TrackRow, VertexRow};
pub use reference::TrueGeometryIndex;
pub use table::{read_table_dir, BufferMark, FlushCounts, RowBuffers, TableSet};
