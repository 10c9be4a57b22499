//! Resolution summaries over persisted scenario tables.
//!
//! Widths come from iterative ±2.5σ Gaussian core fits per x slice; the
//! straight-line resolution model is a weighted fit through those widths.
//! Primary-vertex widths are sliced in the number of tracks of the vertex.

mod gaussian;
mod slices;
mod summary;

pub use gaussian::{fit_gaussian_width, GaussianWidth, TRUNCATION_SIGMAS};
pub use slices::{fit_line, Binning, LineFit, MeanProfile, SliceMean, SliceProfile, SliceWidth};
pub use summary::{
    summarize_scenario, MeanCurve, PvResolution, ResolutionCurve, ResolutionSummary,
    StationWidths, SummaryOptions,
};
