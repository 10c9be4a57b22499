//! Point-to-track residuals.
//!
//! A track state is first propagated to the z of the target point, then a
//! straight line through the propagated state is searched for the point of
//! closest approach. Propagation and minimisation failures are reported as
//! different [`ResidualError`](crate::error::ResidualError) kinds.

mod extrapolator;
mod fitter;
mod poca;
mod trajectory;

pub use extrapolator::{ParabolicExtrapolator, TrackExtrapolator, KAPPA};
pub use fitter::{ResidualFit, ResidualFitParams, ResidualFitter};
pub use poca::{PocaResult, TrajPoca};
pub use trajectory::{LineTraj, Trajectory};
