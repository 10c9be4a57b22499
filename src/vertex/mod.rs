//! D*→D0π candidates: truth pairing, D0 vertex fit and PV association.

mod dstar;
mod fitter;
mod ip;
mod reconstructor;

pub use dstar::{find_dstar_candidates, DstarCandidate};
pub use fitter::{
    pdg_mass, FittedCandidate, FittedVertex, LinearVertexFitter, VertexFitter,
    DEFAULT_POSITION_VARIANCE,
};
pub use ip::{best_primary_vertex, impact_parameter, ip_chi2};
pub use reconstructor::{fit_vertex, VertexResult, PID_D0};
