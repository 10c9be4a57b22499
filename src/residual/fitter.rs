use super::extrapolator::{ParabolicExtrapolator, TrackExtrapolator};
use super::poca::TrajPoca;
use super::trajectory::LineTraj;
use crate::error::{PocaError, ResidualError};
use crate::event::State;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Closest-approach settings for the residual line fit.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidualFitParams {
    /// Half-width of the parametric range around the propagated state (mm).
    pub range_half_width: f64,
    pub s_init: f64,
    pub tolerance: f64,
    pub max_iterations: usize,
}

impl Default for ResidualFitParams {
    fn default() -> Self {
        Self {
            range_half_width: 1000.0,
            s_init: 0.1,
            tolerance: 0.0005,
            max_iterations: 100,
        }
    }
}

/// Intercept on the track and `target - intercept`, both in mm.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResidualFit {
    pub intercept: Point3<f64>,
    pub residual: Vector3<f64>,
}

/// Point-to-track residuals: propagate to the target z, then find the
/// closest approach on the local straight line.
#[derive(Clone, Debug, Default)]
pub struct ResidualFitter<E = ParabolicExtrapolator> {
    extrapolator: E,
    params: ResidualFitParams,
}

impl<E: TrackExtrapolator> ResidualFitter<E> {
    pub fn new(extrapolator: E, params: ResidualFitParams) -> Self {
        Self {
            extrapolator,
            params,
        }
    }

    pub fn params(&self) -> &ResidualFitParams {
        &self.params
    }

    pub fn fit(&self, state: &State, target: &Point3<f64>) -> Result<ResidualFit, ResidualError> {
        let mut propagated = state.clone();
        self.extrapolator.propagate(&mut propagated, target.z)?;
        Ok(self.closest_approach(&propagated, target)?)
    }

    /// Closest approach of the straight line through `state` as given,
    /// without propagating it first.
    pub fn closest_approach(
        &self,
        state: &State,
        target: &Point3<f64>,
    ) -> Result<ResidualFit, PocaError> {
        let half = self.params.range_half_width;
        let traj = LineTraj::new(state.position, state.slopes(), (-half, half))?;
        let poca = TrajPoca::new(self.params.max_iterations).minimize(
            &traj,
            self.params.s_init,
            target,
            self.params.tolerance,
        )?;
        Ok(ResidualFit {
            intercept: poca.position,
            residual: target - poca.position,
        })
    }
}
