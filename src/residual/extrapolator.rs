use crate::error::ExtrapolationError;
use crate::event::State;
use nalgebra::Vector3;
use serde::Deserialize;

/// Curvature constant: 1/mm per tesla per 1/MeV.
pub const KAPPA: f64 = 0.299_792_458;

/// Propagates a track state along z.
pub trait TrackExtrapolator {
    fn propagate(&self, state: &mut State, z: f64) -> Result<(), ExtrapolationError>;
}

/// Parabolic propagation in a uniform field.
///
/// With the default zero field this is a straight-line transport. Only the
/// diagonal of the covariance is carried, using the slope variance to widen
/// the position variance.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ParabolicExtrapolator {
    /// Field in tesla.
    pub field: Vector3<f64>,
    pub max_step_mm: f64,
}

impl Default for ParabolicExtrapolator {
    fn default() -> Self {
        Self {
            field: Vector3::zeros(),
            max_step_mm: 3000.0,
        }
    }
}

impl ParabolicExtrapolator {
    pub fn with_field(field: Vector3<f64>) -> Self {
        Self {
            field,
            ..Self::default()
        }
    }
}

impl TrackExtrapolator for ParabolicExtrapolator {
    fn propagate(&self, state: &mut State, z: f64) -> Result<(), ExtrapolationError> {
        if !state.is_finite() || !z.is_finite() {
            return Err(ExtrapolationError::NonFinite { z });
        }
        let dz = z - state.z();
        if dz.abs() > self.max_step_mm {
            return Err(ExtrapolationError::StepTooLarge {
                dz,
                max: self.max_step_mm,
            });
        }
        if dz == 0.0 {
            return Ok(());
        }

        let (tx, ty) = (state.tx, state.ty);
        let b = &self.field;
        let norm = (1.0 + tx * tx + ty * ty).sqrt();
        let ax = norm * (ty * (tx * b.x + b.z) - (1.0 + tx * tx) * b.y);
        let ay = norm * (-tx * (ty * b.y + b.z) + (1.0 + ty * ty) * b.x);
        let k = KAPPA * state.qop;

        state.position.x += dz * (tx + 0.5 * dz * k * ax);
        state.position.y += dz * (ty + 0.5 * dz * k * ay);
        state.position.z = z;
        state.tx += dz * k * ax;
        state.ty += dz * k * ay;

        if let Some(cov) = state.covariance.as_mut() {
            cov.x += dz * dz * cov.tx;
            cov.y += dz * dz * cov.ty;
        }

        if !state.is_finite() {
            return Err(ExtrapolationError::NonFinite { z });
        }
        Ok(())
    }
}
