use crate::error::PocaError;
use nalgebra::{Point3, Vector3};

/// Parametrised curve in space; `s` is the arc length in mm.
pub trait Trajectory {
    fn position(&self, s: f64) -> Point3<f64>;

    /// Unit tangent at `s`.
    fn direction(&self, s: f64) -> Vector3<f64>;

    /// Second derivative of the position with respect to `s`.
    fn curvature(&self, s: f64) -> Vector3<f64>;

    /// Valid parameter interval.
    fn range(&self) -> (f64, f64);
}

/// Straight line through `origin` along a unit direction.
#[derive(Clone, Debug)]
pub struct LineTraj {
    origin: Point3<f64>,
    direction: Vector3<f64>,
    range: (f64, f64),
}

impl LineTraj {
    /// `direction` need not be normalised; a zero direction is rejected.
    pub fn new(
        origin: Point3<f64>,
        direction: Vector3<f64>,
        range: (f64, f64),
    ) -> Result<Self, PocaError> {
        let direction = direction
            .try_normalize(f64::EPSILON)
            .ok_or(PocaError::Degenerate)?;
        Ok(Self {
            origin,
            direction,
            range,
        })
    }

    pub fn origin(&self) -> Point3<f64> {
        self.origin
    }
}

impl Trajectory for LineTraj {
    fn position(&self, s: f64) -> Point3<f64> {
        self.origin + self.direction * s
    }

    fn direction(&self, _s: f64) -> Vector3<f64> {
        self.direction
    }

    fn curvature(&self, _s: f64) -> Vector3<f64> {
        Vector3::zeros()
    }

    fn range(&self) -> (f64, f64) {
        self.range
    }
}
