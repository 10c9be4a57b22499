use super::trajectory::Trajectory;
use crate::error::PocaError;
use log::debug;
use nalgebra::Point3;

/// Closest point on a trajectory to a fixed point.
#[derive(Clone, Copy, Debug)]
pub struct PocaResult {
    pub s: f64,
    pub position: Point3<f64>,
    pub distance: f64,
}

/// Newton minimiser of the distance between a trajectory and a point.
#[derive(Clone, Debug)]
pub struct TrajPoca {
    pub max_iterations: usize,
}

impl Default for TrajPoca {
    fn default() -> Self {
        Self {
            max_iterations: 100,
        }
    }
}

impl TrajPoca {
    pub fn new(max_iterations: usize) -> Self {
        Self { max_iterations }
    }

    /// Iterates `s` from `s0` until the Newton step drops below `tolerance`.
    ///
    /// Leaving the trajectory range is an error, never a clamp.
    pub fn minimize<T: Trajectory + ?Sized>(
        &self,
        traj: &T,
        s0: f64,
        point: &Point3<f64>,
        tolerance: f64,
    ) -> Result<PocaResult, PocaError> {
        let (min, max) = traj.range();
        let mut s = s0;
        let mut last_step = f64::INFINITY;
        for iteration in 0..self.max_iterations {
            let delta = traj.position(s) - point;
            let dir = traj.direction(s);
            let f = delta.dot(&dir);
            let df = dir.dot(&dir) + delta.dot(&traj.curvature(s));
            if df.abs() <= f64::EPSILON {
                return Err(PocaError::Degenerate);
            }
            last_step = -f / df;
            s += last_step;
            if !(min..=max).contains(&s) {
                return Err(PocaError::OutOfRange { s, min, max });
            }
            if last_step.abs() < tolerance {
                let position = traj.position(s);
                debug!("poca: converged after {} iterations at s={s:.6}", iteration + 1);
                return Ok(PocaResult {
                    s,
                    position,
                    distance: (position - point).norm(),
                });
            }
        }
        Err(PocaError::NotConverged {
            iterations: self.max_iterations,
            last_step,
        })
    }
}
