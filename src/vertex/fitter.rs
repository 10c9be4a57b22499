use crate::error::VertexFitError;
use crate::event::ChargedCandidate;
use log::warn;
use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

const EPS: f64 = 1e-12;
const SINGULAR_RATIO: f64 = 1e-9;

/// Position variance assumed for states without a covariance (mm²).
pub const DEFAULT_POSITION_VARIANCE: f64 = 0.01;

/// Rest mass in MeV for the charged species the fitter combines.
pub fn pdg_mass(pid: i32) -> Option<f64> {
    match pid.abs() {
        11 => Some(0.510_998_95),
        13 => Some(105.658_375_5),
        211 => Some(139.570_39),
        321 => Some(493.677),
        2212 => Some(938.272_088),
        _ => None,
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct FittedVertex {
    pub position: Point3<f64>,
    pub covariance: Matrix3<f64>,
    pub chi2: f64,
    pub ndof: i32,
}

/// Composite particle built from a vertex fit.
#[derive(Clone, Debug, Serialize)]
pub struct FittedCandidate {
    pub pid: i32,
    pub vertex: FittedVertex,
    pub momentum: Vector3<f64>,
    pub mass: f64,
}

/// Combines daughters into a common vertex under a mass hypothesis `pid`.
pub trait VertexFitter {
    fn fit(
        &self,
        daughters: &[&ChargedCandidate],
        pid: i32,
    ) -> Result<FittedCandidate, VertexFitError>;
}

/// Least-squares vertex of straight daughter trajectories.
///
/// Each daughter contributes its x and y offsets at the vertex z, weighted
/// by the state position variance transported to that z. Weights depend on
/// the vertex, so the normal equations are re-solved until the vertex
/// settles.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct LinearVertexFitter {
    pub max_iterations: usize,
    /// Stop once the vertex moves less than this (mm).
    pub tolerance: f64,
}

impl Default for LinearVertexFitter {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            tolerance: 1e-6,
        }
    }
}

#[derive(Default)]
struct NormalEquationAccum {
    a: Matrix3<f64>,
    b: Vector3<f64>,
}

impl NormalEquationAccum {
    /// Adds one measurement `row · v = rhs` with weight `w`.
    fn accumulate(&mut self, row: &Vector3<f64>, rhs: f64, w: f64) {
        if w <= EPS {
            return;
        }
        self.a += w * row * row.transpose();
        self.b += w * rhs * row;
    }

    /// Scale-free singularity test: the determinant is compared with the
    /// product of the diagonal.
    fn solve(&self) -> Option<(Vector3<f64>, Matrix3<f64>)> {
        let scale = self.a[(0, 0)] * self.a[(1, 1)] * self.a[(2, 2)];
        if scale <= EPS || self.a.determinant().abs() <= SINGULAR_RATIO * scale {
            return None;
        }
        let inv = self.a.try_inverse()?;
        Some((inv * self.b, inv))
    }
}

/// Straight-line x/y measurement rows of one daughter.
struct DaughterRows {
    rows: [(Vector3<f64>, f64); 2],
    z0: f64,
    var_pos: [f64; 2],
    var_slope: [f64; 2],
}

impl DaughterRows {
    fn new(c: &ChargedCandidate) -> Self {
        let s = &c.state;
        let (var_pos, var_slope) = match s.covariance {
            Some(cov) => ([cov.x, cov.y], [cov.tx, cov.ty]),
            None => (
                [DEFAULT_POSITION_VARIANCE, DEFAULT_POSITION_VARIANCE],
                [0.0, 0.0],
            ),
        };
        Self {
            rows: [
                (Vector3::new(1.0, 0.0, -s.tx), s.position.x - s.tx * s.position.z),
                (Vector3::new(0.0, 1.0, -s.ty), s.position.y - s.ty * s.position.z),
            ],
            z0: s.position.z,
            var_pos,
            var_slope,
        }
    }

    fn weight(&self, axis: usize, z: f64) -> f64 {
        let dz = z - self.z0;
        let var = self.var_pos[axis] + dz * dz * self.var_slope[axis];
        if var > EPS {
            1.0 / var
        } else {
            1.0 / DEFAULT_POSITION_VARIANCE
        }
    }
}

impl VertexFitter for LinearVertexFitter {
    fn fit(
        &self,
        daughters: &[&ChargedCandidate],
        pid: i32,
    ) -> Result<FittedCandidate, VertexFitError> {
        if daughters.len() < 2 {
            return Err(VertexFitError::TooFewDaughters(daughters.len()));
        }
        let rows: Vec<DaughterRows> = daughters.iter().map(|d| DaughterRows::new(d)).collect();
        let z_start = rows.iter().map(|r| r.z0).sum::<f64>() / rows.len() as f64;
        let mut vertex = Vector3::new(0.0, 0.0, z_start);
        let mut covariance = Matrix3::zeros();
        for _ in 0..self.max_iterations.max(1) {
            let mut accum = NormalEquationAccum::default();
            for r in &rows {
                for (axis, (row, rhs)) in r.rows.iter().enumerate() {
                    accum.accumulate(row, *rhs, r.weight(axis, vertex.z));
                }
            }
            let Some((next, cov)) = accum.solve() else {
                warn!("vertex fit: normal equations are singular");
                return Err(VertexFitError::Singular);
            };
            let moved = (next - vertex).norm();
            vertex = next;
            covariance = cov;
            if moved < self.tolerance {
                break;
            }
        }

        let chi2 = rows
            .iter()
            .map(|r| {
                r.rows
                    .iter()
                    .enumerate()
                    .map(|(axis, (row, rhs))| {
                        let res = row.dot(&vertex) - rhs;
                        res * res * r.weight(axis, vertex.z)
                    })
                    .sum::<f64>()
            })
            .sum();

        let momentum: Vector3<f64> = daughters.iter().map(|d| d.momentum).sum();
        let energy: f64 = daughters
            .iter()
            .map(|d| {
                let m = pdg_mass(d.pid).unwrap_or(0.0);
                (d.momentum.norm_squared() + m * m).sqrt()
            })
            .sum();
        let mass = (energy * energy - momentum.norm_squared()).max(0.0).sqrt();

        Ok(FittedCandidate {
            pid,
            vertex: FittedVertex {
                position: Point3::from(vertex),
                covariance,
                chi2,
                ndof: 2 * daughters.len() as i32 - 3,
            },
            momentum,
            mass,
        })
    }
}
