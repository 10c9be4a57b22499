use super::fitter::FittedCandidate;
use crate::event::PrimaryVertex;
use nalgebra::{Point3, Vector3};

/// Impact-parameter vector of a straight trajectory with respect to `point`:
/// the displacement from `point` to the closest point of the line.
pub fn impact_parameter(
    origin: &Point3<f64>,
    direction: &Vector3<f64>,
    point: &Point3<f64>,
) -> Option<Vector3<f64>> {
    let u = direction.try_normalize(f64::EPSILON)?;
    let d = origin - point;
    Some(d - u * d.dot(&u))
}

/// IP χ² of a fitted candidate to one primary vertex, using the summed
/// vertex and PV covariances. `None` when the candidate has no direction or
/// the covariance cannot be inverted.
pub fn ip_chi2(candidate: &FittedCandidate, pv: &PrimaryVertex) -> Option<f64> {
    let ip = impact_parameter(&candidate.vertex.position, &candidate.momentum, &pv.position)?;
    let cov = candidate.vertex.covariance + pv.covariance();
    let inv = cov.try_inverse()?;
    Some((ip.transpose() * inv * ip)[(0, 0)])
}

/// Primary vertex with the smallest IP χ², scanning all of them.
pub fn best_primary_vertex<'a>(
    candidate: &FittedCandidate,
    pvs: &'a [PrimaryVertex],
) -> Option<(&'a PrimaryVertex, f64)> {
    pvs.iter()
        .filter_map(|pv| ip_chi2(candidate, pv).map(|chi2| (pv, chi2)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}
