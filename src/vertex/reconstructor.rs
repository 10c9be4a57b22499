use super::fitter::{FittedCandidate, VertexFitter};
use super::ip::best_primary_vertex;
use crate::error::CandidateError;
use crate::event::{ChargedCandidate, EventStore, PrimaryVertex};
use crate::track::TrackView;
use nalgebra::{Point3, Vector3};

pub const PID_D0: i32 = 421;

/// Fitted D0 together with its truth reference.
#[derive(Clone, Debug)]
pub struct VertexResult {
    pub d0: FittedCandidate,
    pub best_pv: Option<(PrimaryVertex, f64)>,
    pub true_d0_vertex: Point3<f64>,
    pub true_dst_vertex: Point3<f64>,
    pub true_d0_momentum: Vector3<f64>,
    pub kaon_plus: ChargedCandidate,
    pub kaon_minus: ChargedCandidate,
    pub pion: ChargedCandidate,
}

impl VertexResult {
    /// True D0 flight vector, production to decay.
    pub fn true_flight(&self) -> Vector3<f64> {
        self.true_d0_vertex - self.true_dst_vertex
    }

    /// Fitted minus true decay vertex.
    pub fn vertex_residual(&self) -> Vector3<f64> {
        self.d0.vertex.position - self.true_d0_vertex
    }
}

fn find_unique<'c>(
    list: &'c [ChargedCandidate],
    name: &'static str,
    track_key: u32,
) -> Result<&'c ChargedCandidate, CandidateError> {
    let mut matches = list.iter().filter(|c| c.track_key == track_key);
    let first = matches.next().ok_or(CandidateError::ParticleNotFound {
        track_key,
        list: name,
    })?;
    let extra = matches.count();
    if extra > 0 {
        return Err(CandidateError::AmbiguousParticle {
            track_key,
            list: name,
            count: extra + 1,
        });
    }
    Ok(first)
}

/// Fits K+ K- into a D0 and attaches truth from the kaon and pion tracks.
///
/// Every failure is scoped to this candidate triple.
pub fn fit_vertex<S, V>(
    store: &S,
    fitter: &V,
    kp: &TrackView<'_, S>,
    km: &TrackView<'_, S>,
    pi: &TrackView<'_, S>,
) -> Result<VertexResult, CandidateError>
where
    S: EventStore + ?Sized,
    V: VertexFitter + ?Sized,
{
    let kaon_plus = find_unique(store.kaons(), "kaons", kp.key())?;
    let kaon_minus = find_unique(store.kaons(), "kaons", km.key())?;
    let pion = find_unique(store.pions(), "pions", pi.key())?;

    let d0 = fitter.fit(&[kaon_plus, kaon_minus], PID_D0)?;
    let best_pv = best_primary_vertex(&d0, store.primary_vertices())
        .map(|(pv, chi2)| (pv.clone(), chi2));

    let kp_truth = kp.truth_particle()?.ok_or_else(|| {
        CandidateError::MissingTruth(format!("track {} has no truth particle", kp.key()))
    })?;
    let pi_truth = pi.truth_particle()?.ok_or_else(|| {
        CandidateError::MissingTruth(format!("track {} has no truth particle", pi.key()))
    })?;
    let d0_truth = kp_truth
        .mother
        .and_then(|key| store.mc_particle(key))
        .ok_or_else(|| {
            CandidateError::MissingTruth(format!("particle {} has no mother", kp_truth.key))
        })?;

    Ok(VertexResult {
        d0,
        best_pv,
        true_d0_vertex: kp_truth.origin_vertex,
        true_dst_vertex: pi_truth.origin_vertex,
        true_d0_momentum: d0_truth.momentum,
        kaon_plus: kaon_plus.clone(),
        kaon_minus: kaon_minus.clone(),
        pion: pion.clone(),
    })
}
