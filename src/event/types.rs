use nalgebra::{Matrix3, Point3, Vector3};
use serde::{Deserialize, Serialize};

/// Run/event identification of the current event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventHeader {
    pub run_number: u32,
    pub event_number: u64,
}

/// VP cluster position in the global frame (mm).
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub channel_id: u64,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Cluster {
    #[inline]
    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }
}

/// Track topology as assigned by pattern recognition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrackType {
    Velo,
    Downstream,
    Long,
    Ttrack,
    Upstream,
    Backward,
}

impl TrackType {
    pub fn as_str(self) -> &'static str {
        match self {
            TrackType::Velo => "Velo",
            TrackType::Downstream => "Downstream",
            TrackType::Long => "Long",
            TrackType::Ttrack => "Ttrack",
            TrackType::Upstream => "Upstream",
            TrackType::Backward => "Backward",
        }
    }
}

/// Where along the track a state was produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StateLocation {
    ClosestToBeam,
    FirstMeasurement,
    BegRich2,
}

/// Diagonal variances of the (x, y, tx, ty, q/p) state vector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StateCovariance {
    pub x: f64,
    pub y: f64,
    pub tx: f64,
    pub ty: f64,
    pub qop: f64,
}

/// Track state: position, slopes dx/dz and dy/dz, charge over momentum (1/MeV).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct State {
    pub location: StateLocation,
    pub position: Point3<f64>,
    pub tx: f64,
    pub ty: f64,
    #[serde(default)]
    pub qop: f64,
    #[serde(default)]
    pub covariance: Option<StateCovariance>,
}

impl State {
    #[inline]
    pub fn z(&self) -> f64 {
        self.position.z
    }

    /// Direction vector `(tx, ty, 1)`.
    #[inline]
    pub fn slopes(&self) -> Vector3<f64> {
        Vector3::new(self.tx, self.ty, 1.0)
    }

    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|v| v.is_finite())
            && self.tx.is_finite()
            && self.ty.is_finite()
            && self.qop.is_finite()
    }
}

/// Reconstructed track as stored by the reconstruction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawTrack {
    pub key: u32,
    pub track_type: TrackType,
    pub states: Vec<State>,
    pub momentum: Vector3<f64>,
    /// Packed sub-detector identifiers of the hits on the track.
    #[serde(default)]
    pub lhcb_ids: Vec<u32>,
}

impl RawTrack {
    pub fn state_at(&self, location: StateLocation) -> Option<&State> {
        self.states.iter().find(|s| s.location == location)
    }
}

/// Simulated truth particle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct McParticle {
    pub key: u32,
    pub pid: i32,
    pub momentum: Vector3<f64>,
    pub origin_vertex: Point3<f64>,
    #[serde(default)]
    pub end_vertices: Vec<Point3<f64>>,
    #[serde(default)]
    pub mother: Option<u32>,
}

/// Reconstructed primary vertex with diagonal position variances (mm²).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrimaryVertex {
    pub position: Point3<f64>,
    pub variance: [f64; 3],
    #[serde(default)]
    pub n_tracks: usize,
    /// Position of the matched simulated collision, when there is one.
    #[serde(default)]
    pub true_position: Option<Point3<f64>>,
}

impl PrimaryVertex {
    pub fn covariance(&self) -> Matrix3<f64> {
        Matrix3::from_diagonal(&Vector3::from(self.variance))
    }
}

/// Pre-selected charged particle built on a track.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChargedCandidate {
    pub track_key: u32,
    pub pid: i32,
    pub state: State,
    pub momentum: Vector3<f64>,
}

/// Track → truth association entry.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct TruthLink {
    pub track_key: u32,
    pub particle_key: u32,
}

/// Everything the store exposes for one event; also the on-disk dump format.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    pub header: EventHeader,
    #[serde(default)]
    pub clusters: Vec<Cluster>,
    #[serde(default)]
    pub tracks: Vec<RawTrack>,
    #[serde(default)]
    pub truth_links: Vec<TruthLink>,
    #[serde(default)]
    pub mc_particles: Vec<McParticle>,
    #[serde(default)]
    pub primary_vertices: Vec<PrimaryVertex>,
    #[serde(default)]
    pub pions: Vec<ChargedCandidate>,
    #[serde(default)]
    pub kaons: Vec<ChargedCandidate>,
}

impl EventRecord {
    pub fn new(run_number: u32, event_number: u64) -> Self {
        Self {
            header: EventHeader {
                run_number,
                event_number,
            },
            clusters: Vec::new(),
            tracks: Vec::new(),
            truth_links: Vec::new(),
            mc_particles: Vec::new(),
            primary_vertices: Vec::new(),
            pions: Vec::new(),
            kaons: Vec::new(),
        }
    }
}
