//! Error kinds shared by the analysis stages.
//!
//! The split mirrors how callers react: precondition violations and
//! ambiguous associations abort, convergence failures may be skipped per
//! hit, candidate lookup failures are skipped per candidate. Absent optional
//! data is never an error and is modelled with `Option` instead.

use crate::event::StateLocation;
use crate::geometry::Axis;

/// Failures while synthesising alignment conditions.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("invalid perturbation parameter {name}={value}")]
    InvalidParameter { name: &'static str, value: f64 },

    #[error("{0} modules requested, names only support two digits")]
    TooManyModules(usize),
}

/// Failures while reading a condition document back.
#[derive(Debug, thiserror::Error)]
pub enum ConditionParseError {
    #[error("line {line}: {message}")]
    Malformed { line: usize, message: String },

    #[error("condition {0} is missing dPosXYZ or dRotXYZ")]
    Incomplete(String),
}

/// Failures of the edge-walking corner scan.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("{sensor}: scan along {axis:?} starts outside the volume at ({x}, {y}, {z})")]
    StartOutside {
        sensor: String,
        axis: Axis,
        x: f64,
        y: f64,
        z: f64,
    },

    #[error("{sensor}: scan along {axis:?} ended outside the volume")]
    EndOutside { sensor: String, axis: Axis },

    #[error("{sensor}: scan along {axis:?} did not converge after {steps} probes")]
    NotConverged {
        sensor: String,
        axis: Axis,
        steps: usize,
    },
}

/// Failures raised while viewing a reconstructed track.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    #[error("track {track_key} has no {location:?} state")]
    MissingState {
        track_key: u32,
        location: StateLocation,
    },

    #[error("track {track_key} carries unrecognised hit {lhcb_id:#010x}")]
    UnrecognisedHit { track_key: u32, lhcb_id: u32 },

    #[error("track {track_key} is linked to {count} truth particles")]
    AmbiguousTruthLink { track_key: u32, count: usize },

    #[error("track {track_key} links to unknown truth particle {particle_key}")]
    DanglingTruthLink { track_key: u32, particle_key: u32 },
}

/// State propagation failures.
#[derive(Debug, thiserror::Error)]
pub enum ExtrapolationError {
    #[error("state is not finite at z={z}")]
    NonFinite { z: f64 },

    #[error("propagation step {dz} mm exceeds {max} mm")]
    StepTooLarge { dz: f64, max: f64 },
}

/// Closest-approach minimisation failures.
#[derive(Debug, thiserror::Error)]
pub enum PocaError {
    #[error("no convergence after {iterations} iterations (last step {last_step})")]
    NotConverged { iterations: usize, last_step: f64 },

    #[error("parameter {s} left the trajectory range [{min}, {max}]")]
    OutOfRange { s: f64, min: f64, max: f64 },

    #[error("trajectory direction is degenerate")]
    Degenerate,
}

/// Residual computation failure, keeping propagation and POCA apart.
#[derive(Debug, thiserror::Error)]
pub enum ResidualError {
    #[error("extrapolation failed: {0}")]
    Extrapolation(#[from] ExtrapolationError),

    #[error("closest approach failed: {0}")]
    Poca(#[from] PocaError),
}

/// Vertex fit failures.
#[derive(Debug, thiserror::Error)]
pub enum VertexFitError {
    #[error("need at least two daughters, got {0}")]
    TooFewDaughters(usize),

    #[error("vertex normal equations are singular")]
    Singular,
}

/// Per-candidate failures; the event loop skips the candidate.
#[derive(Debug, thiserror::Error)]
pub enum CandidateError {
    #[error("track {track_key} not found among {list}")]
    ParticleNotFound { track_key: u32, list: &'static str },

    #[error("track {track_key} matches {count} entries of {list}")]
    AmbiguousParticle {
        track_key: u32,
        list: &'static str,
        count: usize,
    },

    #[error("missing truth: {0}")]
    MissingTruth(String),

    #[error(transparent)]
    Track(#[from] TrackError),

    #[error(transparent)]
    VertexFit(#[from] VertexFitError),
}

/// Failures of the true-geometry reference lookup.
#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("run {run} event {event} channel {channel_id} has {count} reference rows")]
    DuplicateKey {
        run: u32,
        event: u64,
        channel_id: u64,
        count: usize,
    },

    #[error("{0}")]
    Io(String),
}

/// Failures of the external event store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// Anything that stops a scenario run.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    #[error("event store: {0}")]
    Store(#[from] StoreError),

    #[error("table {path}: {message}")]
    Table { path: String, message: String },

    #[error("reference dataset: {0}")]
    Reference(#[from] ReferenceError),

    #[error("run {run} event {event} track {track:?}: {source}")]
    Event {
        run: u32,
        event: u64,
        track: Option<u32>,
        #[source]
        source: Box<EventFailure>,
    },
}

/// Hard per-event failures reported with run/event context.
#[derive(Debug, thiserror::Error)]
pub enum EventFailure {
    #[error(transparent)]
    Track(#[from] TrackError),

    #[error(transparent)]
    Reference(#[from] ReferenceError),

    #[error("cluster {channel_id} referenced by a hit is not in the event")]
    MissingCluster { channel_id: u64 },

    #[error("cluster channel {channel_id} does not fit a 32-bit VP channel id")]
    ChannelOutOfRange { channel_id: u64 },
}
