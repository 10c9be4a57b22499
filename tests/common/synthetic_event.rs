//! Hand-built events with straight tracks through a few VP planes.
use nalgebra::{Point3, Vector3};
use vp_distortions::event::{
    ChargedCandidate, Cluster, EventRecord, McParticle, PrimaryVertex, RawTrack, State,
    StateLocation, TrackType, TruthLink,
};
use vp_distortions::track::hits::ids;
use vp_distortions::track::VpChannelId;

/// (sensor, z) of the planes every synthetic track crosses.
pub const PLANES: [(u32, f64); 4] = [(0, 20.0), (9, 50.0), (18, 80.0), (27, 110.0)];

pub const PID_PION: i32 = 211;
pub const PID_KAON: i32 = 321;

pub fn state(location: StateLocation, position: Point3<f64>, tx: f64, ty: f64) -> State {
    State {
        location,
        position,
        tx,
        ty,
        qop: 1.0 / 5000.0,
        covariance: None,
    }
}

fn momentum(tx: f64, ty: f64, p: f64) -> Vector3<f64> {
    Vector3::new(tx, ty, 1.0).normalize() * p
}

pub fn point_on_line(origin: &Point3<f64>, tx: f64, ty: f64, z: f64) -> Point3<f64> {
    let dz = z - origin.z;
    Point3::new(origin.x + tx * dz, origin.y + ty * dz, z)
}

/// Long track with a cluster on every plane and a truth particle produced
/// at `origin`. Particle keys are `100 + track key`.
pub fn add_straight_track(event: &mut EventRecord, key: u32, origin: Point3<f64>, tx: f64, ty: f64) {
    let mut lhcb_ids = Vec::new();
    for (plane, &(sensor, z)) in PLANES.iter().enumerate() {
        let channel = VpChannelId::from_parts(sensor, 0, key, plane as u32);
        let p = point_on_line(&origin, tx, ty, z);
        event.clusters.push(Cluster {
            channel_id: channel.channel_id(),
            x: p.x,
            y: p.y,
            z: p.z,
        });
        lhcb_ids.push(ids::vp(channel));
    }
    lhcb_ids.push(ids::ut(0x1234 + key));

    let p = momentum(tx, ty, 5000.0);
    event.tracks.push(RawTrack {
        key,
        track_type: TrackType::Long,
        states: vec![
            state(StateLocation::ClosestToBeam, origin, tx, ty),
            state(StateLocation::FirstMeasurement, origin, tx, ty),
        ],
        momentum: p,
        lhcb_ids,
    });
    event.mc_particles.push(McParticle {
        key: 100 + key,
        pid: PID_PION,
        momentum: p,
        origin_vertex: origin,
        end_vertices: Vec::new(),
        mother: None,
    });
    event.truth_links.push(TruthLink {
        track_key: key,
        particle_key: 100 + key,
    });
}

/// Event with `n_tracks` straight tracks fanning out from the origin.
pub fn fan_event(run: u32, event_number: u64, n_tracks: u32) -> EventRecord {
    let mut event = EventRecord::new(run, event_number);
    for key in 0..n_tracks {
        let tx = 0.01 * (key as f64 + 1.0);
        let ty = -0.005 * key as f64;
        add_straight_track(&mut event, key, Point3::new(0.1, -0.2, 0.0), tx, ty);
    }
    event
}

/// Truth of the D*+ → D0(K+ K-) π+ decay built by [`dstar_event`].
pub struct DstarTruth {
    pub pv: Point3<f64>,
    pub d0_vertex: Point3<f64>,
    pub d0_momentum: Vector3<f64>,
}

pub fn dstar_truth() -> DstarTruth {
    DstarTruth {
        pv: Point3::origin(),
        d0_vertex: Point3::new(0.8, -0.4, 6.0),
        d0_momentum: Vector3::new(300.0, -150.0, 20_000.0),
    }
}

/// Simulated minus reconstructed PV position of [`dstar_event`].
pub fn true_pv_offset() -> Vector3<f64> {
    Vector3::new(0.01, -0.02, 0.05)
}

fn decay_track(key: u32, origin: Point3<f64>, tx: f64, ty: f64) -> (RawTrack, State) {
    let start = point_on_line(&origin, tx, ty, origin.z + 10.0);
    let s = state(StateLocation::FirstMeasurement, start, tx, ty);
    let raw = RawTrack {
        key,
        track_type: TrackType::Long,
        states: vec![s.clone()],
        momentum: momentum(tx, ty, 8000.0),
        lhcb_ids: Vec::new(),
    };
    (raw, s)
}

fn particle(
    key: u32,
    pid: i32,
    origin: Point3<f64>,
    momentum: Vector3<f64>,
    mother: Option<u32>,
) -> McParticle {
    McParticle {
        key,
        pid,
        momentum,
        origin_vertex: origin,
        end_vertices: Vec::new(),
        mother,
    }
}

/// Tracks 0 (K+), 1 (K-) and 2 (π+) from one truth D*+ decay, with matching
/// kaon and pion candidates and a single primary vertex.
pub fn dstar_event(run: u32, event_number: u64) -> EventRecord {
    let t = dstar_truth();
    let mut event = EventRecord::new(run, event_number);

    let daughters = [
        (0u32, PID_KAON, t.d0_vertex, 0.03, 0.01),
        (1u32, -PID_KAON, t.d0_vertex, -0.02, -0.03),
        (2u32, PID_PION, t.pv, 0.005, 0.02),
    ];
    for &(key, pid, origin, tx, ty) in &daughters {
        let (raw, s) = decay_track(key, origin, tx, ty);
        let candidate = ChargedCandidate {
            track_key: key,
            pid,
            state: s,
            momentum: raw.momentum,
        };
        if pid.abs() == PID_KAON {
            event.kaons.push(candidate);
        } else {
            event.pions.push(candidate);
        }
        let mother = if pid.abs() == PID_KAON { 2 } else { 1 };
        event
            .mc_particles
            .push(particle(10 + key, pid, origin, raw.momentum, Some(mother)));
        event.truth_links.push(TruthLink {
            track_key: key,
            particle_key: 10 + key,
        });
        event.tracks.push(raw);
    }
    event
        .mc_particles
        .push(particle(1, 413, t.pv, t.d0_momentum * 1.1, None));
    event
        .mc_particles
        .push(particle(2, 421, t.pv, t.d0_momentum, Some(1)));
    event.primary_vertices.push(PrimaryVertex {
        position: t.pv,
        variance: [1e-4, 1e-4, 1e-3],
        n_tracks: 30,
        true_position: Some(t.pv + true_pv_offset()),
    });
    event
}
