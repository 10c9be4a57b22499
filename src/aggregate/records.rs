use crate::error::EventFailure;
use crate::event::{Cluster, EventHeader, PrimaryVertex};
use crate::track::VpChannelId;
use crate::vertex::VertexResult;
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// One VP cluster of an event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClusterRow {
    pub run: u32,
    pub event: u64,
    pub channel_id: u64,
    pub module: u32,
    pub station: u32,
    pub sensor: u32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ClusterRow {
    pub fn new(header: EventHeader, cluster: &Cluster) -> Result<Self, EventFailure> {
        let channel = u32::try_from(cluster.channel_id)
            .map(VpChannelId::new)
            .map_err(|_| EventFailure::ChannelOutOfRange {
                channel_id: cluster.channel_id,
            })?;
        Ok(Self {
            run: header.run_number,
            event: header.event_number,
            channel_id: cluster.channel_id,
            module: channel.module(),
            station: channel.station(),
            sensor: channel.sensor(),
            x: cluster.x,
            y: cluster.y,
            z: cluster.z,
        })
    }

    pub fn position(&self) -> Point3<f64> {
        Point3::new(self.x, self.y, self.z)
    }
}

/// One reconstructed primary vertex and its offset from the simulated one.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VertexRow {
    pub run: u32,
    pub event: u64,
    pub index: usize,
    pub n_tracks: usize,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub true_x: Option<f64>,
    pub true_y: Option<f64>,
    pub true_z: Option<f64>,
    /// Reconstructed minus true position (mm).
    pub dx: Option<f64>,
    pub dy: Option<f64>,
    pub dz: Option<f64>,
}

impl VertexRow {
    pub fn new(header: EventHeader, index: usize, pv: &PrimaryVertex) -> Self {
        let delta = pv.true_position.map(|t| pv.position - t);
        Self {
            run: header.run_number,
            event: header.event_number,
            index,
            n_tracks: pv.n_tracks,
            x: pv.position.x,
            y: pv.position.y,
            z: pv.position.z,
            true_x: pv.true_position.map(|t| t.x),
            true_y: pv.true_position.map(|t| t.y),
            true_z: pv.true_position.map(|t| t.z),
            dx: delta.map(|d| d.x),
            dy: delta.map(|d| d.y),
            dz: delta.map(|d| d.z),
        }
    }

    pub fn delta(&self) -> Option<Vector3<f64>> {
        Some(Vector3::new(self.dx?, self.dy?, self.dz?))
    }
}

/// One reconstructed track with its optional truth and impact parameter.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrackRow {
    pub run: u32,
    pub event: u64,
    pub key: u32,
    pub track_type: String,
    pub px: f64,
    pub py: f64,
    pub pz: f64,
    pub p: f64,
    pub pt: f64,
    pub rx: f64,
    pub ry: f64,
    pub state_x: f64,
    pub state_y: f64,
    pub state_z: f64,
    pub n_vp_hits: usize,
    pub true_pid: Option<i32>,
    pub true_px: Option<f64>,
    pub true_py: Option<f64>,
    pub true_pz: Option<f64>,
    /// Track minus true origin vertex at the closest approach (mm).
    pub ipx: Option<f64>,
    pub ipy: Option<f64>,
    pub ipz: Option<f64>,
    /// Signed with `ipz`.
    pub ip3d: Option<f64>,
}

impl TrackRow {
    pub fn true_momentum(&self) -> Option<Vector3<f64>> {
        Some(Vector3::new(self.true_px?, self.true_py?, self.true_pz?))
    }
}

/// Residual of one VP hit against its cluster, and against the undistorted
/// position of the same channel when a reference is available.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResidualRow {
    pub run: u32,
    pub event: u64,
    pub track: u32,
    pub channel_id: u64,
    pub module: u32,
    pub station: u32,
    pub sensor: u32,
    pub cluster_x: f64,
    pub cluster_y: f64,
    pub cluster_z: f64,
    pub intercept_x: f64,
    pub intercept_y: f64,
    pub intercept_z: f64,
    pub residual_x: f64,
    pub residual_y: f64,
    pub residual_z: f64,
    pub true_x: Option<f64>,
    pub true_y: Option<f64>,
    pub true_z: Option<f64>,
    pub true_intercept_x: Option<f64>,
    pub true_intercept_y: Option<f64>,
    pub true_intercept_z: Option<f64>,
    pub true_residual_x: Option<f64>,
    pub true_residual_y: Option<f64>,
    pub true_residual_z: Option<f64>,
}

impl ResidualRow {
    pub fn residual(&self) -> Vector3<f64> {
        Vector3::new(self.residual_x, self.residual_y, self.residual_z)
    }

    /// Whether every reference-side column is filled.
    pub fn has_truth(&self) -> bool {
        [
            self.true_x,
            self.true_y,
            self.true_z,
            self.true_intercept_x,
            self.true_intercept_y,
            self.true_intercept_z,
            self.true_residual_x,
            self.true_residual_y,
            self.true_residual_z,
        ]
        .iter()
        .all(Option::is_some)
    }
}

/// One fitted D* → D0 π candidate.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParticleRow {
    pub run: u32,
    pub event: u64,
    pub kaon_plus: u32,
    pub kaon_minus: u32,
    pub pion: u32,
    pub vertex_x: f64,
    pub vertex_y: f64,
    pub vertex_z: f64,
    pub vertex_chi2: f64,
    pub vertex_ndof: i32,
    pub mass: f64,
    pub d0_px: f64,
    pub d0_py: f64,
    pub d0_pz: f64,
    pub true_d0_vertex_x: f64,
    pub true_d0_vertex_y: f64,
    pub true_d0_vertex_z: f64,
    pub true_dst_vertex_x: f64,
    pub true_dst_vertex_y: f64,
    pub true_dst_vertex_z: f64,
    pub true_d0_px: f64,
    pub true_d0_py: f64,
    pub true_d0_pz: f64,
    pub pv_x: Option<f64>,
    pub pv_y: Option<f64>,
    pub pv_z: Option<f64>,
    pub ip_chi2: Option<f64>,
}

impl ParticleRow {
    pub fn new(header: EventHeader, result: &VertexResult) -> Self {
        let v = &result.d0.vertex.position;
        let p = &result.d0.momentum;
        let pv = result.best_pv.as_ref();
        Self {
            run: header.run_number,
            event: header.event_number,
            kaon_plus: result.kaon_plus.track_key,
            kaon_minus: result.kaon_minus.track_key,
            pion: result.pion.track_key,
            vertex_x: v.x,
            vertex_y: v.y,
            vertex_z: v.z,
            vertex_chi2: result.d0.vertex.chi2,
            vertex_ndof: result.d0.vertex.ndof,
            mass: result.d0.mass,
            d0_px: p.x,
            d0_py: p.y,
            d0_pz: p.z,
            true_d0_vertex_x: result.true_d0_vertex.x,
            true_d0_vertex_y: result.true_d0_vertex.y,
            true_d0_vertex_z: result.true_d0_vertex.z,
            true_dst_vertex_x: result.true_dst_vertex.x,
            true_dst_vertex_y: result.true_dst_vertex.y,
            true_dst_vertex_z: result.true_dst_vertex.z,
            true_d0_px: result.true_d0_momentum.x,
            true_d0_py: result.true_d0_momentum.y,
            true_d0_pz: result.true_d0_momentum.z,
            pv_x: pv.map(|(pv, _)| pv.position.x),
            pv_y: pv.map(|(pv, _)| pv.position.y),
            pv_z: pv.map(|(pv, _)| pv.position.z),
            ip_chi2: pv.map(|(_, chi2)| *chi2),
        }
    }
}
