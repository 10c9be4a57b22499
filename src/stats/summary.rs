use super::gaussian::{fit_gaussian_width, GaussianWidth};
use super::slices::{fit_line, Binning, LineFit, MeanProfile, SliceProfile};
use crate::aggregate::{ResidualRow, TrackRow, VertexRow};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Binning and selection of the resolution summary.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOptions {
    /// 1/pT binning in GeV⁻¹.
    pub inv_pt: Binning,
    /// Momentum binning in GeV.
    pub momentum: Binning,
    /// Binning in the number of tracks of a primary vertex.
    pub n_tracks: Binning,
    pub min_entries: usize,
    /// Track types to include; empty keeps all.
    pub track_types: Vec<String>,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            inv_pt: Binning::new(25, 0.0, 5.0),
            momentum: Binning::new(25, 0.0, 150.0),
            n_tracks: Binning::new(15, 0.0, 150.0),
            min_entries: SliceProfile::MIN_ENTRIES,
            track_types: Vec::new(),
        }
    }
}

/// Slice widths with the straight-line resolution model fitted through them.
#[derive(Clone, Debug, Serialize)]
pub struct ResolutionCurve {
    pub profile: SliceProfile,
    pub fit: Option<LineFit>,
}

impl ResolutionCurve {
    fn from_samples(samples: &[(f64, f64)], binning: Binning, min_entries: usize) -> Self {
        let profile = SliceProfile::build(samples, binning, min_entries);
        let fit = fit_line(&profile.sigma_points());
        Self { profile, fit }
    }
}

/// Slice means with a straight line fitted through them.
#[derive(Clone, Debug, Serialize)]
pub struct MeanCurve {
    pub profile: MeanProfile,
    pub fit: Option<LineFit>,
}

impl MeanCurve {
    fn from_samples(samples: &[(f64, f64)], binning: Binning) -> Self {
        let profile = MeanProfile::build(samples, binning);
        let fit = fit_line(&profile.mean_points());
        Self { profile, fit }
    }
}

/// Reconstructed minus true primary-vertex position, overall and per
/// track-count slice.
#[derive(Clone, Debug, Serialize)]
pub struct PvResolution {
    pub vertices_used: usize,
    pub x: Option<GaussianWidth>,
    pub y: Option<GaussianWidth>,
    pub z: Option<GaussianWidth>,
    pub x_vs_n_tracks: SliceProfile,
    pub y_vs_n_tracks: SliceProfile,
    pub z_vs_n_tracks: SliceProfile,
}

impl PvResolution {
    fn from_rows(vertices: &[VertexRow], binning: Binning, min_entries: usize) -> Self {
        let deltas: Vec<_> = vertices
            .iter()
            .filter_map(|v| v.delta().map(|d| (v.n_tracks as f64, d)))
            .collect();
        let axis = |i: usize| -> Vec<(f64, f64)> { deltas.iter().map(|(n, d)| (*n, d[i])).collect() };
        let overall = |i: usize| -> Option<GaussianWidth> {
            let values: Vec<f64> = deltas.iter().map(|(_, d)| d[i]).collect();
            width_if_enough(&values, min_entries)
        };
        Self {
            vertices_used: deltas.len(),
            x: overall(0),
            y: overall(1),
            z: overall(2),
            x_vs_n_tracks: SliceProfile::build(&axis(0), binning, min_entries),
            y_vs_n_tracks: SliceProfile::build(&axis(1), binning, min_entries),
            z_vs_n_tracks: SliceProfile::build(&axis(2), binning, min_entries),
        }
    }
}

/// Residual widths of one VP station.
#[derive(Clone, Debug, Serialize)]
pub struct StationWidths {
    pub station: u32,
    pub entries: usize,
    pub x: Option<GaussianWidth>,
    pub y: Option<GaussianWidth>,
    pub true_x: Option<GaussianWidth>,
    pub true_y: Option<GaussianWidth>,
}

#[derive(Clone, Debug, Serialize)]
pub struct ResolutionSummary {
    pub tracks_used: usize,
    pub ipx_vs_inv_pt: ResolutionCurve,
    pub ipy_vs_inv_pt: ResolutionCurve,
    /// Mean |IP3D| per 1/pT slice.
    pub ip3d_vs_inv_pt: MeanCurve,
    pub momentum_vs_p: ResolutionCurve,
    pub stations: Vec<StationWidths>,
    pub primary_vertices: PvResolution,
}

fn width_if_enough(values: &[f64], min_entries: usize) -> Option<GaussianWidth> {
    if values.len() > min_entries {
        fit_gaussian_width(values)
    } else {
        None
    }
}

/// IP resolution vs 1/pT, δp/p vs p, per-station residual widths and PV
/// resolution vs track count of one scenario. Tracks and vertices without
/// truth contribute nothing.
pub fn summarize_scenario(
    tracks: &[TrackRow],
    residuals: &[ResidualRow],
    vertices: &[VertexRow],
    options: &SummaryOptions,
) -> ResolutionSummary {
    let selected = tracks.iter().filter(|t| {
        options.track_types.is_empty() || options.track_types.iter().any(|tt| *tt == t.track_type)
    });

    let mut ipx = Vec::new();
    let mut ipy = Vec::new();
    let mut ip3d = Vec::new();
    let mut dp = Vec::new();
    let mut used = 0usize;
    for track in selected {
        let Some(true_p) = track.true_momentum() else {
            continue;
        };
        let true_pt = true_p.x.hypot(true_p.y);
        let true_pmag = true_p.norm();
        if true_pt <= 0.0 || true_pmag <= 0.0 {
            continue;
        }
        used += 1;
        let inv_pt_gev = 1000.0 / true_pt;
        if let (Some(x), Some(y)) = (track.ipx, track.ipy) {
            ipx.push((inv_pt_gev, x));
            ipy.push((inv_pt_gev, y));
        }
        if let Some(v) = track.ip3d {
            ip3d.push((inv_pt_gev, v.abs()));
        }
        dp.push((true_pmag / 1000.0, (track.p - true_pmag) / true_pmag));
    }

    let mut by_station: BTreeMap<u32, Vec<&ResidualRow>> = BTreeMap::new();
    for row in residuals {
        by_station.entry(row.station).or_default().push(row);
    }
    let stations = by_station
        .into_iter()
        .map(|(station, rows)| {
            let column = |f: fn(&ResidualRow) -> Option<f64>| -> Vec<f64> {
                rows.iter().filter_map(|r| f(*r)).collect()
            };
            StationWidths {
                station,
                entries: rows.len(),
                x: width_if_enough(&column(|r| Some(r.residual_x)), options.min_entries),
                y: width_if_enough(&column(|r| Some(r.residual_y)), options.min_entries),
                true_x: width_if_enough(&column(|r| r.true_residual_x), options.min_entries),
                true_y: width_if_enough(&column(|r| r.true_residual_y), options.min_entries),
            }
        })
        .collect();

    ResolutionSummary {
        tracks_used: used,
        ipx_vs_inv_pt: ResolutionCurve::from_samples(&ipx, options.inv_pt, options.min_entries),
        ipy_vs_inv_pt: ResolutionCurve::from_samples(&ipy, options.inv_pt, options.min_entries),
        ip3d_vs_inv_pt: MeanCurve::from_samples(&ip3d, options.inv_pt),
        momentum_vs_p: ResolutionCurve::from_samples(&dp, options.momentum, options.min_entries),
        stations,
        primary_vertices: PvResolution::from_rows(vertices, options.n_tracks, options.min_entries),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};

    fn vertex(n_tracks: usize, delta: [f64; 3]) -> VertexRow {
        VertexRow {
            run: 1,
            event: 1,
            index: 0,
            n_tracks,
            x: delta[0],
            y: delta[1],
            z: delta[2],
            true_x: Some(0.0),
            true_y: Some(0.0),
            true_z: Some(0.0),
            dx: Some(delta[0]),
            dy: Some(delta[1]),
            dz: Some(delta[2]),
        }
    }

    fn track(inv_pt_gev: f64, ip3d: Option<f64>) -> TrackRow {
        TrackRow {
            run: 1,
            event: 1,
            key: 0,
            track_type: "Long".to_string(),
            px: 0.0,
            py: 0.0,
            pz: 0.0,
            p: 0.0,
            pt: 0.0,
            rx: 0.0,
            ry: 0.0,
            state_x: 0.0,
            state_y: 0.0,
            state_z: 0.0,
            n_vp_hits: 4,
            true_pid: Some(211),
            true_px: Some(1000.0 / inv_pt_gev),
            true_py: Some(0.0),
            true_pz: Some(10_000.0),
            ipx: None,
            ipy: None,
            ipz: None,
            ip3d,
        }
    }

    #[test]
    fn pv_width_is_recovered_per_track_count() {
        // σ(n) = 0.1 / sqrt(n) mm along x, three times that along z.
        let mut rng = StdRng::seed_from_u64(5);
        let unit = Normal::new(0.0, 1.0).unwrap();
        let mut rows = Vec::new();
        for &n in &[15usize, 45, 95] {
            let sigma = 0.1 / (n as f64).sqrt();
            for _ in 0..4000 {
                let d = [
                    sigma * unit.sample(&mut rng),
                    sigma * unit.sample(&mut rng),
                    3.0 * sigma * unit.sample(&mut rng),
                ];
                rows.push(vertex(n, d));
            }
        }
        let mut untrue = vertex(15, [5.0; 3]);
        untrue.dx = None;
        rows.push(untrue);

        let summary = summarize_scenario(&[], &[], &rows, &SummaryOptions::default());
        let pv = &summary.primary_vertices;
        assert_eq!(pv.vertices_used, 12_000);
        assert_eq!(pv.x_vs_n_tracks.slices.len(), 3);
        for (slice, n) in pv.x_vs_n_tracks.slices.iter().zip([15.0f64, 45.0, 95.0]) {
            let expected = 0.1 / n.sqrt();
            assert!((slice.x - n).abs() <= 5.0, "slice at {}", slice.x);
            assert!(
                (slice.width.sigma - expected).abs() / expected < 0.06,
                "n={n}: sigma {} vs {expected}",
                slice.width.sigma
            );
        }
        for (slice, n) in pv.z_vs_n_tracks.slices.iter().zip([15.0f64, 45.0, 95.0]) {
            let expected = 0.3 / n.sqrt();
            assert!((slice.width.sigma - expected).abs() / expected < 0.06);
        }
        assert!(pv.x.is_some() && pv.z.is_some());
    }

    #[test]
    fn ip3d_profile_uses_magnitudes() {
        let tracks: Vec<TrackRow> = (0..20)
            .flat_map(|i| {
                let inv_pt = 0.5 + 1.0 * (i % 2) as f64;
                let ip = 0.01 + 0.02 * inv_pt;
                [track(inv_pt, Some(0.9 * ip)), track(inv_pt, Some(-1.1 * ip))]
            })
            .chain(std::iter::once(track(1.0, None)))
            .collect();
        let summary = summarize_scenario(&tracks, &[], &[], &SummaryOptions::default());
        assert_eq!(summary.tracks_used, 41);
        let means = &summary.ip3d_vs_inv_pt.profile.slices;
        assert_eq!(means.len(), 2);
        assert!((means[0].mean - 0.02).abs() < 1e-12);
        assert!((means[1].mean - 0.04).abs() < 1e-12);
        let fit = summary.ip3d_vs_inv_pt.fit.unwrap();
        assert!((fit.slope - 0.02).abs() < 1e-9, "{fit:?}");
        assert!((fit.intercept - 0.01).abs() < 1e-9, "{fit:?}");
        assert_eq!(summary.primary_vertices.vertices_used, 0);
    }

    fn residual(station: u32, rx: f64) -> ResidualRow {
        ResidualRow {
            run: 1,
            event: 1,
            track: 0,
            channel_id: 0,
            module: station * 2,
            station,
            sensor: station * 8,
            cluster_x: 0.0,
            cluster_y: 0.0,
            cluster_z: 0.0,
            intercept_x: 0.0,
            intercept_y: 0.0,
            intercept_z: 0.0,
            residual_x: rx,
            residual_y: -rx,
            residual_z: 0.0,
            true_x: None,
            true_y: None,
            true_z: None,
            true_intercept_x: None,
            true_intercept_y: None,
            true_intercept_z: None,
            true_residual_x: None,
            true_residual_y: None,
            true_residual_z: None,
        }
    }

    #[test]
    fn stations_are_grouped_and_thresholded() {
        let mut rows: Vec<ResidualRow> = (0..200)
            .map(|i| residual(3, ((i % 20) as f64 - 9.5) * 0.001))
            .collect();
        rows.extend((0..10).map(|_| residual(4, 0.0)));
        let summary = summarize_scenario(&[], &rows, &[], &SummaryOptions::default());
        assert_eq!(summary.stations.len(), 2);
        let s3 = &summary.stations[0];
        assert_eq!((s3.station, s3.entries), (3, 200));
        assert!(s3.x.is_some() && s3.y.is_some());
        assert!(s3.true_x.is_none());
        assert!(summary.stations[1].x.is_none());
        assert_eq!(summary.tracks_used, 0);
        assert!(summary.ipx_vs_inv_pt.fit.is_none());
    }
}
