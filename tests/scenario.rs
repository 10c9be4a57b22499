mod common;

use common::synthetic_event::{dstar_event, dstar_truth, fan_event, true_pv_offset, PLANES};
use std::collections::BTreeSet;
use std::path::Path;
use vp_distortions::aggregate::{
    AggregatorConfig, ParticleRow, Phase, ResidualRow, ScenarioAggregator, TrackRow,
    TrueGeometryIndex, VertexRow,
};
use vp_distortions::error::{AggregateError, EventFailure};
use vp_distortions::event::{EventRecord, MemoryEventStore};
use vp_distortions::io::read_jsonl;
use vp_distortions::residual::{ParabolicExtrapolator, ResidualFitter};
use vp_distortions::session::AnalysisSession;
use vp_distortions::vertex::LinearVertexFitter;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn session(events: Vec<EventRecord>) -> AnalysisSession<MemoryEventStore> {
    AnalysisSession::new(
        MemoryEventStore::from_events(events),
        ResidualFitter::<ParabolicExtrapolator>::default(),
        LinearVertexFitter::default(),
    )
}

fn config(dir: &Path, scenario: &str) -> AggregatorConfig {
    AggregatorConfig {
        scenario: scenario.to_string(),
        output_dir: dir.to_path_buf(),
        ..Default::default()
    }
}

fn numbered_events(n: u64) -> Vec<EventRecord> {
    (1..=n).map(|i| fan_event(1, i, 1)).collect()
}

#[test]
fn reference_run_gives_true_residuals_on_every_hit() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let events = || vec![fan_event(7, 1, 3), fan_event(7, 2, 3)];
    let expected = 2 * 3 * PLANES.len();

    let mut nominal = ScenarioAggregator::new(config(dir.path(), "nominal"), None);
    let report = nominal.run(&mut session(events())).unwrap();
    assert_eq!(report.events, 2);
    assert_eq!(report.tracks, 6);
    assert_eq!(report.residuals, expected);
    let nominal_rows: Vec<ResidualRow> = read_jsonl(&nominal.tables().residuals).unwrap();
    assert!(nominal_rows.iter().all(|r| !r.has_truth()));

    let reference = TrueGeometryIndex::load_dir(&dir.path().join("nominal")).unwrap();
    assert_eq!(reference.len(), expected);

    let mut distorted = ScenarioAggregator::new(config(dir.path(), "x50"), Some(reference));
    let report = distorted.run(&mut session(events())).unwrap();
    assert_eq!(report.skipped_residuals, 0);
    assert_eq!(report.skipped_true_residuals, 0);

    let rows: Vec<ResidualRow> = read_jsonl(&distorted.tables().residuals).unwrap();
    assert_eq!(rows.len(), expected);
    for row in &rows {
        assert!(row.has_truth(), "row without truth: {row:?}");
        assert!(row.residual().norm() < 1e-6, "{row:?}");
        assert_eq!(row.true_residual_x, Some(row.residual_x));
        assert_eq!(row.true_residual_y, Some(row.residual_y));
        assert_eq!(row.true_x, Some(row.cluster_x));
    }
    let stations: BTreeSet<u32> = rows.iter().map(|r| r.station).collect();
    assert_eq!(stations.len(), PLANES.len());
}

#[test]
fn impact_parameter_vanishes_for_tracks_from_their_origin() {
    let dir = tempfile::tempdir().unwrap();
    let mut aggregator = ScenarioAggregator::new(config(dir.path(), "nominal"), None);
    aggregator.run(&mut session(vec![fan_event(1, 1, 3)])).unwrap();

    let tracks: Vec<TrackRow> = read_jsonl(&aggregator.tables().tracks).unwrap();
    assert_eq!(tracks.len(), 3);
    for track in &tracks {
        assert_eq!(track.track_type, "Long");
        assert_eq!(track.n_vp_hits, PLANES.len());
        assert_eq!(track.true_pid, Some(211));
        assert!(track.ip3d.unwrap().abs() < 1e-6);
    }
}

#[test]
fn flushes_neither_drop_nor_duplicate_rows() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AggregatorConfig {
        flush_every: 10,
        ..config(dir.path(), "nominal")
    };
    let mut aggregator = ScenarioAggregator::new(cfg, None);
    let report = aggregator.run(&mut session(numbered_events(25))).unwrap();
    assert_eq!(report.events, 25);
    assert_eq!(report.flushes, 3);

    let tracks: Vec<TrackRow> = read_jsonl(&aggregator.tables().tracks).unwrap();
    let events: Vec<u64> = tracks.iter().map(|t| t.event).collect();
    assert_eq!(events, (1..=25).collect::<Vec<_>>());
    let clusters: Vec<vp_distortions::aggregate::ClusterRow> =
        read_jsonl(&aggregator.tables().clusters).unwrap();
    assert_eq!(clusters.len(), 25 * PLANES.len());
}

#[test]
fn rerun_replaces_previous_tables() {
    let dir = tempfile::tempdir().unwrap();
    for _ in 0..2 {
        let mut aggregator = ScenarioAggregator::new(config(dir.path(), "nominal"), None);
        aggregator.run(&mut session(numbered_events(3))).unwrap();
    }
    let tables = ScenarioAggregator::new(config(dir.path(), "nominal"), None);
    let tracks: Vec<TrackRow> = read_jsonl(&tables.tables().tracks).unwrap();
    assert_eq!(tracks.len(), 3);
}

#[test]
fn event_cap_stops_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = AggregatorConfig {
        max_events: Some(7),
        ..config(dir.path(), "nominal")
    };
    let mut s = session(numbered_events(25));
    let mut aggregator = ScenarioAggregator::new(cfg, None);
    let report = aggregator.run(&mut s).unwrap();
    assert_eq!(report.events, 7);
    assert_eq!(s.store().remaining(), 18);
    let tracks: Vec<TrackRow> = read_jsonl(&aggregator.tables().tracks).unwrap();
    assert_eq!(tracks.len(), 7);
}

#[test]
fn phases_follow_the_event_loop() {
    let dir = tempfile::tempdir().unwrap();
    let mut s = session(vec![fan_event(3, 9, 1)]);
    let mut aggregator = ScenarioAggregator::new(config(dir.path(), "nominal"), None);
    assert_eq!(aggregator.phase(), Phase::Start);

    assert_eq!(aggregator.step(&mut s).unwrap(), Phase::FetchHeader);
    let Phase::Emit(header) = aggregator.step(&mut s).unwrap() else {
        panic!("expected an event");
    };
    assert_eq!((header.run_number, header.event_number), (3, 9));
    assert_eq!(aggregator.step(&mut s).unwrap(), Phase::FetchHeader);
    assert_eq!(aggregator.step(&mut s).unwrap(), Phase::EndOfStream);
    assert_eq!(aggregator.step(&mut s).unwrap(), Phase::Flush);
    assert_eq!(aggregator.step(&mut s).unwrap(), Phase::Done);
    assert_eq!(aggregator.step(&mut s).unwrap(), Phase::Done);

    let report = aggregator.report();
    assert_eq!(report.tracks, 1);
    assert_eq!(report.flushes, 1);
    assert!(report.timing.stage_ms("residuals").is_some());
}

#[test]
fn missing_cluster_aborts_with_event_context() {
    let dir = tempfile::tempdir().unwrap();
    let mut event = fan_event(4, 11, 2);
    event.clusters.retain(|c| c.z != PLANES[1].1);

    let mut aggregator = ScenarioAggregator::new(config(dir.path(), "nominal"), None);
    match aggregator.run(&mut session(vec![event])) {
        Err(AggregateError::Event {
            run,
            event,
            track,
            source,
        }) => {
            assert_eq!((run, event, track), (4, 11, Some(0)));
            assert!(matches!(*source, EventFailure::MissingCluster { .. }));
        }
        other => panic!("expected an event failure, got {other:?}"),
    }
}

#[test]
fn failed_event_leaves_no_rows_and_stops() {
    let dir = tempfile::tempdir().unwrap();
    let mut event = fan_event(4, 12, 2);
    event.clusters.retain(|c| c.z != PLANES[1].1);
    let mut s = session(vec![event, fan_event(4, 13, 1)]);

    let mut aggregator = ScenarioAggregator::new(config(dir.path(), "nominal"), None);
    aggregator.step(&mut s).unwrap();
    assert!(matches!(aggregator.step(&mut s).unwrap(), Phase::Emit(_)));
    assert!(aggregator.step(&mut s).is_err());
    assert_eq!(aggregator.phase(), Phase::Failed);
    assert!(aggregator.buffers().is_empty());

    assert_eq!(aggregator.step(&mut s).unwrap(), Phase::Failed);
    assert!(aggregator.buffers().is_empty());
    assert_eq!(aggregator.report().events, 0);
    assert_eq!(s.store().remaining(), 1);
}

#[test]
fn oversized_cluster_channel_is_an_event_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut event = fan_event(5, 1, 1);
    event.clusters[2].channel_id |= 1 << 40;

    let mut aggregator = ScenarioAggregator::new(config(dir.path(), "nominal"), None);
    match aggregator.run(&mut session(vec![event])) {
        Err(AggregateError::Event { run, event, track, source }) => {
            assert_eq!((run, event, track), (5, 1, None));
            assert!(matches!(*source, EventFailure::ChannelOutOfRange { .. }));
        }
        other => panic!("expected an event failure, got {other:?}"),
    }
    assert!(aggregator.buffers().is_empty());
}

#[test]
fn primary_vertices_are_written_with_their_offset() {
    let dir = tempfile::tempdir().unwrap();
    let mut aggregator = ScenarioAggregator::new(config(dir.path(), "nominal"), None);
    let report = aggregator
        .run(&mut session(vec![dstar_event(2, 5), fan_event(2, 6, 1)]))
        .unwrap();
    assert_eq!(report.vertices, 1);

    let rows: Vec<VertexRow> = read_jsonl(&aggregator.tables().vertices).unwrap();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!((row.event, row.index, row.n_tracks), (5, 0, 30));
    let delta = row.delta().unwrap();
    assert!((delta + true_pv_offset()).norm() < 1e-12, "{delta:?}");
    assert!(report.timing.stage_ms("vertices").is_some());
}

#[test]
fn failed_residuals_are_skipped_and_counted() {
    let dir = tempfile::tempdir().unwrap();
    let mut event = fan_event(1, 1, 1);
    for state in &mut event.tracks[0].states {
        state.position.z = -5000.0;
    }
    let mut aggregator = ScenarioAggregator::new(config(dir.path(), "nominal"), None);
    let report = aggregator.run(&mut session(vec![event])).unwrap();
    assert_eq!(report.tracks, 1);
    assert_eq!(report.residuals, 0);
    assert_eq!(report.skipped_residuals, PLANES.len());
}

#[test]
fn dstar_decay_yields_one_particle_row() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let mut aggregator = ScenarioAggregator::new(config(dir.path(), "nominal"), None);
    let report = aggregator.run(&mut session(vec![dstar_event(2, 5)])).unwrap();
    assert_eq!(report.particles, 1);
    assert_eq!(report.skipped_candidates, 0);

    let rows: Vec<ParticleRow> = read_jsonl(&aggregator.tables().particles).unwrap();
    let row = &rows[0];
    let truth = dstar_truth();
    assert_eq!((row.kaon_plus, row.kaon_minus, row.pion), (0, 1, 2));
    assert!((row.vertex_x - truth.d0_vertex.x).abs() < 1e-4);
    assert!((row.vertex_y - truth.d0_vertex.y).abs() < 1e-4);
    assert!((row.vertex_z - truth.d0_vertex.z).abs() < 1e-3);
    assert_eq!(row.true_d0_vertex_z, truth.d0_vertex.z);
    assert_eq!(row.true_d0_pz, truth.d0_momentum.z);
    assert_eq!(row.pv_z, Some(truth.pv.z));
}

#[test]
fn candidate_without_pion_entry_is_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let mut event = dstar_event(2, 6);
    event.pions.clear();
    let mut aggregator = ScenarioAggregator::new(config(dir.path(), "nominal"), None);
    let report = aggregator.run(&mut session(vec![event])).unwrap();
    assert_eq!(report.particles, 0);
    assert_eq!(report.skipped_candidates, 1);
    assert_eq!(report.tracks, 3);
}
