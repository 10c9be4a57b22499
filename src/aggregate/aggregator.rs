use super::records::{ClusterRow, ParticleRow, ResidualRow, TrackRow, VertexRow};
use super::reference::TrueGeometryIndex;
use super::table::{FlushCounts, RowBuffers, TableSet};
use crate::diagnostics::{StageClock, TimingBreakdown};
use crate::error::{AggregateError, EventFailure};
use crate::event::{EventHeader, EventStore};
use crate::residual::TrackExtrapolator;
use crate::session::{AnalysisSession, EventContext};
use crate::track::TrackView;
use crate::vertex::{find_dstar_candidates, fit_vertex, VertexFitter};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;

/// What one scenario run reads and where it writes.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub scenario: String,
    pub job_id: u32,
    /// Stop after this many events; `None` reads the whole stream.
    pub max_events: Option<usize>,
    pub flush_every: usize,
    pub output_dir: PathBuf,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            scenario: "nominal".to_string(),
            job_id: 0,
            max_events: None,
            flush_every: 10,
            output_dir: PathBuf::from("output/scenarios"),
        }
    }
}

/// Event-loop state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Start,
    FetchHeader,
    Emit(EventHeader),
    EndOfStream,
    Flush,
    Done,
    /// An event failed; its rows were discarded and the loop stops here.
    Failed,
}

/// Totals of one scenario run.
#[derive(Clone, Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioReport {
    pub scenario: String,
    pub job_id: u32,
    pub events: usize,
    pub clusters: usize,
    pub tracks: usize,
    pub residuals: usize,
    pub particles: usize,
    pub vertices: usize,
    pub flushes: usize,
    pub skipped_residuals: usize,
    pub skipped_true_residuals: usize,
    pub skipped_candidates: usize,
    pub timing: TimingBreakdown,
}

impl ScenarioReport {
    fn add(&mut self, counts: FlushCounts) {
        self.clusters += counts.clusters;
        self.tracks += counts.tracks;
        self.residuals += counts.residuals;
        self.particles += counts.particles;
        self.vertices += counts.vertices;
        self.flushes += 1;
    }
}

const STAGES: [&str; 6] = ["clusters", "vertices", "tracks", "residuals", "particles", "flush"];

fn event_error(header: EventHeader, track: Option<u32>, failure: impl Into<EventFailure>) -> AggregateError {
    AggregateError::Event {
        run: header.run_number,
        event: header.event_number,
        track,
        source: Box::new(failure.into()),
    }
}

/// Drives one scenario through the event store and persists its tables.
///
/// Rows are buffered per event and appended every `flush_every` events and
/// once more at the end of the stream. Tables are truncated when the run
/// starts, so rerunning a shard replaces its rows. A failing event leaves no
/// rows behind and parks the machine in [`Phase::Failed`].
pub struct ScenarioAggregator {
    config: AggregatorConfig,
    reference: Option<TrueGeometryIndex>,
    tables: TableSet,
    phase: Phase,
    buffers: RowBuffers,
    events_since_flush: usize,
    report: ScenarioReport,
    clock: StageClock,
}

impl ScenarioAggregator {
    pub fn new(config: AggregatorConfig, reference: Option<TrueGeometryIndex>) -> Self {
        let tables = TableSet::new(&config.output_dir, &config.scenario, config.job_id);
        let report = ScenarioReport {
            scenario: config.scenario.clone(),
            job_id: config.job_id,
            ..ScenarioReport::default()
        };
        Self {
            config,
            reference,
            tables,
            phase: Phase::Start,
            buffers: RowBuffers::default(),
            events_since_flush: 0,
            report,
            clock: StageClock::new(&STAGES),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tables(&self) -> &TableSet {
        &self.tables
    }

    pub fn report(&self) -> &ScenarioReport {
        &self.report
    }

    /// Rows waiting for the next flush.
    pub fn buffers(&self) -> &RowBuffers {
        &self.buffers
    }

    /// Runs the state machine until the stream is exhausted and flushed.
    pub fn run<S, E, V>(
        &mut self,
        session: &mut AnalysisSession<S, E, V>,
    ) -> Result<ScenarioReport, AggregateError>
    where
        S: EventStore,
        E: TrackExtrapolator,
        V: VertexFitter,
    {
        while !matches!(self.step(session)?, Phase::Done | Phase::Failed) {}
        Ok(self.report.clone())
    }

    /// Performs one transition and returns the new phase.
    pub fn step<S, E, V>(
        &mut self,
        session: &mut AnalysisSession<S, E, V>,
    ) -> Result<Phase, AggregateError>
    where
        S: EventStore,
        E: TrackExtrapolator,
        V: VertexFitter,
    {
        self.phase = match self.phase {
            Phase::Start => {
                self.clock.restart();
                self.tables.truncate_all()?;
                info!(
                    "scenario {}: job {} writing to {}",
                    self.config.scenario,
                    self.config.job_id,
                    self.tables.clusters.parent().map_or_else(String::new, |p| p.display().to_string())
                );
                Phase::FetchHeader
            }
            Phase::FetchHeader => {
                let capped = self
                    .config
                    .max_events
                    .is_some_and(|max| session.events_processed() >= max);
                if capped {
                    Phase::EndOfStream
                } else {
                    match session.advance()? {
                        Some(header) => Phase::Emit(header),
                        None => Phase::EndOfStream,
                    }
                }
            }
            Phase::Emit(header) => {
                let mark = self.buffers.mark();
                if let Err(err) = self.emit_event(header, &mut session.event()) {
                    self.buffers.rollback(mark);
                    self.phase = Phase::Failed;
                    return Err(err);
                }
                self.report.events += 1;
                self.events_since_flush += 1;
                if self.events_since_flush >= self.config.flush_every.max(1) {
                    self.flush()?;
                }
                Phase::FetchHeader
            }
            Phase::EndOfStream => {
                info!(
                    "scenario {}: end of stream after {} events",
                    self.config.scenario, self.report.events
                );
                Phase::Flush
            }
            Phase::Flush => {
                self.flush()?;
                self.report.timing = self.clock.breakdown();
                Phase::Done
            }
            Phase::Done => Phase::Done,
            Phase::Failed => Phase::Failed,
        };
        Ok(self.phase)
    }

    fn flush(&mut self) -> Result<(), AggregateError> {
        let start = Instant::now();
        let counts = self.buffers.flush(&self.tables)?;
        debug!(
            "scenario {}: flushed {} clusters, {} tracks, {} residuals, {} particles, {} vertices",
            self.config.scenario,
            counts.clusters,
            counts.tracks,
            counts.residuals,
            counts.particles,
            counts.vertices
        );
        self.report.add(counts);
        self.events_since_flush = 0;
        self.clock.charge("flush", start);
        Ok(())
    }

    fn emit_event<S, E, V>(
        &mut self,
        header: EventHeader,
        ctx: &mut EventContext<'_, S, E, V>,
    ) -> Result<(), AggregateError>
    where
        S: EventStore,
        E: TrackExtrapolator,
        V: VertexFitter,
    {
        let start = Instant::now();
        for cluster in ctx.store.clusters() {
            let row = ClusterRow::new(header, cluster).map_err(|e| event_error(header, None, e))?;
            self.buffers.clusters.push(row);
        }
        self.clock.charge("clusters", start);

        let start = Instant::now();
        self.buffers.vertices.extend(
            ctx.store
                .primary_vertices()
                .iter()
                .enumerate()
                .map(|(index, pv)| VertexRow::new(header, index, pv)),
        );
        self.clock.charge("vertices", start);

        let views = ctx.track_views();

        let start = Instant::now();
        for view in &views {
            let row = self
                .track_row(header, view, ctx)
                .map_err(|e| event_error(header, Some(view.key()), e))?;
            self.buffers.tracks.push(row);
        }
        self.clock.charge("tracks", start);

        let start = Instant::now();
        for view in &views {
            self.emit_residuals(header, view, ctx)?;
        }
        self.clock.charge("residuals", start);

        let start = Instant::now();
        self.emit_particles(header, &views, ctx)?;
        self.clock.charge("particles", start);
        Ok(())
    }

    fn track_row<S, E, V>(
        &self,
        header: EventHeader,
        view: &TrackView<'_, S>,
        ctx: &EventContext<'_, S, E, V>,
    ) -> Result<TrackRow, EventFailure>
    where
        S: EventStore,
        E: TrackExtrapolator,
    {
        let state = view.state_at_reference()?;
        let truth = view.truth_particle()?;
        let momentum = view.momentum();

        let ip = truth.and_then(|particle| {
            match ctx.residuals.closest_approach(state, &particle.origin_vertex) {
                Ok(fit) => Some(-fit.residual),
                Err(err) => {
                    debug!(
                        "run {} event {} track {}: no impact parameter: {err}",
                        header.run_number,
                        header.event_number,
                        view.key()
                    );
                    None
                }
            }
        });
        let ip3d = ip.map(|v| if v.z < 0.0 { -v.norm() } else { v.norm() });

        Ok(TrackRow {
            run: header.run_number,
            event: header.event_number,
            key: view.key(),
            track_type: view.track_type().as_str().to_string(),
            px: momentum.x,
            py: momentum.y,
            pz: momentum.z,
            p: view.p(),
            pt: view.pt(),
            rx: view.rx()?,
            ry: view.ry()?,
            state_x: state.position.x,
            state_y: state.position.y,
            state_z: state.position.z,
            n_vp_hits: view.n_vp_hits()?,
            true_pid: truth.map(|p| p.pid),
            true_px: truth.map(|p| p.momentum.x),
            true_py: truth.map(|p| p.momentum.y),
            true_pz: truth.map(|p| p.momentum.z),
            ipx: ip.map(|v| v.x),
            ipy: ip.map(|v| v.y),
            ipz: ip.map(|v| v.z),
            ip3d,
        })
    }

    fn emit_residuals<S, E, V>(
        &mut self,
        header: EventHeader,
        view: &TrackView<'_, S>,
        ctx: &mut EventContext<'_, S, E, V>,
    ) -> Result<(), AggregateError>
    where
        S: EventStore,
        E: TrackExtrapolator,
    {
        let track = Some(view.key());
        let state = view
            .state_at_reference()
            .map_err(|e| event_error(header, track, e))?;
        let hits = view.vp_hits().map_err(|e| event_error(header, track, e))?;
        for hit in hits {
            let channel_id = hit.channel.channel_id();
            let cluster = ctx
                .cluster(channel_id)
                .ok_or_else(|| event_error(header, track, EventFailure::MissingCluster { channel_id }))?;
            let target = cluster.position();
            let fit = match ctx.residuals.fit(state, &target) {
                Ok(fit) => fit,
                Err(err) => {
                    warn!(
                        "run {} event {} track {} channel {}: residual skipped: {err}",
                        header.run_number,
                        header.event_number,
                        view.key(),
                        channel_id
                    );
                    self.report.skipped_residuals += 1;
                    continue;
                }
            };

            let true_position = self
                .reference
                .as_ref()
                .and_then(|r| r.get(header.run_number, header.event_number, channel_id));
            let true_fit = true_position.and_then(|p| match ctx.residuals.fit(state, &p) {
                Ok(fit) => Some(fit),
                Err(err) => {
                    warn!(
                        "run {} event {} track {} channel {}: true residual skipped: {err}",
                        header.run_number,
                        header.event_number,
                        view.key(),
                        channel_id
                    );
                    self.report.skipped_true_residuals += 1;
                    None
                }
            });

            self.buffers.residuals.push(ResidualRow {
                run: header.run_number,
                event: header.event_number,
                track: view.key(),
                channel_id,
                module: hit.channel.module(),
                station: hit.channel.station(),
                sensor: hit.channel.sensor(),
                cluster_x: target.x,
                cluster_y: target.y,
                cluster_z: target.z,
                intercept_x: fit.intercept.x,
                intercept_y: fit.intercept.y,
                intercept_z: fit.intercept.z,
                residual_x: fit.residual.x,
                residual_y: fit.residual.y,
                residual_z: fit.residual.z,
                true_x: true_position.map(|p| p.x),
                true_y: true_position.map(|p| p.y),
                true_z: true_position.map(|p| p.z),
                true_intercept_x: true_fit.map(|f| f.intercept.x),
                true_intercept_y: true_fit.map(|f| f.intercept.y),
                true_intercept_z: true_fit.map(|f| f.intercept.z),
                true_residual_x: true_fit.map(|f| f.residual.x),
                true_residual_y: true_fit.map(|f| f.residual.y),
                true_residual_z: true_fit.map(|f| f.residual.z),
            });
        }
        Ok(())
    }

    fn emit_particles<S, E, V>(
        &mut self,
        header: EventHeader,
        views: &[TrackView<'_, S>],
        ctx: &EventContext<'_, S, E, V>,
    ) -> Result<(), AggregateError>
    where
        S: EventStore,
        V: VertexFitter,
    {
        let candidates = find_dstar_candidates(ctx.store, views)
            .map_err(|e| event_error(header, None, e))?;
        for candidate in candidates {
            let result = fit_vertex(
                ctx.store,
                ctx.vertices,
                &views[candidate.kaon_plus],
                &views[candidate.kaon_minus],
                &views[candidate.pion],
            );
            match result {
                Ok(result) => self.buffers.particles.push(ParticleRow::new(header, &result)),
                Err(err) => {
                    debug!(
                        "run {} event {} candidate ({}, {}, {}): skipped: {err}",
                        header.run_number,
                        header.event_number,
                        views[candidate.kaon_plus].key(),
                        views[candidate.kaon_minus].key(),
                        views[candidate.pion].key()
                    );
                    self.report.skipped_candidates += 1;
                }
            }
        }
        Ok(())
    }
}
