use log::info;
use std::env;
use std::path::Path;
use vp_distortions::aggregate::{ScenarioAggregator, TrueGeometryIndex};
use vp_distortions::config::scenario;
use vp_distortions::event::MemoryEventStore;
use vp_distortions::io::write_json_file;
use vp_distortions::residual::ResidualFitter;
use vp_distortions::session::AnalysisSession;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = scenario::load_config(Path::new(&config_path))?;

    let reference = match &config.reference_dir {
        Some(dir) => {
            if !dir.is_dir() {
                return Err(format!(
                    "Reference scenario {} has no output directory",
                    dir.display()
                ));
            }
            Some(TrueGeometryIndex::load_dir(dir).map_err(|e| e.to_string())?)
        }
        None => None,
    };

    let store = MemoryEventStore::open(&config.events)
        .map_err(|e| format!("Failed to open events {}: {e}", config.events.display()))?;
    info!(
        "scenario {} job {}: {} events queued",
        config.aggregator.scenario,
        config.aggregator.job_id,
        store.remaining()
    );

    let residuals = ResidualFitter::new(config.extrapolator, config.residual);
    let mut session = AnalysisSession::new(store, residuals, config.vertex);
    let mut aggregator = ScenarioAggregator::new(config.aggregator, reference);
    let report = aggregator.run(&mut session).map_err(|e| e.to_string())?;

    if let Some(path) = &config.report_json {
        write_json_file(path, &report)?;
    }
    println!(
        "Processed {} events: {} clusters, {} tracks, {} residuals, {} particles, {} vertices in {:.1} ms",
        report.events,
        report.clusters,
        report.tracks,
        report.residuals,
        report.particles,
        report.vertices,
        report.timing.total_ms
    );
    for path in aggregator.tables().paths() {
        println!("  {}", path.display());
    }
    Ok(())
}

fn usage() -> String {
    "Usage: analyse_scenario <config.json>".to_string()
}
