use log::info;
use std::env;
use std::path::Path;
use vp_distortions::aggregate::{read_table_dir, ResidualRow, TrackRow, VertexRow};
use vp_distortions::config::summary;
use vp_distortions::io::write_json_file;
use vp_distortions::stats::summarize_scenario;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = summary::load_config(Path::new(&config_path))?;

    let (tracks, track_shards) = read_table_dir::<TrackRow>(&config.input_dir, "tracks")?;
    let (residuals, residual_shards) =
        read_table_dir::<ResidualRow>(&config.input_dir, "residuals")?;
    let (vertices, _) = read_table_dir::<VertexRow>(&config.input_dir, "vertices")?;
    if track_shards == 0 {
        return Err(format!(
            "No track tables in {}",
            config.input_dir.display()
        ));
    }
    info!(
        "read {} tracks ({} tables), {} residuals ({} tables) and {} primary vertices",
        tracks.len(),
        track_shards,
        residuals.len(),
        residual_shards,
        vertices.len()
    );

    let summary = summarize_scenario(&tracks, &residuals, &vertices, &config.options);
    write_json_file(&config.output_json, &summary)?;

    println!(
        "Summarised {} truth-matched tracks over {} stations and {} matched vertices into {}",
        summary.tracks_used,
        summary.stations.len(),
        summary.primary_vertices.vertices_used,
        config.output_json.display()
    );
    Ok(())
}

fn usage() -> String {
    "Usage: resolution_summary <config.json>".to_string()
}
