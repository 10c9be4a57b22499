use log::info;
use std::env;
use std::path::Path;
use vp_distortions::alignment::{build, write_condition_files};
use vp_distortions::config::alignment;
use vp_distortions::io::write_json_file;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = alignment::load_config(Path::new(&config_path))?;

    let conditions = build(&config.perturbation).map_err(|e| e.to_string())?;
    info!(
        "built {} global and {} module records (x={} um, y={} um, sigma={})",
        conditions.global.len(),
        conditions.modules.len(),
        config.perturbation.x_offset_um,
        config.perturbation.y_offset_um,
        config.perturbation.sigma
    );

    write_condition_files(
        &conditions,
        &config.output.global_xml,
        &config.output.modules_xml,
    )?;
    if let Some(path) = &config.output.records_json {
        write_json_file(path, &conditions)?;
        println!("Saved perturbation records to {}", path.display());
    }

    println!(
        "Saved global conditions to {}",
        config.output.global_xml.display()
    );
    println!(
        "Saved {} module conditions to {}",
        conditions.modules.len(),
        config.output.modules_xml.display()
    );
    Ok(())
}

fn usage() -> String {
    "Usage: build_alignment <config.json>".to_string()
}
