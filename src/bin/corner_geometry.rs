use nalgebra::Point3;
use std::env;
use std::path::Path;
use vp_distortions::config::geometry;
use vp_distortions::geometry::{
    format_position_line, scan_sensors, BoxSensor, CornerExport, SensorGeometry,
};
use vp_distortions::io::write_text_file;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = geometry::load_config(Path::new(&config_path))?;
    if config.sensors.is_empty() {
        return Err("Config lists no sensors".to_string());
    }

    let sensors: Vec<BoxSensor> = config.sensors.iter().map(BoxSensor::from).collect();
    let corners = scan_sensors(&sensors).map_err(|e| e.to_string())?;
    let export = CornerExport::from_sensors(&corners);
    export.write(&config.output.local_json, &config.output.global_json)?;

    if let Some(path) = &config.output.positions_txt {
        let mut dump = String::new();
        for sensor in &sensors {
            let centre = sensor.to_global(&Point3::origin());
            dump.push_str(&format_position_line(sensor.name(), &centre));
        }
        write_text_file(path, &dump)?;
        println!("Saved sensor positions to {}", path.display());
    }

    println!(
        "Saved corners of {} sensors to {} and {}",
        corners.len(),
        config.output.local_json.display(),
        config.output.global_json.display()
    );
    Ok(())
}

fn usage() -> String {
    "Usage: corner_geometry <config.json>".to_string()
}
