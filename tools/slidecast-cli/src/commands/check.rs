//! Check system capabilities.

use std::path::Path;

use slidecast_common::config::{config_file_path, AppConfig};
use slidecast_render_engine::command_exists;

pub fn run(config: &AppConfig, config_override: Option<&Path>) -> anyhow::Result<()> {
    println!("Slidecast System Check");
    println!("{}", "=".repeat(50));

    let mut all_ok = true;
    for (binary, role) in [("ffmpeg", "rendering"), ("ffprobe", "media probing")] {
        if command_exists(binary) {
            println!("[OK] {binary} found ({role})");
        } else {
            println!("[MISSING] {binary} not found in PATH ({role})");
            all_ok = false;
        }
    }

    let config_path = config_override
        .map(Path::to_path_buf)
        .unwrap_or_else(config_file_path);
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[INFO] Config: {} (not present, using defaults)", config_path.display());
    }
    println!("[INFO] Workspace: {}", config.workspace_dir.display());

    let canvas = config.composition.canvas;
    println!(
        "[INFO] Canvas: {}x{} @ {} fps, format {:?}",
        canvas.width, canvas.height, canvas.fps, config.composition.codec.format
    );

    println!();
    if all_ok {
        println!("All required tools are available. Slidecast is ready.");
    } else {
        println!("Some required tools are missing. Install ffmpeg (which ships ffprobe).");
    }

    Ok(())
}
