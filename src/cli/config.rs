use std::error::Error;
use std::process::Command;
use takedeck::config::Config;

pub fn handle_config_view() -> Result<(), Box<dyn Error>> {
    let config = Config::load()?;

    println!("Current takedeck configuration:");
    println!("  rms_frames_per_second: {}", config.rms_frames_per_second);
    println!("  pixels_per_rms: {}", config.pixels_per_rms);
    println!("  overlap_seconds: {}", config.overlap_seconds);
    println!("  tick_interval_ms: {}", config.tick_interval_ms);
    println!(
        "  retain_position_on_pause: {}",
        config.retain_position_on_pause
    );
    match config.shuffle_seed {
        Some(seed) => println!("  shuffle_seed: {seed}"),
        None => println!("  shuffle_seed: none"),
    }
    println!("  log_level: {}", config.log_level);

    Ok(())
}

pub fn handle_config_set(key: &str, value: &str) -> Result<(), Box<dyn Error>> {
    let mut config = Config::load()?;

    config.set_value(key, value)?;
    config.save()?;

    println!("Configuration updated: {key} = {value}");

    Ok(())
}

pub fn handle_config_edit() -> Result<(), Box<dyn Error>> {
    if !Config::exists()? {
        return Err("takedeck not initialized. Run 'takedeck init' first.".into());
    }

    let config_path = Config::config_path()?;
    let editor = std::env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    println!("Opening {} in {}", config_path.display(), editor);

    let status = Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                format!("Editor '{editor}' not found. Set $EDITOR to a valid editor path.")
            } else {
                format!("Failed to launch editor '{editor}': {e}")
            }
        })?;

    if !status.success() {
        return Err(format!("Editor '{editor}' exited with error").into());
    }

    match Config::load() {
        Ok(_) => println!("Configuration saved successfully"),
        Err(e) => {
            return Err(format!("Configuration validation failed: {e}").into());
        }
    }

    Ok(())
}
