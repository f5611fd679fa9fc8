//! `takedeck analyze`: print RMS waveforms for audio files.
//!
//! Files are analyzed in parallel. Output order follows the command line, not
//! completion order.

use owo_colors::OwoColorize;
use rayon::prelude::*;
use std::error::Error;
use std::path::PathBuf;
use takedeck::config::Config;
use takedeck::player::waveform::{Waveform, analyze_file, render_blocks};
use takedeck::utils::progress::create_progress_bar;

pub fn handle_analyze(
    files: &[String],
    rate: Option<f64>,
    width: usize,
) -> Result<(), Box<dyn Error>> {
    let rms_frames_per_second = match rate {
        Some(rate) if rate > 0.0 && rate.is_finite() => rate,
        Some(rate) => return Err(format!("Invalid rate {rate}: must be greater than zero").into()),
        None => Config::load()?.rms_frames_per_second,
    };

    let paths: Vec<PathBuf> = files
        .iter()
        .map(|f| PathBuf::from(shellexpand::tilde(f).as_ref()))
        .collect();

    let pb = create_progress_bar(paths.len() as u64);
    pb.set_message("analyzing");
    let results: Vec<_> = paths
        .par_iter()
        .map(|path| {
            let result = analyze_file(path, rms_frames_per_second);
            pb.inc(1);
            result
        })
        .collect();
    pb.finish_and_clear();

    let mut failures = 0;
    for (path, result) in paths.iter().zip(results) {
        match result {
            Ok(waveform) => print_waveform(path, &waveform, rms_frames_per_second, width),
            Err(e) => {
                failures += 1;
                eprintln!("{} {e}", "✗".red());
            }
        }
    }

    if failures > 0 {
        return Err(format!("{failures} of {} files could not be analyzed", paths.len()).into());
    }
    Ok(())
}

fn print_waveform(path: &std::path::Path, waveform: &Waveform, rate: f64, width: usize) {
    let peak = waveform.rms_values.iter().copied().fold(0.0_f32, f32::max);
    println!(
        "{} {}",
        "♪".cyan(),
        path.display().to_string().bold()
    );
    println!(
        "  {:.2}s @ {} Hz, {} RMS frames at {rate}/s, peak {peak:.3}",
        waveform.duration_seconds,
        waveform.sample_rate,
        waveform.rms_values.len()
    );
    if waveform.rms_values.is_empty() {
        println!("  {}", "(too short for a single analysis window)".dimmed());
    } else {
        println!("  {}", render_blocks(&waveform.display_values(width)).cyan());
    }
}
