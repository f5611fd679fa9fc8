//! RMS waveform analysis for segment visualization.
//!
//! A source file is decoded, folded to mono by averaging its channels, and cut
//! into non-overlapping windows of `sample_rate / rms_frames_per_second`
//! samples. Each window is summarized by its root-mean-square amplitude. The
//! trailing partial window is dropped so that every value covers the same
//! amount of audio.

use crate::error::DecodeError;
use crate::media::decode_file;
use std::path::Path;

/// RMS summary of a whole file plus the facts needed to place it on a timeline.
#[derive(Debug, Clone)]
pub struct Waveform {
    pub rms_values: Vec<f32>,
    pub duration_seconds: f64,
    pub sample_rate: u32,
}

impl Waveform {
    /// Reduce the RMS values to `width` columns, keeping the loudest value
    /// in each column.
    pub fn display_values(&self, width: usize) -> Vec<f32> {
        display_values(&self.rms_values, width)
    }
}

/// Decode `path` and return its RMS values.
///
/// An empty vector means the file is too short for a single window at this
/// rate. An unreadable file is an error, never an empty result.
pub fn analyze(path: &Path, rms_frames_per_second: f64) -> Result<Vec<f32>, DecodeError> {
    Ok(analyze_file(path, rms_frames_per_second)?.rms_values)
}

/// Decode `path` once and return both its RMS values and its duration.
pub fn analyze_file(path: &Path, rms_frames_per_second: f64) -> Result<Waveform, DecodeError> {
    let decoded = decode_file(path)?;
    let mono = decoded.to_mono();
    let window_size = window_size(decoded.sample_rate, rms_frames_per_second);

    Ok(Waveform {
        rms_values: rms_windows(&mono, window_size),
        duration_seconds: decoded.duration_seconds(),
        sample_rate: decoded.sample_rate,
    })
}

/// Samples per analysis window
pub fn window_size(sample_rate: u32, rms_frames_per_second: f64) -> usize {
    if !(rms_frames_per_second > 0.0) {
        return 0;
    }
    (sample_rate as f64 / rms_frames_per_second) as usize
}

/// RMS of each complete `window_size` chunk of `signal`.
pub fn rms_windows(signal: &[f32], window_size: usize) -> Vec<f32> {
    if window_size == 0 || window_size >= signal.len() {
        return Vec::new();
    }

    signal
        .chunks_exact(window_size)
        .map(|window| {
            let sum_of_squares: f32 = window.iter().map(|s| s * s).sum();
            (sum_of_squares / window_size as f32).sqrt()
        })
        .collect()
}

/// Downsample `values` to at most `width` columns (max per column).
pub fn display_values(values: &[f32], width: usize) -> Vec<f32> {
    if width == 0 {
        return Vec::new();
    }
    if width >= values.len() {
        return values.to_vec();
    }

    let per_column = values.len() as f32 / width as f32;
    (0..width)
        .map(|i| {
            let start = (i as f32 * per_column) as usize;
            let end = (((i + 1) as f32 * per_column) as usize).clamp(start + 1, values.len());
            values[start..end].iter().copied().fold(0.0, f32::max)
        })
        .collect()
}

/// Convert amplitude to terminal block characters for visualization
pub fn amplitude_to_blocks(amplitude: f32) -> &'static str {
    let normalized = amplitude.abs().min(1.0);
    let index = (normalized * 8.0) as usize;

    match index {
        0 => " ",
        1 => "▁",
        2 => "▂",
        3 => "▃",
        4 => "▄",
        5 => "▅",
        6 => "▆",
        7 => "▇",
        _ => "█",
    }
}

/// Render RMS values as one line of block characters, scaled so the loudest
/// value fills a full cell.
pub fn render_blocks(values: &[f32]) -> String {
    let peak = values.iter().copied().fold(0.0, f32::max);
    let scale = if peak > 0.0 { 1.0 / peak } else { 0.0 };
    values
        .iter()
        .map(|&v| amplitude_to_blocks(v * scale))
        .collect()
}
