//! Project-wide constants used across multiple modules.
//!
//! Timing values here are the defaults; most of them can be overridden
//! through [`crate::config::Config`].

/// Spinner animation characters for progress indicators
pub const SPINNER_CHARS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Seconds each segment is pulled back over the end of its predecessor so the
/// hand-off between files never leaves a gap.
pub const OVERLAP_SECONDS: f64 = 0.07;

/// Alternate takes a single track slot may offer
pub const MAX_ALTERNATES: usize = 2;

/// RMS analysis windows per second of audio
pub const DEFAULT_RMS_FRAMES_PER_SECOND: f64 = 15.0;

/// Horizontal pixels drawn per RMS value
pub const DEFAULT_PIXELS_PER_RMS: f64 = 1.0;

/// Transport clock poll interval in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 50;

/// Boundary identity reported when a group starts from its first track
pub const FIRST_TRACK_SENTINEL: &str = "first track";

/// Log file written by the binary
pub const LOG_FILE_NAME: &str = "takedeck.log";
