//! Error taxonomy for timeline building and playback.
//!
//! Decode and access failures are recovered per track while a timeline is
//! built. Start failures are returned to whoever called `play()`.

use crate::constants::MAX_ALTERNATES;
use std::path::PathBuf;
use thiserror::Error;

/// A source file could not be read as audio.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("Failed to open '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported audio format '{extension}' for '{path}'")]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("Unsupported bit depth {bits} in '{path}'")]
    UnsupportedBitDepth { path: PathBuf, bits: u32 },

    #[error("Malformed WAV data in '{path}': {reason}")]
    Wav { path: PathBuf, reason: String },

    #[error("Malformed FLAC data in '{path}': {reason}")]
    Flac { path: PathBuf, reason: String },

    #[error("'{path}' has no channels or a zero sample rate")]
    EmptyStream { path: PathBuf },
}

/// A scoped lease on a source location could not be acquired.
#[derive(Debug, Error)]
pub enum ResourceAccessError {
    #[error("Location '{path}' does not exist")]
    Missing { path: PathBuf },

    #[error("Access to '{path}' was denied: {reason}")]
    Denied { path: PathBuf, reason: String },
}

/// The audio output could not be opened or could not accept the schedule.
#[derive(Debug, Error)]
pub enum EngineStartError {
    #[error("Failed to open audio output: {0}")]
    OutputUnavailable(String),

    #[error("Failed to schedule '{name}': {reason}")]
    Schedule { name: String, reason: String },

    #[error("No segment in the active group could be opened")]
    NothingPlayable,
}

/// Time ranges that violate the segment invariants.
#[derive(Debug, Error, PartialEq)]
pub enum SegmentError {
    #[error("File range {start}..{end} is empty or inverted")]
    EmptyRange { start: f64, end: f64 },

    #[error("File range {start}..{end} lies outside the file duration {duration}")]
    OutOfBounds { start: f64, end: f64, duration: f64 },
}

/// Everything that can go wrong while analysing a single track.
#[derive(Debug, Error)]
pub enum TrackError {
    #[error(transparent)]
    Access(#[from] ResourceAccessError),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Segment(#[from] SegmentError),
}

/// An arrangement file could not be read or describes an impossible slot.
#[derive(Debug, Error)]
pub enum ArrangementError {
    #[error("Failed to read arrangement '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid arrangement '{path}': {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Track {track} of section '{section}' has {count} takes (at most {max})", max = MAX_ALTERNATES)]
    TooManyTakes {
        section: String,
        track: usize,
        count: usize,
    },
}

/// Configuration could not be located, parsed or updated.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Unable to find config directory")]
    NoConfigDir,

    #[error("Config I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Unknown configuration key: {0}")]
    UnknownKey(String),

    #[error("Invalid value '{value}' for '{key}': {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}
