//! A source file placed on the playback timeline.
//!
//! Segments are immutable once built. File-relative times select the portion
//! of the source to play; playback-relative times place that portion on the
//! group's continuous timeline.

use super::section::AudioSource;
use crate::error::SegmentError;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct Segment {
    source: Arc<AudioSource>,
    file_start_time: f64,
    file_end_time: f64,
    playback_start_time: f64,
    rms_values: Arc<[f32]>,
    rms_frames_per_second: f64,
}

impl Segment {
    /// Build a segment over `[file_start_time, file_end_time)` of a file that
    /// lasts `file_duration` seconds. Negative playback starts are pinned to 0.
    pub fn new(
        source: Arc<AudioSource>,
        file_start_time: f64,
        file_end_time: f64,
        file_duration: f64,
        playback_start_time: f64,
        rms_values: Vec<f32>,
        rms_frames_per_second: f64,
    ) -> Result<Self, SegmentError> {
        if !(file_start_time < file_end_time) {
            return Err(SegmentError::EmptyRange {
                start: file_start_time,
                end: file_end_time,
            });
        }
        if file_start_time < 0.0 || file_end_time > file_duration {
            return Err(SegmentError::OutOfBounds {
                start: file_start_time,
                end: file_end_time,
                duration: file_duration,
            });
        }

        Ok(Self {
            source,
            file_start_time,
            file_end_time,
            playback_start_time: playback_start_time.max(0.0),
            rms_values: rms_values.into(),
            rms_frames_per_second,
        })
    }

    /// Segment covering the whole file
    pub fn whole_file(
        source: Arc<AudioSource>,
        file_duration: f64,
        playback_start_time: f64,
        rms_values: Vec<f32>,
        rms_frames_per_second: f64,
    ) -> Result<Self, SegmentError> {
        Self::new(
            source,
            0.0,
            file_duration,
            file_duration,
            playback_start_time,
            rms_values,
            rms_frames_per_second,
        )
    }

    pub fn source(&self) -> &Arc<AudioSource> {
        &self.source
    }

    pub fn source_id(&self) -> Uuid {
        self.source.id
    }

    pub fn file_start_time(&self) -> f64 {
        self.file_start_time
    }

    pub fn file_end_time(&self) -> f64 {
        self.file_end_time
    }

    pub fn duration(&self) -> f64 {
        self.file_end_time - self.file_start_time
    }

    pub fn playback_start_time(&self) -> f64 {
        self.playback_start_time
    }

    pub fn playback_end_time(&self) -> f64 {
        self.playback_start_time + self.duration()
    }

    /// RMS values for the whole source file
    pub fn rms_values(&self) -> &[f32] {
        &self.rms_values
    }

    pub fn rms_frames_per_second(&self) -> f64 {
        self.rms_frames_per_second
    }

    /// RMS values covering only the played portion of the file.
    ///
    /// Indices are clamped, so a short or empty RMS buffer yields a shorter
    /// or empty slice rather than a panic.
    pub fn rms_values_for_range(&self) -> &[f32] {
        let len = self.rms_values.len();
        let start = ((self.file_start_time * self.rms_frames_per_second) as usize).min(len);
        let end = ((self.file_end_time * self.rms_frames_per_second) as usize).clamp(start, len);
        &self.rms_values[start..end]
    }

    /// Whether `timestamp` falls inside this segment's playback window
    pub fn contains(&self, timestamp: f64) -> bool {
        timestamp >= self.playback_start_time && timestamp < self.playback_end_time()
    }
}

/// End time of a group: its last segment's end, or 0 when empty
pub fn group_end_time(group: &[Segment]) -> f64 {
    group.last().map(Segment::playback_end_time).unwrap_or(0.0)
}
