//! The seam between the playback engine and whatever renders audio.
//!
//! The engine computes, once per `play()`, where each segment of the active
//! group has to start relative to the current playhead and which part of its
//! file is still to be heard. An [`AudioOutput`] turns that plan into sound and
//! reports back whenever a scheduled segment runs out of audio.

use super::section::AudioSource;
use super::segment::Segment;
use crate::error::EngineStartError;
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// One segment's share of a playback plan.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledSegment {
    pub source: Arc<AudioSource>,
    /// Silence before this segment's first sample, measured from now
    pub delay: Duration,
    /// File-relative second to start reading from
    pub file_offset: f64,
    /// File-relative second to stop at
    pub file_end: f64,
}

impl ScheduledSegment {
    /// Wall time from now until this segment falls silent
    pub fn finishes_after(&self) -> Duration {
        self.delay + Duration::from_secs_f64((self.file_end - self.file_offset).max(0.0))
    }
}

/// Plan the segments of a group for playback starting at `timestamp`.
///
/// Segments that have already finished at `timestamp` are left out. A segment
/// that is under way is entered part-way through its file.
pub fn plan_from(group: &[Segment], timestamp: f64) -> Vec<ScheduledSegment> {
    group
        .iter()
        .filter(|segment| segment.playback_end_time() > timestamp)
        .map(|segment| {
            let delay = (segment.playback_start_time() - timestamp).max(0.0);
            let skip = (timestamp - segment.playback_start_time()).max(0.0);
            ScheduledSegment {
                source: Arc::clone(segment.source()),
                delay: Duration::from_secs_f64(delay),
                file_offset: segment.file_start_time() + skip,
                file_end: segment.file_end_time(),
            }
        })
        .collect()
}

pub trait AudioOutput {
    /// Start rendering `plan`. Anything scheduled earlier must already have
    /// been halted by the caller.
    fn schedule(&mut self, plan: &[ScheduledSegment]) -> Result<(), EngineStartError>;

    /// Silence everything scheduled, immediately. Must be safe to call when
    /// nothing is scheduled.
    fn halt(&mut self);

    /// Sources whose scheduled audio ran out since the last call, in the
    /// order they finished
    fn drain_finished(&mut self) -> Vec<Uuid>;
}

/// Output that renders nothing but keeps time like a real device would.
///
/// Used for headless runs and machines without an audio device: segments are
/// reported finished when their scheduled audio would have ended.
#[derive(Debug, Default)]
pub struct SilentOutput {
    pending: Vec<(Instant, Uuid)>,
}

impl SilentOutput {
    pub fn new() -> Self {
        Self::default()
    }

    fn drain_finished_at(&mut self, now: Instant) -> Vec<Uuid> {
        let mut finished: Vec<(Instant, Uuid)> = Vec::new();
        self.pending.retain(|&(deadline, id)| {
            if deadline <= now {
                finished.push((deadline, id));
                false
            } else {
                true
            }
        });
        finished.sort_by_key(|&(deadline, _)| deadline);
        finished.into_iter().map(|(_, id)| id).collect()
    }
}

impl AudioOutput for SilentOutput {
    fn schedule(&mut self, plan: &[ScheduledSegment]) -> Result<(), EngineStartError> {
        let now = Instant::now();
        self.pending = plan
            .iter()
            .map(|s| (now + s.finishes_after(), s.source.id))
            .collect();
        log::debug!("Silent output scheduled {} segments", self.pending.len());
        Ok(())
    }

    fn halt(&mut self) {
        self.pending.clear();
    }

    fn drain_finished(&mut self) -> Vec<Uuid> {
        self.drain_finished_at(Instant::now())
    }
}
