//! Device output through rodio.
//!
//! Every scheduled segment gets its own [`Sink`] on the device mixer, so
//! neighbouring segments can overlap during the hand-off. Each sink plays a
//! [`SegmentSource`]: the decoded file preceded by as much silence as the
//! segment's delay, which reports its source id once its last sample has been
//! pulled by the device.

use super::output::{AudioOutput, ScheduledSegment};
use crate::error::EngineStartError;
use crate::media::{DecodedAudio, decode_file};
use rodio::{OutputStream, OutputStreamBuilder, Sink, Source};
use std::collections::HashMap;
use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
    mpsc,
};
use std::time::Duration;
use uuid::Uuid;

pub struct RodioOutput {
    stream: OutputStream,
    sinks: Vec<Sink>,
    decoded: HashMap<Uuid, DecodedAudio>,
    generation: Arc<AtomicU64>,
    finished_tx: mpsc::Sender<(u64, Uuid)>,
    finished_rx: mpsc::Receiver<(u64, Uuid)>,
}

impl RodioOutput {
    pub fn new() -> Result<Self, EngineStartError> {
        let stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| EngineStartError::OutputUnavailable(e.to_string()))?;
        let (finished_tx, finished_rx) = mpsc::channel();

        log::info!("Opened default audio output");

        Ok(Self {
            stream,
            sinks: Vec::new(),
            decoded: HashMap::new(),
            generation: Arc::new(AtomicU64::new(0)),
            finished_tx,
            finished_rx,
        })
    }

    fn decoded_audio(&mut self, scheduled: &ScheduledSegment) -> Result<DecodedAudio, EngineStartError> {
        if let Some(audio) = self.decoded.get(&scheduled.source.id) {
            return Ok(audio.clone());
        }
        let audio = decode_file(&scheduled.source.location).map_err(|e| EngineStartError::Schedule {
            name: scheduled.source.display_name.clone(),
            reason: e.to_string(),
        })?;
        self.decoded.insert(scheduled.source.id, audio.clone());
        Ok(audio)
    }
}

impl AudioOutput for RodioOutput {
    fn schedule(&mut self, plan: &[ScheduledSegment]) -> Result<(), EngineStartError> {
        // Forget decodes for sources that are no longer part of the plan
        self.decoded
            .retain(|id, _| plan.iter().any(|s| s.source.id == *id));

        let generation = self.generation.load(Ordering::SeqCst);
        let mut sources = Vec::with_capacity(plan.len());
        for scheduled in plan {
            let audio = self.decoded_audio(scheduled)?;
            sources.push(SegmentSource::new(
                &audio,
                scheduled,
                generation,
                self.finished_tx.clone(),
            ));
        }

        // Everything is decoded; start the sinks back to back
        for source in sources {
            let sink = Sink::connect_new(self.stream.mixer());
            sink.append(source);
            self.sinks.push(sink);
        }

        log::info!("Scheduled {} segments on the device", self.sinks.len());
        Ok(())
    }

    fn halt(&mut self) {
        // Reports from sources started before this point are stale
        self.generation.fetch_add(1, Ordering::SeqCst);
        for sink in self.sinks.drain(..) {
            sink.stop();
        }
    }

    fn drain_finished(&mut self) -> Vec<Uuid> {
        let current = self.generation.load(Ordering::SeqCst);
        self.finished_rx
            .try_iter()
            .filter(|&(generation, _)| generation == current)
            .map(|(_, id)| id)
            .collect()
    }
}

/// Part of a decoded file, preceded by leading silence.
struct SegmentSource {
    samples: Arc<[f32]>,
    position: usize,
    end: usize,
    silence_remaining: usize,
    channels: u16,
    sample_rate: u32,
    source_id: Uuid,
    generation: u64,
    finished_tx: Option<mpsc::Sender<(u64, Uuid)>>,
}

impl SegmentSource {
    fn new(
        audio: &DecodedAudio,
        scheduled: &ScheduledSegment,
        generation: u64,
        finished_tx: mpsc::Sender<(u64, Uuid)>,
    ) -> Self {
        let channels = audio.channels.max(1);
        let silent_frames = (scheduled.delay.as_secs_f64() * audio.sample_rate as f64) as usize;
        let end = audio.sample_index_at(scheduled.file_end);
        let position = audio.sample_index_at(scheduled.file_offset).min(end);

        Self {
            samples: Arc::clone(&audio.samples),
            position,
            end,
            silence_remaining: silent_frames * channels as usize,
            channels,
            sample_rate: audio.sample_rate,
            source_id: scheduled.source.id,
            generation,
            finished_tx: Some(finished_tx),
        }
    }

    fn report_finished(&mut self) {
        if let Some(tx) = self.finished_tx.take() {
            log::debug!("Segment finished: {}", self.source_id);
            let _ = tx.send((self.generation, self.source_id));
        }
    }
}

impl Iterator for SegmentSource {
    type Item = f32;

    fn next(&mut self) -> Option<Self::Item> {
        if self.silence_remaining > 0 {
            self.silence_remaining -= 1;
            return Some(0.0);
        }

        if self.position >= self.end {
            self.report_finished();
            return None;
        }

        let sample = self.samples[self.position];
        self.position += 1;
        Some(sample)
    }
}

impl Source for SegmentSource {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        self.channels
    }

    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn total_duration(&self) -> Option<Duration> {
        let remaining = self.silence_remaining + self.end.saturating_sub(self.position);
        let duration_secs = remaining as f64 / (self.sample_rate as f64 * self.channels as f64);
        Some(Duration::from_secs_f64(duration_secs))
    }
}
