#![allow(dead_code)]

use std::cell::RefCell;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};
use takedeck::error::{EngineStartError, ResourceAccessError};
use takedeck::media::LocationAccess;
use takedeck::player::{AudioOutput, ScheduledSegment};
use uuid::Uuid;

pub const SAMPLE_RATE: u32 = 8000;

/// Write a mono 16-bit sine take of `seconds` length
pub fn write_take(dir: &Path, name: &str, seconds: f64) -> PathBuf {
    let path = dir.join(name);
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(&path, spec).unwrap();
    let frames = (seconds * SAMPLE_RATE as f64).round() as usize;
    for i in 0..frames {
        let t = i as f32 / SAMPLE_RATE as f32;
        let sample = (t * 440.0 * std::f32::consts::TAU).sin() * 0.5;
        writer.write_sample((sample * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
    path
}

/// Access that succeeds for every path and counts open leases
#[derive(Default)]
pub struct CountingAccess {
    pub open: AtomicUsize,
    pub acquired: AtomicUsize,
}

impl CountingAccess {
    pub fn open(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }

    pub fn acquired(&self) -> usize {
        self.acquired.load(Ordering::SeqCst)
    }
}

impl LocationAccess for CountingAccess {
    fn start_accessing(&self, location: &Path) -> Result<(), ResourceAccessError> {
        if !location.exists() {
            return Err(ResourceAccessError::Missing {
                path: location.to_path_buf(),
            });
        }
        self.open.fetch_add(1, Ordering::SeqCst);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn stop_accessing(&self, _location: &Path) {
        self.open.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
pub struct Recorded {
    pub plans: Vec<Vec<ScheduledSegment>>,
    pub halts: usize,
    pub finished: Vec<Uuid>,
}

/// Output that records plans and replays queued boundary reports
#[derive(Clone, Default)]
pub struct RecordingOutput(pub Rc<RefCell<Recorded>>);

impl RecordingOutput {
    pub fn finish(&self, source_id: Uuid) {
        self.0.borrow_mut().finished.push(source_id);
    }

    pub fn plan_count(&self) -> usize {
        self.0.borrow().plans.len()
    }

    pub fn last_plan(&self) -> Vec<ScheduledSegment> {
        self.0.borrow().plans.last().cloned().unwrap_or_default()
    }
}

impl AudioOutput for RecordingOutput {
    fn schedule(&mut self, plan: &[ScheduledSegment]) -> Result<(), EngineStartError> {
        self.0.borrow_mut().plans.push(plan.to_vec());
        Ok(())
    }

    fn halt(&mut self) {
        self.0.borrow_mut().halts += 1;
    }

    fn drain_finished(&mut self) -> Vec<Uuid> {
        std::mem::take(&mut self.0.borrow_mut().finished)
    }
}
