//! Transport for a multi-segment timeline.
//!
//! The engine owns the built segment groups, the logical playhead and the
//! audio output. Only one group is active at a time; its segments form one
//! continuous timeline that starts at zero and ends at the last segment's
//! end. All state changes go through `&mut self`, so callers serialize
//! transport commands simply by owning the engine.
//!
//! Playback position is kept twice: the output knows exactly where audio is,
//! and the engine keeps a coarse playhead driven by [`TransportClock`] for
//! displays. When the output reports that the last segment of the active
//! group has finished, the engine moves on to the next group, and after the
//! last group it rebuilds the arrangement from its sections and starts over
//! at the first. A playhead that runs past the end only stops playback.

use super::clock::TransportClock;
use super::events::{BoundaryId, EventBus, NowPlaying, PlaybackEvent, RemoteCommand};
use super::output::{AudioOutput, plan_from};
use super::section::Section;
use super::segment::Segment;
use super::timeline::{SegmentGroup, TimelineBuilder};
use crate::config::Config;
use crate::error::EngineStartError;
use crate::media::Lease;
use std::sync::mpsc;
use std::time::{Duration, Instant};
use uuid::Uuid;

/// What happens to the playhead when playback is paused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StopPolicy {
    /// Pause behaves like stop and rewinds to zero
    #[default]
    ResetToStart,
    /// Pause keeps the playhead so playback resumes where it left off
    RetainPosition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportState {
    /// The active group has no segments
    Idle,
    Stopped,
    Paused,
    Playing,
}

pub struct PlaybackEngine {
    builder: TimelineBuilder,
    output: Box<dyn AudioOutput>,
    clock: TransportClock,
    events: EventBus,
    stop_policy: StopPolicy,
    sections: Vec<Section>,
    groups: Vec<SegmentGroup>,
    active_group_index: usize,
    is_playing: bool,
    timestamp: f64,
    end_time: f64,
    leases: Vec<Lease>,
}

impl PlaybackEngine {
    pub fn new(builder: TimelineBuilder, output: Box<dyn AudioOutput>) -> Self {
        Self {
            builder,
            output,
            clock: TransportClock::default(),
            events: EventBus::default(),
            stop_policy: StopPolicy::default(),
            sections: Vec::new(),
            groups: Vec::new(),
            active_group_index: 0,
            is_playing: false,
            timestamp: 0.0,
            end_time: 0.0,
            leases: Vec::new(),
        }
    }

    /// Engine configured from user settings
    pub fn from_config(config: &Config, output: Box<dyn AudioOutput>) -> Self {
        let mut builder =
            TimelineBuilder::new(config.rms_frames_per_second).with_overlap(config.overlap_seconds);
        if let Some(seed) = config.shuffle_seed {
            builder = builder.with_seed(seed);
        }
        let policy = if config.retain_position_on_pause {
            StopPolicy::RetainPosition
        } else {
            StopPolicy::ResetToStart
        };

        Self::new(builder, output)
            .with_stop_policy(policy)
            .with_tick_interval(Duration::from_millis(config.tick_interval_ms))
    }

    pub fn with_stop_policy(mut self, stop_policy: StopPolicy) -> Self {
        self.stop_policy = stop_policy;
        self
    }

    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.clock = TransportClock::new(interval);
        self
    }

    pub fn subscribe(&mut self) -> mpsc::Receiver<PlaybackEvent> {
        self.events.subscribe()
    }

    // ---- state ----

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn timestamp(&self) -> f64 {
        self.timestamp
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn active_group_index(&self) -> usize {
        self.active_group_index
    }

    pub fn groups(&self) -> &[SegmentGroup] {
        &self.groups
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn active_group(&self) -> Option<&SegmentGroup> {
        self.groups.get(self.active_group_index)
    }

    pub fn active_segments(&self) -> &[Segment] {
        self.active_group()
            .map(|group| group.segments.as_slice())
            .unwrap_or(&[])
    }

    pub fn clock_interval(&self) -> Duration {
        self.clock.interval()
    }

    pub fn time_until_next_tick(&self, now: Instant) -> Duration {
        self.clock.time_until_next_tick(now)
    }

    pub fn stop_policy(&self) -> StopPolicy {
        self.stop_policy
    }

    pub fn state(&self) -> TransportState {
        if self.active_segments().is_empty() {
            TransportState::Idle
        } else if self.is_playing {
            TransportState::Playing
        } else if self.timestamp > 0.0 {
            TransportState::Paused
        } else {
            TransportState::Stopped
        }
    }

    /// The segment under the playhead, preferring the later one while two
    /// segments overlap
    pub fn current_segment(&self) -> Option<&Segment> {
        self.active_segments()
            .iter()
            .rev()
            .find(|segment| segment.playback_start_time() <= self.timestamp)
    }

    pub fn now_playing(&self) -> NowPlaying {
        NowPlaying {
            title: self
                .active_group()
                .map(|group| group.title.clone())
                .unwrap_or_default(),
            elapsed: self.timestamp,
            duration: self.end_time,
            is_playing: self.is_playing,
        }
    }

    /// Horizontal playhead position for a waveform drawn at `pixels_per_rms`
    pub fn playhead_offset(&self, pixels_per_rms: f64) -> f64 {
        self.timestamp * pixels_per_rms * self.builder.rms_frames_per_second()
    }

    // ---- loading ----

    /// Replace every group. Playback stops and the first group becomes active.
    pub fn load_timeline(&mut self, groups: Vec<SegmentGroup>) {
        self.stop();
        self.groups = groups;
        self.active_group_index = 0;
        self.timestamp = 0.0;
        self.refresh_end_time();

        log::info!(
            "Timeline loaded: {} groups, first ends at {:.2}s",
            self.groups.len(),
            self.end_time
        );
        self.events.emit(PlaybackEvent::TimelineLoaded {
            groups: self.groups.len(),
            end_time: self.end_time,
        });
    }

    /// Keep `sections` for later rebuilds and load a fresh build of them
    pub fn load_sections(&mut self, sections: Vec<Section>) {
        self.sections = sections;
        self.rebuild();
    }

    /// Rebuild from the stored sections, drawing new takes
    pub fn rebuild(&mut self) {
        let groups = self.builder.build(&self.sections);
        self.load_timeline(groups);
    }

    // ---- transport ----

    pub fn play(&mut self) -> Result<(), EngineStartError> {
        if self.is_playing {
            return Ok(());
        }
        if self.active_segments().is_empty() {
            return Ok(());
        }

        let plan = plan_from(self.active_segments(), self.timestamp);
        if plan.is_empty() {
            // The playhead sits at the end of the group; there is nothing left to hear
            log::info!(
                "Nothing left to play in group {} at {:.2}s",
                self.active_group_index,
                self.timestamp
            );
            self.stop();
            self.events.emit(PlaybackEvent::EndOfTimeline);
            return Ok(());
        }

        let mut leases = Vec::with_capacity(plan.len());
        let mut playable = Vec::with_capacity(plan.len());
        for scheduled in plan {
            match Lease::acquire(self.builder.access(), &scheduled.source.location) {
                Ok(lease) => {
                    leases.push(lease);
                    playable.push(scheduled);
                }
                Err(e) => log::warn!("Not playing '{}': {e}", scheduled.source.display_name),
            }
        }
        if playable.is_empty() {
            return Err(EngineStartError::NothingPlayable);
        }

        if let Err(e) = self.output.schedule(&playable) {
            self.output.halt();
            log::error!("Playback failed to start: {e}");
            return Err(e);
        }

        self.leases = leases;
        self.is_playing = true;
        self.clock.start(Instant::now());

        log::info!(
            "Playing group {} from {:.2}s ({} segments scheduled)",
            self.active_group_index,
            self.timestamp,
            playable.len()
        );
        self.events.emit(PlaybackEvent::Boundary(BoundaryId::FirstTrack));
        self.events.emit(PlaybackEvent::Started {
            group: self.active_group_index,
            timestamp: self.timestamp,
        });
        Ok(())
    }

    /// Halt playback and apply the pause policy to the playhead
    pub fn pause(&mut self) {
        if !self.is_playing {
            return;
        }
        self.halt();
        if self.stop_policy == StopPolicy::ResetToStart {
            self.timestamp = 0.0;
        }
        self.events.emit(PlaybackEvent::Stopped {
            timestamp: self.timestamp,
        });
    }

    /// Halt playback and rewind to zero
    pub fn stop(&mut self) {
        if !self.is_playing {
            // A retained pause position is dropped; otherwise nothing to do
            self.timestamp = 0.0;
            return;
        }
        self.halt();
        self.timestamp = 0.0;
        self.events.emit(PlaybackEvent::Stopped { timestamp: 0.0 });
    }

    pub fn toggle_play_pause(&mut self) -> Result<(), EngineStartError> {
        if self.is_playing {
            self.pause();
            Ok(())
        } else {
            self.play()
        }
    }

    /// Move the playhead. Positions past the end stop playback and rewind.
    pub fn seek(&mut self, to: f64) -> Result<(), EngineStartError> {
        if to.is_nan() {
            return Ok(());
        }
        if to > self.end_time {
            self.set_timestamp(to);
            return Ok(());
        }

        let was_playing = self.is_playing;
        if was_playing {
            self.halt();
        }
        self.set_timestamp(to);
        log::debug!("Seek to {:.3}s", self.timestamp);

        if was_playing { self.play() } else { Ok(()) }
    }

    /// Step to the neighbouring group. Stepping past either end does nothing.
    pub fn advance_group(&mut self, forward: bool) -> Result<(), EngineStartError> {
        let target = if forward {
            self.active_group_index + 1
        } else {
            match self.active_group_index.checked_sub(1) {
                Some(index) => index,
                None => return Ok(()),
            }
        };
        if target >= self.groups.len() {
            return Ok(());
        }

        let was_playing = self.is_playing;
        self.stop();
        self.switch_group(target);

        if was_playing { self.play() } else { Ok(()) }
    }

    pub fn next(&mut self) -> Result<(), EngineStartError> {
        self.advance_group(true)
    }

    pub fn previous(&mut self) -> Result<(), EngineStartError> {
        self.advance_group(false)
    }

    pub fn handle_command(&mut self, command: RemoteCommand) -> Result<(), EngineStartError> {
        log::debug!("Command: {command:?}");
        match command {
            RemoteCommand::Play => self.play(),
            RemoteCommand::Pause => {
                self.pause();
                Ok(())
            }
            RemoteCommand::TogglePlayPause => self.toggle_play_pause(),
            RemoteCommand::Stop => {
                self.stop();
                Ok(())
            }
            RemoteCommand::Next => self.next(),
            RemoteCommand::Previous => self.previous(),
            RemoteCommand::Seek(to) => self.seek(to),
        }
    }

    // ---- notifications from the output ----

    /// The output finished playing `source_id`. Finishing the last segment of
    /// the active group moves on to the next group, looping after the last.
    pub fn on_segment_boundary(&mut self, source_id: Uuid) -> Result<(), EngineStartError> {
        self.handle_boundary(source_id).map(|_| ())
    }

    /// Route every boundary the output reported since the last call
    pub fn drain_output_boundaries(&mut self) -> Result<(), EngineStartError> {
        for source_id in self.output.drain_finished() {
            // Anything after a group change belongs to the old schedule
            if self.handle_boundary(source_id)? {
                break;
            }
        }
        Ok(())
    }

    /// Advance the playhead by the wall time since the previous tick
    pub fn tick(&mut self, now: Instant) -> Result<(), EngineStartError> {
        let Some(elapsed) = self.clock.tick(now) else {
            return Ok(());
        };
        if !self.is_playing {
            return Ok(());
        }

        let next = self.timestamp + elapsed;
        if next > self.end_time {
            // Stop at the end; moving on is left to the output's boundary reports
            self.set_timestamp(next);
            self.events.emit(PlaybackEvent::EndOfTimeline);
            return Ok(());
        }
        self.timestamp = next;
        Ok(())
    }

    // ---- internals ----

    /// Returns whether the boundary ended the active group
    fn handle_boundary(&mut self, source_id: Uuid) -> Result<bool, EngineStartError> {
        self.events
            .emit(PlaybackEvent::Boundary(BoundaryId::Source(source_id)));

        let is_last = self
            .active_segments()
            .last()
            .is_some_and(|segment| segment.source_id() == source_id);
        if !is_last {
            return Ok(false);
        }

        log::info!("Group {} finished", self.active_group_index);
        let was_playing = self.is_playing;
        self.finish_group(was_playing)?;
        Ok(true)
    }

    /// Move past the active group: on to the next one, or back to the first
    /// with freshly drawn takes when this was the last.
    fn finish_group(&mut self, resume: bool) -> Result<(), EngineStartError> {
        self.stop();

        if self.active_group_index + 1 < self.groups.len() {
            self.switch_group(self.active_group_index + 1);
        } else {
            if !self.sections.is_empty() {
                self.groups = self.builder.build(&self.sections);
            }
            log::info!("Arrangement finished, looping to the first group");
            self.events.emit(PlaybackEvent::Looped);
            self.switch_group(0);
        }

        if resume { self.play() } else { Ok(()) }
    }

    fn switch_group(&mut self, index: usize) {
        self.active_group_index = index;
        self.timestamp = 0.0;
        self.refresh_end_time();
        self.events.emit(PlaybackEvent::GroupChanged {
            group: index,
            end_time: self.end_time,
        });
    }

    fn refresh_end_time(&mut self) {
        self.end_time = self.active_group().map(SegmentGroup::end_time).unwrap_or(0.0);
    }

    /// Clamped playhead setter. Going past the end stops and rewinds.
    fn set_timestamp(&mut self, value: f64) {
        if value > self.end_time {
            self.stop();
            self.timestamp = 0.0;
            return;
        }
        self.timestamp = value.clamp(0.0, self.end_time);
    }

    /// Silence the output and give back every lease
    fn halt(&mut self) {
        self.output.halt();
        self.leases.clear();
        self.clock.suspend();
        self.is_playing = false;
        log::info!("Playback halted at {:.2}s", self.timestamp);
    }
}

impl Drop for PlaybackEngine {
    fn drop(&mut self) {
        if self.is_playing {
            self.halt();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ResourceAccessError;
    use crate::media::LocationAccess;
    use crate::player::output::ScheduledSegment;
    use crate::player::section::AudioSource;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicIsize, Ordering};

    #[derive(Default)]
    struct Recorded {
        plans: Vec<Vec<ScheduledSegment>>,
        halts: usize,
        finished: Vec<Uuid>,
        fail_next: bool,
    }

    struct FakeOutput(Rc<RefCell<Recorded>>);

    impl AudioOutput for FakeOutput {
        fn schedule(&mut self, plan: &[ScheduledSegment]) -> Result<(), EngineStartError> {
            let mut recorded = self.0.borrow_mut();
            if recorded.fail_next {
                recorded.fail_next = false;
                return Err(EngineStartError::OutputUnavailable("unplugged".into()));
            }
            recorded.plans.push(plan.to_vec());
            Ok(())
        }

        fn halt(&mut self) {
            self.0.borrow_mut().halts += 1;
        }

        fn drain_finished(&mut self) -> Vec<Uuid> {
            std::mem::take(&mut self.0.borrow_mut().finished)
        }
    }

    #[derive(Default)]
    struct CountingAccess {
        open: AtomicIsize,
    }

    impl LocationAccess for CountingAccess {
        fn start_accessing(&self, _location: &Path) -> Result<(), ResourceAccessError> {
            self.open.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn stop_accessing(&self, _location: &Path) {
            self.open.fetch_sub(1, Ordering::SeqCst);
        }
    }

    fn group(title: &str, durations: &[f64]) -> SegmentGroup {
        let mut segments: Vec<Segment> = Vec::new();
        for (i, &duration) in durations.iter().enumerate() {
            let start = segments
                .last()
                .map(|s| s.playback_end_time() - 0.07)
                .unwrap_or(0.0);
            let source = Arc::new(AudioSource::new(format!("{title}-{i}.wav")));
            segments.push(Segment::whole_file(source, duration, start, vec![], 15.0).unwrap());
        }
        SegmentGroup::new(title, segments)
    }

    fn engine() -> (PlaybackEngine, Rc<RefCell<Recorded>>, Arc<CountingAccess>) {
        let recorded = Rc::new(RefCell::new(Recorded::default()));
        let access = Arc::new(CountingAccess::default());
        let builder = TimelineBuilder::new(15.0)
            .with_seed(3)
            .with_access(access.clone());
        let engine = PlaybackEngine::new(builder, Box::new(FakeOutput(recorded.clone())));
        (engine, recorded, access)
    }

    #[test]
    fn test_idle_without_timeline() {
        let (mut engine, recorded, _) = engine();
        assert_eq!(engine.state(), TransportState::Idle);
        assert!(engine.play().is_ok());
        assert!(!engine.is_playing());
        assert!(recorded.borrow().plans.is_empty());
        assert_eq!(engine.end_time(), 0.0);
    }

    #[test]
    fn test_load_sets_end_time() {
        let (mut engine, _, _) = engine();
        engine.load_timeline(vec![group("A", &[5.0, 3.0, 4.0]), group("B", &[2.0])]);
        assert!((engine.end_time() - 11.86).abs() < 1e-9);
        assert_eq!(engine.state(), TransportState::Stopped);
        assert_eq!(engine.now_playing().title, "A");
    }

    #[test]
    fn test_play_schedules_and_leases() {
        let (mut engine, recorded, access) = engine();
        let events = engine.subscribe();
        engine.load_timeline(vec![group("A", &[5.0, 3.0, 4.0])]);

        engine.play().unwrap();
        assert!(engine.is_playing());
        assert_eq!(engine.state(), TransportState::Playing);
        assert_eq!(recorded.borrow().plans[0].len(), 3);
        assert_eq!(access.open.load(Ordering::SeqCst), 3);

        let received: Vec<_> = events.try_iter().collect();
        assert!(received.contains(&PlaybackEvent::Boundary(BoundaryId::FirstTrack)));

        // Playing twice does not schedule twice
        engine.play().unwrap();
        assert_eq!(recorded.borrow().plans.len(), 1);

        engine.stop();
        assert!(!engine.is_playing());
        assert_eq!(access.open.load(Ordering::SeqCst), 0);
        assert_eq!(recorded.borrow().halts, 1);
    }

    #[test]
    fn test_failed_start_leaves_transport_stopped() {
        let (mut engine, recorded, access) = engine();
        engine.load_timeline(vec![group("A", &[1.0])]);
        recorded.borrow_mut().fail_next = true;

        assert!(matches!(
            engine.play(),
            Err(EngineStartError::OutputUnavailable(_))
        ));
        assert!(!engine.is_playing());
        assert_eq!(access.open.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_stop_when_stopped_is_noop() {
        let (mut engine, recorded, _) = engine();
        engine.load_timeline(vec![group("A", &[1.0])]);
        engine.stop();
        engine.stop();
        engine.pause();
        assert!(!engine.is_playing());
        assert_eq!(recorded.borrow().halts, 0);
    }

    #[test]
    fn test_pause_resets_by_default() {
        let (mut engine, _, _) = engine();
        engine.load_timeline(vec![group("A", &[5.0])]);
        engine.seek(2.0).unwrap();
        engine.play().unwrap();
        engine.pause();
        assert_eq!(engine.timestamp(), 0.0);
    }

    #[test]
    fn test_pause_retains_position_when_configured() {
        let (engine, recorded, _) = engine();
        let mut engine = engine.with_stop_policy(StopPolicy::RetainPosition);
        engine.load_timeline(vec![group("A", &[5.0])]);
        engine.seek(2.0).unwrap();
        engine.play().unwrap();
        engine.pause();
        assert_eq!(engine.timestamp(), 2.0);
        assert_eq!(engine.state(), TransportState::Paused);

        engine.play().unwrap();
        assert_eq!(recorded.borrow().plans[1][0].file_offset, 2.0);
    }

    #[test]
    fn test_seek_within_and_beyond() {
        let (mut engine, recorded, _) = engine();
        engine.load_timeline(vec![group("A", &[5.0, 3.0])]);

        engine.seek(6.5).unwrap();
        assert_eq!(engine.timestamp(), 6.5);
        engine.seek(-1.0).unwrap();
        assert_eq!(engine.timestamp(), 0.0);

        engine.play().unwrap();
        engine.seek(5.5).unwrap();
        assert!(engine.is_playing());
        assert_eq!(engine.timestamp(), 5.5);
        // Rescheduled from the new position: only the second segment remains
        assert_eq!(recorded.borrow().plans.last().unwrap().len(), 1);

        engine.seek(100.0).unwrap();
        assert!(!engine.is_playing());
        assert_eq!(engine.timestamp(), 0.0);
    }

    #[test]
    fn test_manual_stepping_is_clamped() {
        let (mut engine, _, _) = engine();
        engine.load_timeline(vec![group("A", &[1.0]), group("B", &[2.0])]);

        engine.previous().unwrap();
        assert_eq!(engine.active_group_index(), 0);

        engine.next().unwrap();
        assert_eq!(engine.active_group_index(), 1);
        assert_eq!(engine.end_time(), 2.0);

        engine.next().unwrap();
        assert_eq!(engine.active_group_index(), 1);
    }

    #[test]
    fn test_stepping_keeps_playing() {
        let (mut engine, recorded, _) = engine();
        engine.load_timeline(vec![group("A", &[1.0]), group("B", &[2.0])]);
        engine.play().unwrap();
        engine.next().unwrap();

        assert!(engine.is_playing());
        assert_eq!(engine.now_playing().title, "B");
        assert_eq!(recorded.borrow().plans.len(), 2);
    }

    #[test]
    fn test_mid_group_boundary_is_noop() {
        let (mut engine, _, _) = engine();
        engine.load_timeline(vec![group("A", &[1.0, 1.0]), group("B", &[1.0])]);
        engine.play().unwrap();

        let first = engine.active_segments()[0].source_id();
        engine.on_segment_boundary(first).unwrap();
        assert_eq!(engine.active_group_index(), 0);
        assert!(engine.is_playing());

        engine.on_segment_boundary(Uuid::new_v4()).unwrap();
        assert_eq!(engine.active_group_index(), 0);
    }

    #[test]
    fn test_last_boundary_advances_group() {
        let (mut engine, recorded, _) = engine();
        engine.load_timeline(vec![group("A", &[1.0, 1.0]), group("B", &[1.0])]);
        engine.play().unwrap();

        let last = engine.active_segments()[1].source_id();
        recorded.borrow_mut().finished.push(last);
        engine.drain_output_boundaries().unwrap();

        assert_eq!(engine.active_group_index(), 1);
        assert!(engine.is_playing());
    }

    #[test]
    fn test_last_group_loops_without_sections() {
        let (mut engine, _, _) = engine();
        let events = engine.subscribe();
        engine.load_timeline(vec![group("A", &[1.0]), group("B", &[2.0])]);
        engine.next().unwrap();

        let last = engine.active_segments()[0].source_id();
        engine.on_segment_boundary(last).unwrap();

        assert_eq!(engine.active_group_index(), 0);
        assert_eq!(engine.end_time(), 1.0);
        assert!(events.try_iter().any(|e| e == PlaybackEvent::Looped));
    }

    #[test]
    fn test_tick_advances_and_overruns() {
        let (mut engine, _, access) = engine();
        let events = engine.subscribe();
        engine.load_timeline(vec![group("A", &[1.0]), group("B", &[2.0])]);
        engine.play().unwrap();

        let start = Instant::now();
        engine.clock.start(start);
        engine.tick(start + Duration::from_millis(500)).unwrap();
        assert!((engine.timestamp() - 0.5).abs() < 1e-9);

        // Running past the end stops in place; the group does not change
        engine.tick(start + Duration::from_millis(1200)).unwrap();
        assert!(events.try_iter().any(|e| e == PlaybackEvent::EndOfTimeline));
        assert_eq!(engine.active_group_index(), 0);
        assert_eq!(engine.timestamp(), 0.0);
        assert!(!engine.is_playing());
        assert_eq!(access.open.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_play_at_end_of_group_stays_stopped() {
        let (mut engine, recorded, access) = engine();
        let events = engine.subscribe();
        engine.load_timeline(vec![group("A", &[1.0])]);

        engine.seek(engine.end_time()).unwrap();
        engine.play().unwrap();

        assert!(!engine.is_playing());
        assert_eq!(engine.timestamp(), 0.0);
        assert!(recorded.borrow().plans.is_empty());
        assert_eq!(access.open.load(Ordering::SeqCst), 0);
        assert!(events.try_iter().any(|e| e == PlaybackEvent::EndOfTimeline));

        // From the rewound playhead the group plays normally
        engine.play().unwrap();
        assert!(engine.is_playing());
        assert_eq!(recorded.borrow().plans.len(), 1);
    }

    #[test]
    fn test_seek_to_end_while_playing_stops() {
        let (mut engine, recorded, access) = engine();
        engine.load_timeline(vec![group("A", &[1.0])]);
        engine.play().unwrap();

        engine.seek(engine.end_time()).unwrap();

        assert!(!engine.is_playing());
        assert_eq!(recorded.borrow().plans.len(), 1);
        assert_eq!(access.open.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_leases_only_for_remaining_segments() {
        let (mut engine, recorded, access) = engine();
        engine.load_timeline(vec![group("A", &[5.0, 3.0, 4.0])]);

        // The first segment ended at 5.0s
        engine.seek(6.0).unwrap();
        engine.play().unwrap();

        assert_eq!(recorded.borrow().plans[0].len(), 2);
        assert_eq!(access.open.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_tick_ignored_while_stopped() {
        let (mut engine, _, _) = engine();
        engine.load_timeline(vec![group("A", &[1.0])]);
        engine.tick(Instant::now() + Duration::from_secs(3)).unwrap();
        assert_eq!(engine.timestamp(), 0.0);
    }

    #[test]
    fn test_current_segment_and_playhead() {
        let (mut engine, _, _) = engine();
        engine.load_timeline(vec![group("A", &[5.0, 3.0])]);
        engine.seek(4.95).unwrap();

        let second = engine.active_segments()[1].source_id();
        assert_eq!(engine.current_segment().unwrap().source_id(), second);
        assert!((engine.playhead_offset(2.0) - 4.95 * 2.0 * 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_remote_commands() {
        let (mut engine, _, _) = engine();
        engine.load_timeline(vec![group("A", &[4.0]), group("B", &[2.0])]);

        engine.handle_command(RemoteCommand::TogglePlayPause).unwrap();
        assert!(engine.is_playing());
        engine.handle_command(RemoteCommand::Play).unwrap();
        assert!(engine.is_playing());
        engine.handle_command(RemoteCommand::Seek(1.5)).unwrap();
        assert_eq!(engine.timestamp(), 1.5);
        engine.handle_command(RemoteCommand::Next).unwrap();
        assert_eq!(engine.active_group_index(), 1);
        engine.handle_command(RemoteCommand::Previous).unwrap();
        assert_eq!(engine.active_group_index(), 0);
        engine.handle_command(RemoteCommand::Pause).unwrap();
        engine.handle_command(RemoteCommand::Pause).unwrap();
        assert!(!engine.is_playing());
        engine.handle_command(RemoteCommand::Stop).unwrap();
        assert_eq!(engine.timestamp(), 0.0);
    }
}
