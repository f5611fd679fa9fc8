//! Notifications published by the playback engine and commands it accepts
//! from outside (UI buttons, OS media-remote centres).

use crate::constants::FIRST_TRACK_SENTINEL;
use std::fmt;
use std::sync::mpsc;
use uuid::Uuid;

/// Which track a boundary notification refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryId {
    /// Playback (re)started at the head of the active group
    FirstTrack,
    /// The segment playing this source just finished
    Source(Uuid),
}

impl fmt::Display for BoundaryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BoundaryId::FirstTrack => f.write_str(FIRST_TRACK_SENTINEL),
            BoundaryId::Source(id) => write!(f, "{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    TimelineLoaded { groups: usize, end_time: f64 },
    Started { group: usize, timestamp: f64 },
    Stopped { timestamp: f64 },
    Boundary(BoundaryId),
    GroupChanged { group: usize, end_time: f64 },
    /// The playhead ran past the end of the active group
    EndOfTimeline,
    /// The last group finished and the arrangement was rebuilt from the top
    Looped,
}

/// Metadata for now-playing displays
#[derive(Debug, Clone, PartialEq)]
pub struct NowPlaying {
    pub title: String,
    pub elapsed: f64,
    pub duration: f64,
    pub is_playing: bool,
}

/// Transport commands accepted from UI buttons and remote-control centres.
/// Every command is safe to repeat.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RemoteCommand {
    Play,
    Pause,
    TogglePlayPause,
    Stop,
    Next,
    Previous,
    Seek(f64),
}

/// Fan-out of engine events to any number of subscribers.
#[derive(Debug, Default)]
pub struct EventBus {
    subscribers: Vec<mpsc::Sender<PlaybackEvent>>,
}

impl EventBus {
    pub fn subscribe(&mut self) -> mpsc::Receiver<PlaybackEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver to every live subscriber, dropping the ones that hung up
    pub fn emit(&mut self, event: PlaybackEvent) {
        log::debug!("Event: {event:?}");
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
