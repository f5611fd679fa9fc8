//! Multi-segment playback: sections of alternate takes built into timelines
//! and played back as one continuous stream per section.

pub mod clock;
pub mod engine;
pub mod events;
pub mod output;
pub mod section;
pub mod segment;
pub mod timeline;
pub mod waveform;

#[cfg(feature = "player")]
pub mod app;
#[cfg(feature = "player")]
pub mod audio;

pub use engine::{PlaybackEngine, StopPolicy, TransportState};
pub use events::{BoundaryId, NowPlaying, PlaybackEvent, RemoteCommand};
pub use output::{AudioOutput, ScheduledSegment, SilentOutput};
pub use section::{AudioSource, Section, Track, TrackItem};
pub use segment::Segment;
pub use timeline::{SegmentGroup, TimelineBuilder};
