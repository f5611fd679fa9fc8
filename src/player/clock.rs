//! Coarse transport clock that moves the playhead while audio is playing.
//!
//! The clock is polled by whoever owns the engine, roughly every
//! [`TransportClock::interval`]. It only measures wall time between polls;
//! the output layer decides where audio actually is. While suspended it keeps
//! no reference point, so time spent stopped never leaks into the playhead.

use crate::constants::DEFAULT_TICK_INTERVAL_MS;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
pub struct TransportClock {
    interval: Duration,
    last_tick: Option<Instant>,
}

impl Default for TransportClock {
    fn default() -> Self {
        Self::new(Duration::from_millis(DEFAULT_TICK_INTERVAL_MS))
    }
}

impl TransportClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_tick: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_running(&self) -> bool {
        self.last_tick.is_some()
    }

    pub fn start(&mut self, now: Instant) {
        self.last_tick = Some(now);
    }

    pub fn suspend(&mut self) {
        self.last_tick = None;
    }

    /// Seconds elapsed since the previous tick, or `None` while suspended
    pub fn tick(&mut self, now: Instant) -> Option<f64> {
        let last = self.last_tick?;
        let elapsed = now.saturating_duration_since(last).as_secs_f64();
        self.last_tick = Some(now);
        Some(elapsed)
    }

    /// How long the owner may sleep before the next tick is due
    pub fn time_until_next_tick(&self, now: Instant) -> Duration {
        match self.last_tick {
            Some(last) => self
                .interval
                .saturating_sub(now.saturating_duration_since(last)),
            None => self.interval,
        }
    }
}
