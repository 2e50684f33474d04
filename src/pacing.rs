use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::random::UniformSource;

/// Blocking pauses that pace a replay.
///
/// A pause cannot be interrupted once started; it only exists so the
/// visualization has time to show each step.
pub trait Pacer: Send {
    fn pause(&mut self, duration: Duration);
}

/// Sleeps the current thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SleepPacer;

impl Pacer for SleepPacer {
    fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

/// Skips every pause.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoPause;

impl Pacer for NoPause {
    fn pause(&mut self, _duration: Duration) {}
}

/// Records requested pauses without sleeping. Clones share the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingPacer {
    pauses: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingPacer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pauses(&self) -> Vec<Duration> {
        self.pauses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Pacer for RecordingPacer {
    fn pause(&mut self, duration: Duration) {
        self.pauses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
    }
}

/// Draws the delay before a failed leader is noticed.
pub fn detection_delay(source: &mut dyn UniformSource, min_ms: u64, max_ms: u64) -> Duration {
    Duration::from_millis(source.between(min_ms, max_ms))
}
