//! Consumers of topology snapshots.
//!
//! The store pushes one [`TopologySnapshot`] per visible change and never
//! reads anything back. Sinks decide what a frame turns into:
//!
//! - [`JsonLinesSink`]: one JSON object per line, for external renderers
//! - [`TableSink`]: a readable text frame
//! - [`WatchSink`]: the latest frame on a `tokio::sync::watch` channel (dashboard)
//! - [`RecordingSink`]: an in-memory log, mostly for tests
//! - [`FanoutSink`] and [`PacedSink`]: composition

pub mod json;
pub mod table;
pub mod watch;

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::pacing::Pacer;
use crate::topology::TopologySnapshot;

pub use json::JsonLinesSink;
pub use table::TableSink;
pub use watch::WatchSink;

pub trait SnapshotSink: Send {
    fn publish(&mut self, snapshot: &TopologySnapshot);

    /// Called once when the replay ends.
    fn finish(&mut self) {}
}

impl<S: SnapshotSink + ?Sized> SnapshotSink for Box<S> {
    fn publish(&mut self, snapshot: &TopologySnapshot) {
        (**self).publish(snapshot);
    }

    fn finish(&mut self) {
        (**self).finish();
    }
}

/// Discards every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl SnapshotSink for NullSink {
    fn publish(&mut self, _snapshot: &TopologySnapshot) {}
}

/// Keeps every frame in memory. Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    frames: Arc<Mutex<Vec<TopologySnapshot>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<TopologySnapshot> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last(&self) -> Option<TopologySnapshot> {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SnapshotSink for RecordingSink {
    fn publish(&mut self, snapshot: &TopologySnapshot) {
        self.frames
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(snapshot.clone());
    }
}

/// Forwards every frame to several sinks, in order.
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Box<dyn SnapshotSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: impl SnapshotSink + 'static) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl SnapshotSink for FanoutSink {
    fn publish(&mut self, snapshot: &TopologySnapshot) {
        for sink in &mut self.sinks {
            sink.publish(snapshot);
        }
    }

    fn finish(&mut self) {
        for sink in &mut self.sinks {
            sink.finish();
        }
    }
}

/// Pauses after each frame so a viewer can follow the replay.
pub struct PacedSink<S> {
    inner: S,
    pacer: Box<dyn Pacer>,
    pause: Duration,
}

impl<S: SnapshotSink> PacedSink<S> {
    pub fn new(inner: S, pacer: Box<dyn Pacer>, pause: Duration) -> Self {
        Self {
            inner,
            pacer,
            pause,
        }
    }
}

impl<S: SnapshotSink> SnapshotSink for PacedSink<S> {
    fn publish(&mut self, snapshot: &TopologySnapshot) {
        self.inner.publish(snapshot);
        self.pacer.pause(self.pause);
    }

    fn finish(&mut self) {
        self.inner.finish();
    }
}
