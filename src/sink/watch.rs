use tokio::sync::watch;

use crate::topology::TopologySnapshot;

use super::SnapshotSink;

/// Publishes the latest frame on a watch channel.
///
/// Slow readers only ever see the newest frame, which is what a live
/// dashboard wants.
pub struct WatchSink {
    tx: watch::Sender<TopologySnapshot>,
}

impl WatchSink {
    pub fn new(canvas_size: u32) -> (Self, watch::Receiver<TopologySnapshot>) {
        let (tx, rx) = watch::channel(TopologySnapshot::empty(canvas_size));
        (Self { tx }, rx)
    }

    pub fn subscribe(&self) -> watch::Receiver<TopologySnapshot> {
        self.tx.subscribe()
    }
}

impl SnapshotSink for WatchSink {
    fn publish(&mut self, snapshot: &TopologySnapshot) {
        // send_replace keeps the value even when nobody is subscribed yet
        self.tx.send_replace(snapshot.clone());
    }
}
