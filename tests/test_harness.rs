//! Test harness for election replay integration tests.
//!
//! Wraps a controller with a recording sink and pacer so tests can inspect
//! every published frame and every requested pause.

#![allow(dead_code)]

use election_sim::cluster::ClusterController;
use election_sim::config::{ElectionConfig, SimConfig, TopologyConfig};
use election_sim::pacing::RecordingPacer;
use election_sim::random::{RngSource, SequenceSource};
use election_sim::sink::RecordingSink;
use election_sim::topology::{Color, TopologySnapshot, TopologyStore};

/// Seed used for placement when a test scripts election picks.
pub const PLACEMENT_SEED: u64 = 17;

/// Handle to a controller under test
pub struct TestCluster {
    pub controller: ClusterController,
    pub sink: RecordingSink,
    pub pacer: RecordingPacer,
}

impl TestCluster {
    /// Election picks and detection delays come from `picks`; placement is seeded.
    pub fn scripted(picks: Vec<u64>) -> Self {
        let sink = RecordingSink::new();
        let pacer = RecordingPacer::new();
        let topology = TopologyStore::new(
            &TopologyConfig::cluster(),
            Box::new(RngSource::seeded(PLACEMENT_SEED)),
            Box::new(sink.clone()),
        );
        let controller = ClusterController::new(
            topology,
            ElectionConfig::default(),
            Box::new(SequenceSource::new(picks)),
            Box::new(pacer.clone()),
        );
        Self {
            controller,
            sink,
            pacer,
        }
    }

    /// Every random draw derives from `seed`, as the binary does.
    pub fn seeded(seed: u64) -> Self {
        Self::with_config(SimConfig::new(TopologyConfig::cluster()).with_seed(seed))
    }

    pub fn with_config(config: SimConfig) -> Self {
        let sink = RecordingSink::new();
        let pacer = RecordingPacer::new();
        let controller =
            ClusterController::from_config(&config, Box::new(sink.clone()), Box::new(pacer.clone()));
        Self {
            controller,
            sink,
            pacer,
        }
    }

    /// Join nodes in order, panicking if any placement fails
    pub fn join(&mut self, ids: &[&str]) {
        for id in ids {
            self.controller
                .add_node(id)
                .unwrap_or_else(|e| panic!("failed to add {}: {}", id, e));
        }
    }

    pub fn members(&self) -> Vec<String> {
        self.controller.nodes().to_vec()
    }

    pub fn leader(&self) -> Option<String> {
        self.controller.leader().map(str::to_string)
    }

    pub fn frames(&self) -> Vec<TopologySnapshot> {
        self.sink.snapshots()
    }

    pub fn last_frame(&self) -> TopologySnapshot {
        self.sink.last().expect("at least one frame should be published")
    }

    /// Check the controller against its own topology after a command completes.
    pub fn assert_consistent(&self) {
        let members = self.members();
        let frame = self.controller.topology().snapshot();

        assert_eq!(frame.nodes.len(), members.len(), "topology mirrors membership");
        for id in &members {
            assert!(frame.node(id).is_some(), "{} should be drawn", id);
        }

        if let Some(leader) = self.controller.leader() {
            assert!(self.controller.is_member(leader), "leader must be a member");
        } else {
            assert!(members.len() < 2, "two or more members always have a leader");
        }

        assert_leader_colors(&frame, self.controller.leader());
        assert_full_mesh(&frame);
        assert_min_distance(&frame, TopologyConfig::cluster().min_distance);
    }
}

/// The leader is blue, everyone else gray.
pub fn assert_leader_colors(frame: &TopologySnapshot, leader: Option<&str>) {
    for node in &frame.nodes {
        let expected = if Some(node.id.as_str()) == leader {
            Color::blue()
        } else {
            Color::gray()
        };
        assert_eq!(node.color, expected, "unexpected color for {}", node.id);
    }
}

/// Every pair of nodes is connected by exactly one edge.
pub fn assert_full_mesh(frame: &TopologySnapshot) {
    let n = frame.nodes.len();
    assert_eq!(frame.edges.len(), n * n.saturating_sub(1) / 2);
    for (i, a) in frame.nodes.iter().enumerate() {
        for b in &frame.nodes[i + 1..] {
            assert!(frame.has_edge(&a.id, &b.id), "missing edge {}-{}", a.id, b.id);
        }
    }
}

pub fn assert_min_distance(frame: &TopologySnapshot, min_distance: f64) {
    for (i, a) in frame.nodes.iter().enumerate() {
        for b in &frame.nodes[i + 1..] {
            let d = a.position.distance(&b.position);
            assert!(
                d >= min_distance,
                "{} and {} are {} apart, below {}",
                a.id,
                b.id,
                d,
                min_distance
            );
        }
    }
}

/// Frames are numbered 1, 2, 3, ... with no gaps.
pub fn assert_frames_sequential(frames: &[TopologySnapshot]) {
    for (i, frame) in frames.iter().enumerate() {
        assert_eq!(frame.frame, i as u64 + 1, "frame numbers must be contiguous");
    }
}

/// A topology store over `config`, recording into a fresh sink.
pub fn recorded_store(config: &TopologyConfig, seed: u64) -> (TopologyStore, RecordingSink) {
    let sink = RecordingSink::new();
    let store = TopologyStore::new(
        config,
        Box::new(RngSource::seeded(seed)),
        Box::new(sink.clone()),
    );
    (store, sink)
}
