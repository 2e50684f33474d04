use std::time::Duration;

use crate::pacing::{NoPause, Pacer, SleepPacer};

/// Canvas used by plain topology replays.
pub const DEFAULT_CANVAS_SIZE: u32 = 20;

/// Cluster replays get a larger canvas so a dozen members still fit.
pub const CLUSTER_CANVAS_SIZE: u32 = 40;

pub const DEFAULT_MIN_DISTANCE: f64 = 3.0;

const DEFAULT_MAX_PLACEMENT_ATTEMPTS: u32 = 10_000;

/// Geometry of the replay canvas and the placement rules applied to new nodes.
#[derive(Debug, Clone)]
pub struct TopologyConfig {
    /// Side length of the square canvas. Positions are drawn from `[1, canvas_size - 1]`.
    pub canvas_size: u32,
    /// Minimum Euclidean distance between any two node positions.
    pub min_distance: f64,
    /// Upper bound on rejected samples before placement gives up.
    pub max_placement_attempts: u32,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            canvas_size: DEFAULT_CANVAS_SIZE,
            min_distance: DEFAULT_MIN_DISTANCE,
            max_placement_attempts: DEFAULT_MAX_PLACEMENT_ATTEMPTS,
        }
    }
}

impl TopologyConfig {
    pub fn new(canvas_size: u32, min_distance: f64) -> Self {
        Self {
            canvas_size,
            min_distance,
            ..Default::default()
        }
    }

    /// Configuration used when the topology backs a simulated cluster.
    pub fn cluster() -> Self {
        Self::new(CLUSTER_CANVAS_SIZE, DEFAULT_MIN_DISTANCE)
    }

    pub fn with_max_placement_attempts(mut self, attempts: u32) -> Self {
        self.max_placement_attempts = attempts;
        self
    }
}

/// Timing of the election state machine.
#[derive(Debug, Clone)]
pub struct ElectionConfig {
    /// Pause while every node is marked as voting.
    pub deliberation_ms: u64,
    /// Bounds of the randomized pause before a lost leader is noticed.
    pub detection_delay_min_ms: u64,
    pub detection_delay_max_ms: u64,
}

impl Default for ElectionConfig {
    fn default() -> Self {
        Self {
            deliberation_ms: 1300,
            detection_delay_min_ms: 1000,
            detection_delay_max_ms: 3000,
        }
    }
}

impl ElectionConfig {
    pub fn deliberation(&self) -> Duration {
        Duration::from_millis(self.deliberation_ms)
    }
}

/// Pacing of the replay itself.
#[derive(Debug, Clone)]
pub struct ReplayConfig {
    /// Pause applied once the command stream is exhausted.
    pub final_delay_ms: u64,
    /// Pause applied after every published frame so a viewer can follow along.
    /// Zero disables frame pacing.
    pub frame_pause_ms: u64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            final_delay_ms: 3000,
            frame_pause_ms: 500,
        }
    }
}

impl ReplayConfig {
    pub fn final_delay(&self) -> Duration {
        Duration::from_millis(self.final_delay_ms)
    }

    pub fn frame_pause(&self) -> Duration {
        Duration::from_millis(self.frame_pause_ms)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SimConfig {
    pub topology: TopologyConfig,
    pub election: ElectionConfig,
    pub replay: ReplayConfig,
    /// Seed for every random source. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Skip script `sleep` lines too, not just the timed pauses above.
    pub skip_pauses: bool,
}

impl SimConfig {
    pub fn new(topology: TopologyConfig) -> Self {
        Self {
            topology,
            ..Default::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Zero every pause so a replay runs as fast as the sink can consume it.
    pub fn without_pauses(mut self) -> Self {
        self.election.deliberation_ms = 0;
        self.election.detection_delay_min_ms = 0;
        self.election.detection_delay_max_ms = 0;
        self.replay.final_delay_ms = 0;
        self.replay.frame_pause_ms = 0;
        self.skip_pauses = true;
        self
    }

    /// Pacer for replays built from this configuration.
    pub fn pacer(&self) -> Box<dyn Pacer> {
        if self.skip_pauses {
            Box::new(NoPause)
        } else {
            Box::new(SleepPacer)
        }
    }
}
