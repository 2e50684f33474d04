use crate::config::TopologyConfig;
use crate::random::UniformSource;

use super::snapshot::Position;

/// Picks canvas positions that keep every pair of nodes at least
/// `min_distance` apart.
#[derive(Debug, Clone)]
pub struct PlacementAllocator {
    canvas_size: u32,
    min_distance: f64,
    max_attempts: u32,
}

impl PlacementAllocator {
    pub fn new(config: &TopologyConfig) -> Self {
        Self {
            canvas_size: config.canvas_size,
            min_distance: config.min_distance,
            max_attempts: config.max_placement_attempts,
        }
    }

    pub fn canvas_size(&self) -> u32 {
        self.canvas_size
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Samples integer points in `[1, canvas_size - 1]²` until one clears every
    /// existing position.
    ///
    /// Returns `None` when `max_attempts` samples were all rejected, or when
    /// the canvas has no interior points at all.
    pub fn allocate(
        &self,
        existing: &[Position],
        source: &mut dyn UniformSource,
    ) -> Option<Position> {
        if self.canvas_size < 2 {
            return None;
        }
        let high = u64::from(self.canvas_size - 1);

        for attempt in 1..=self.max_attempts {
            let candidate = Position::new(
                source.between(1, high) as f64,
                source.between(1, high) as f64,
            );
            if !self.is_too_close(&candidate, existing) {
                tracing::trace!(attempt, x = candidate.x, y = candidate.y, "Placed node");
                return Some(candidate);
            }
        }

        None
    }

    fn is_too_close(&self, candidate: &Position, existing: &[Position]) -> bool {
        existing
            .iter()
            .any(|p| candidate.distance(p) < self.min_distance)
    }
}
