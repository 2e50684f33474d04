use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::error::{Result, SimError};

use super::parse::ClusterCommand;

/// Relative weights of generated actions. Elections are never generated
/// directly; they follow from joins and leader kills.
const ACTION_WEIGHTS: [(Action, f64); 3] = [
    (Action::New, 0.5),
    (Action::Kill, 0.3),
    (Action::KillLeader, 0.2),
];

#[derive(Debug, Clone, Copy)]
enum Action {
    New,
    Kill,
    KillLeader,
}

/// Randomized churn: a few initial members, then a stream of joins and kills
/// over a bounded pool of node names.
#[derive(Debug, Clone)]
pub struct RandomScenario {
    /// Number of generated commands after the initial members.
    pub commands: usize,
    /// Node names are drawn from `node1..=node<max_nodes>`.
    pub max_nodes: usize,
    /// Members added before any random command.
    pub initial_nodes: usize,
}

impl Default for RandomScenario {
    fn default() -> Self {
        Self {
            commands: 50,
            max_nodes: 10,
            initial_nodes: 4,
        }
    }
}

impl RandomScenario {
    pub fn new(commands: usize, max_nodes: usize) -> Self {
        Self {
            commands,
            max_nodes,
            ..Default::default()
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Vec<ClusterCommand>> {
        let weights = WeightedIndex::new(ACTION_WEIGHTS.iter().map(|(_, w)| *w))
            .map_err(|e| SimError::Internal(format!("invalid action weights: {}", e)))?;
        let max_nodes = self.max_nodes.max(1);

        let mut commands: Vec<ClusterCommand> = (1..=self.initial_nodes)
            .map(|i| ClusterCommand::New(node_name(i)))
            .collect();

        for _ in 0..self.commands {
            let (action, _) = ACTION_WEIGHTS[weights.sample(rng)];
            let node = node_name(rng.gen_range(1..=max_nodes));
            commands.push(match action {
                Action::New => ClusterCommand::New(node),
                Action::Kill => ClusterCommand::Kill(node),
                Action::KillLeader => ClusterCommand::KillLeader,
            });
        }

        Ok(commands)
    }
}

fn node_name(index: usize) -> String {
    format!("node{}", index)
}
