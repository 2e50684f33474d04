use std::time::Duration;

use crate::command::ClusterCommand;
use crate::config::{ElectionConfig, SimConfig};
use crate::error::Result;
use crate::pacing::{detection_delay, Pacer};
use crate::random::{source_for, UniformSource, ELECTION_STREAM, PLACEMENT_STREAM};
use crate::sink::SnapshotSink;
use crate::topology::{Color, ColorTarget, NodeId, TopologyStore};

use super::state::{ClusterPhase, ClusterStatus};

/// The election and failure state machine.
///
/// Every transition is mirrored onto the [`TopologyStore`], so the snapshot
/// stream tells the whole story: members join fully meshed, an election
/// paints everyone yellow, the winner turns blue, failures remove nodes.
///
/// # Transitions
///
/// - The second member joining triggers the first election.
/// - Killing the leader clears it and triggers a new election.
/// - When a kill leaves a single member, that member is promoted directly.
/// - The last member can never be killed.
pub struct ClusterController {
    topology: TopologyStore,
    nodes: Vec<NodeId>,
    leader: Option<NodeId>,
    source: Box<dyn UniformSource>,
    pacer: Box<dyn Pacer>,
    config: ElectionConfig,
}

impl ClusterController {
    pub fn new(
        topology: TopologyStore,
        config: ElectionConfig,
        source: Box<dyn UniformSource>,
        pacer: Box<dyn Pacer>,
    ) -> Self {
        Self {
            topology,
            nodes: Vec::new(),
            leader: None,
            source,
            pacer,
            config,
        }
    }

    /// Assemble a controller whose placement and election draws both derive
    /// from `config.seed`.
    pub fn from_config(
        config: &SimConfig,
        sink: Box<dyn SnapshotSink>,
        pacer: Box<dyn Pacer>,
    ) -> Self {
        let topology = TopologyStore::new(
            &config.topology,
            source_for(config.seed, PLACEMENT_STREAM),
            sink,
        );
        Self::new(
            topology,
            config.election.clone(),
            source_for(config.seed, ELECTION_STREAM),
            pacer,
        )
    }

    /// Join a node and connect it to every existing member.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::SimError::CapacityExceeded`] from placement; the
    /// node is then not a member.
    pub fn add_node(&mut self, id: &str) -> Result<()> {
        if self.is_member(id) {
            tracing::debug!(node = %id, "Node already a member, ignoring");
            return Ok(());
        }

        self.topology.add_node(id)?;
        self.topology.complete_edges_for(id);
        self.nodes.push(id.to_string());
        tracing::info!(node = %id, members = self.nodes.len(), "Node joined");

        if self.nodes.len() == 2 {
            self.start_election();
        }
        Ok(())
    }

    /// Pick a new leader uniformly among the current members.
    pub fn start_election(&mut self) {
        if self.nodes.len() < 2 {
            tracing::debug!(members = self.nodes.len(), "Not enough members for an election");
            return;
        }

        tracing::info!(members = self.nodes.len(), "Starting election");
        self.topology.set_color(&ColorTarget::All, Color::yellow());
        self.pacer.pause(self.config.deliberation());

        let winner = self.nodes[self.source.pick_index(self.nodes.len())].clone();
        tracing::info!(leader = %winner, "Election won");

        self.topology
            .set_color(&ColorTarget::Single(winner.clone()), Color::blue());
        self.topology
            .set_color(&ColorTarget::AllExcept(winner.clone()), Color::gray());
        self.leader = Some(winner);
    }

    /// Remove a member, repairing leadership if needed.
    pub fn kill_node(&mut self, id: &str) {
        if !self.is_member(id) {
            tracing::debug!(node = %id, "Node not a member, nothing to kill");
            return;
        }
        if self.nodes.len() == 1 {
            tracing::debug!(node = %id, "Refusing to kill the last member");
            return;
        }

        self.topology.remove_node(id);
        self.nodes.retain(|n| n != id);
        tracing::info!(node = %id, members = self.nodes.len(), "Node killed");

        let was_leader = self.leader.as_deref() == Some(id);
        if was_leader {
            tracing::info!(node = %id, "Leader lost");
            self.leader = None;
        }

        if self.nodes.len() == 1 {
            self.promote_sole_survivor();
        } else if was_leader {
            self.start_election();
        }
    }

    /// Kill whoever currently leads, after a randomized detection delay.
    pub fn kill_leader(&mut self) {
        let Some(leader) = self.leader.clone() else {
            tracing::debug!("No leader to kill");
            return;
        };

        let delay = detection_delay(
            self.source.as_mut(),
            self.config.detection_delay_min_ms,
            self.config.detection_delay_max_ms,
        );
        tracing::info!(leader = %leader, delay_ms = delay.as_millis() as u64, "Killing leader");
        self.pacer.pause(delay);
        self.kill_node(&leader);
    }

    /// Dispatch a parsed command.
    pub fn apply(&mut self, command: &ClusterCommand) -> Result<()> {
        match command {
            ClusterCommand::New(id) => self.add_node(id)?,
            ClusterCommand::Election => self.start_election(),
            ClusterCommand::Kill(id) => self.kill_node(id),
            ClusterCommand::KillLeader => self.kill_leader(),
        }
        Ok(())
    }

    /// Block for `duration` using the controller's pacer.
    pub fn wait(&mut self, duration: Duration) {
        self.pacer.pause(duration);
    }

    /// Members in join order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    pub fn leader(&self) -> Option<&str> {
        self.leader.as_deref()
    }

    pub fn is_member(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n == id)
    }

    pub fn phase(&self) -> ClusterPhase {
        ClusterPhase::derive(&self.nodes, self.leader())
    }

    pub fn status(&self) -> ClusterStatus {
        ClusterStatus {
            nodes: self.nodes.clone(),
            leader: self.leader.clone(),
            phase: self.phase(),
        }
    }

    pub fn topology(&self) -> &TopologyStore {
        &self.topology
    }

    /// Flush the snapshot sink at the end of a replay.
    pub fn finish(&mut self) {
        self.topology.finish();
    }

    fn promote_sole_survivor(&mut self) {
        let survivor = self.nodes[0].clone();
        tracing::info!(leader = %survivor, "Sole survivor promoted to leader");
        self.topology
            .set_color(&ColorTarget::Single(survivor.clone()), Color::blue());
        self.leader = Some(survivor);
    }
}
