use serde::{Deserialize, Serialize};

use crate::topology::NodeId;

/// Where the cluster stands, derived from its members and leader.
///
/// Elections are transient and finish inside a single command, so there is
/// no observable "electing" phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "leader", rename_all = "snake_case")]
pub enum ClusterPhase {
    /// No members.
    Empty,
    /// Members present but no leader elected yet.
    Forming,
    /// Two or more members with an elected leader.
    Stable(NodeId),
    /// A single member left after failures, promoted to leader.
    SoleSurvivor(NodeId),
}

impl ClusterPhase {
    pub fn derive(members: &[NodeId], leader: Option<&str>) -> Self {
        match (members.len(), leader) {
            (0, _) => ClusterPhase::Empty,
            (_, None) => ClusterPhase::Forming,
            (1, Some(leader)) => ClusterPhase::SoleSurvivor(leader.to_string()),
            (_, Some(leader)) => ClusterPhase::Stable(leader.to_string()),
        }
    }

    pub fn leader(&self) -> Option<&str> {
        match self {
            ClusterPhase::Stable(leader) | ClusterPhase::SoleSurvivor(leader) => Some(leader),
            ClusterPhase::Empty | ClusterPhase::Forming => None,
        }
    }
}

impl std::fmt::Display for ClusterPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClusterPhase::Empty => write!(f, "empty"),
            ClusterPhase::Forming => write!(f, "forming"),
            ClusterPhase::Stable(leader) => write!(f, "stable (leader {})", leader),
            ClusterPhase::SoleSurvivor(leader) => write!(f, "sole survivor ({})", leader),
        }
    }
}

/// Point-in-time view of the cluster membership.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterStatus {
    pub nodes: Vec<NodeId>,
    pub leader: Option<NodeId>,
    pub phase: ClusterPhase,
}
