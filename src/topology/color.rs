use serde::{Deserialize, Serialize};

use super::NodeId;

/// A display color, kept as the name the visualization understands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Resting node color.
    pub fn gray() -> Self {
        Self::new("gray")
    }

    /// Default edge color.
    pub fn black() -> Self {
        Self::new("black")
    }

    /// Marks nodes taking part in an election.
    pub fn yellow() -> Self {
        Self::new("yellow")
    }

    /// Marks the leader.
    pub fn blue() -> Self {
        Self::new("blue")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Color {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for Color {
    fn from(name: String) -> Self {
        Self(name)
    }
}

/// Which nodes a recolor applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorTarget {
    /// Every node in the topology.
    All,
    /// Every node except the named one.
    AllExcept(NodeId),
    /// A single node.
    Single(NodeId),
}

impl ColorTarget {
    /// Reads the textual form used by command scripts: `all`, `all-<id>` or `<id>`.
    ///
    /// Everything after the first `all-` is the excluded id, so ids containing
    /// dashes survive. A node literally named `all` cannot be targeted alone.
    pub fn parse(text: &str) -> Self {
        if text == "all" {
            return ColorTarget::All;
        }
        match text.strip_prefix("all-") {
            Some(excluded) if !excluded.is_empty() => ColorTarget::AllExcept(excluded.to_string()),
            _ => ColorTarget::Single(text.to_string()),
        }
    }

    /// Whether `node` is recolored by this target.
    pub fn includes(&self, node: &str) -> bool {
        match self {
            ColorTarget::All => true,
            ColorTarget::AllExcept(excluded) => excluded != node,
            ColorTarget::Single(id) => id == node,
        }
    }
}

impl std::fmt::Display for ColorTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColorTarget::All => write!(f, "all"),
            ColorTarget::AllExcept(id) => write!(f, "all-{}", id),
            ColorTarget::Single(id) => write!(f, "{}", id),
        }
    }
}
