//! Node, edge, position and color state of the replayed cluster.
//!
//! - [`TopologyStore`]: owns the graph and publishes a snapshot per visible change
//! - [`PlacementAllocator`]: keeps new nodes at least a minimum distance apart
//! - [`TopologySnapshot`]: the frame handed to a [`crate::sink::SnapshotSink`]

pub mod color;
pub mod placement;
pub mod snapshot;
pub mod store;

/// Nodes are identified by their display name.
pub type NodeId = String;

pub use color::{Color, ColorTarget};
pub use placement::PlacementAllocator;
pub use snapshot::{EdgeView, NodeView, Position, TopologySnapshot};
pub use store::{EdgeKey, TopologyStore};
