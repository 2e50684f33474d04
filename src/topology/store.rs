use chrono::Utc;
use indexmap::IndexMap;

use crate::config::TopologyConfig;
use crate::error::{Result, SimError};
use crate::random::UniformSource;
use crate::sink::SnapshotSink;

use super::color::{Color, ColorTarget};
use super::placement::PlacementAllocator;
use super::snapshot::{EdgeView, NodeView, Position, TopologySnapshot};
use super::NodeId;

#[derive(Debug, Clone)]
struct NodeRecord {
    position: Position,
    color: Color,
}

/// Undirected edge key. Endpoints are stored in sorted order so `(a, b)` and
/// `(b, a)` name the same edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    low: NodeId,
    high: NodeId,
}

impl EdgeKey {
    pub fn new(a: &str, b: &str) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self {
            low: low.to_string(),
            high: high.to_string(),
        }
    }

    pub fn touches(&self, node: &str) -> bool {
        self.low == node || self.high == node
    }

    pub fn endpoints(&self) -> (&str, &str) {
        (&self.low, &self.high)
    }
}

/// Owns every node position, node color and edge of the replayed topology.
///
/// Each mutating call that changes what the visualization should show
/// publishes exactly one [`TopologySnapshot`] to the sink. Operations naming
/// nodes that do not exist are silent no-ops.
pub struct TopologyStore {
    nodes: IndexMap<NodeId, NodeRecord>,
    edges: IndexMap<EdgeKey, Color>,
    placement: PlacementAllocator,
    source: Box<dyn UniformSource>,
    sink: Box<dyn SnapshotSink>,
    frame: u64,
}

impl TopologyStore {
    pub fn new(
        config: &TopologyConfig,
        source: Box<dyn UniformSource>,
        sink: Box<dyn SnapshotSink>,
    ) -> Self {
        Self {
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            placement: PlacementAllocator::new(config),
            source,
            sink,
            frame: 0,
        }
    }

    /// Insert a gray node at a freshly allocated position.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CapacityExceeded`] when no position satisfying the
    /// minimum distance was found. The store is left unchanged.
    pub fn add_node(&mut self, id: &str) -> Result<()> {
        if self.nodes.contains_key(id) {
            tracing::debug!(node = %id, "Node already present, ignoring");
            return Ok(());
        }

        let existing: Vec<Position> = self.nodes.values().map(|n| n.position).collect();
        let position = self
            .placement
            .allocate(&existing, self.source.as_mut())
            .ok_or_else(|| SimError::CapacityExceeded {
                node: id.to_string(),
                attempts: self.placement.max_attempts(),
            })?;

        self.nodes.insert(
            id.to_string(),
            NodeRecord {
                position,
                color: Color::gray(),
            },
        );
        tracing::debug!(node = %id, x = position.x, y = position.y, "Node added");
        self.emit();
        Ok(())
    }

    /// Remove a node together with every edge touching it.
    pub fn remove_node(&mut self, id: &str) {
        if self.nodes.shift_remove(id).is_none() {
            tracing::debug!(node = %id, "Node not present, nothing to remove");
            return;
        }
        self.edges.retain(|edge, _| !edge.touches(id));
        tracing::debug!(node = %id, "Node removed");
        self.emit();
    }

    /// Connect two existing, distinct nodes with a black edge.
    ///
    /// `emit` is false when the caller batches several edges into one frame.
    pub fn add_edge(&mut self, a: &str, b: &str, emit: bool) {
        if a == b || !self.nodes.contains_key(a) || !self.nodes.contains_key(b) {
            tracing::debug!(source = %a, target = %b, "Edge endpoints invalid, ignoring");
            return;
        }
        self.edges
            .entry(EdgeKey::new(a, b))
            .or_insert_with(Color::black);
        if emit {
            self.emit();
        }
    }

    /// Connect `id` to every other node, publishing a single frame.
    pub fn complete_edges_for(&mut self, id: &str) {
        if !self.nodes.contains_key(id) {
            tracing::debug!(node = %id, "Node not present, no edges to complete");
            return;
        }
        let others: Vec<NodeId> = self
            .nodes
            .keys()
            .filter(|other| other.as_str() != id)
            .cloned()
            .collect();
        for other in &others {
            self.add_edge(other, id, false);
        }
        self.emit();
    }

    /// Recolor the nodes selected by `target`.
    pub fn set_color(&mut self, target: &ColorTarget, color: Color) {
        if let ColorTarget::Single(id) = target {
            if !self.nodes.contains_key(id) {
                tracing::debug!(node = %id, "Color target not present, ignoring");
                return;
            }
        }
        for (id, record) in self.nodes.iter_mut() {
            if target.includes(id) {
                record.color = color.clone();
            }
        }
        self.emit();
    }

    pub fn contains(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node ids in insertion order.
    pub fn node_ids(&self) -> impl Iterator<Item = &str> {
        self.nodes.keys().map(String::as_str)
    }

    pub fn position(&self, id: &str) -> Option<Position> {
        self.nodes.get(id).map(|n| n.position)
    }

    pub fn color(&self, id: &str) -> Option<&Color> {
        self.nodes.get(id).map(|n| &n.color)
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.edges.contains_key(&EdgeKey::new(a, b))
    }

    pub fn edge_color(&self, a: &str, b: &str) -> Option<&Color> {
        self.edges.get(&EdgeKey::new(a, b))
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeKey> {
        self.edges.keys()
    }

    /// Number of frames published so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn canvas_size(&self) -> u32 {
        self.placement.canvas_size()
    }

    /// Current state, stamped with the most recent frame number.
    pub fn snapshot(&self) -> TopologySnapshot {
        TopologySnapshot {
            frame: self.frame,
            captured_at: Utc::now(),
            canvas_size: self.placement.canvas_size(),
            nodes: self
                .nodes
                .iter()
                .map(|(id, record)| NodeView {
                    id: id.clone(),
                    position: record.position,
                    color: record.color.clone(),
                })
                .collect(),
            edges: self
                .edges
                .iter()
                .map(|(key, color)| {
                    let (source, target) = key.endpoints();
                    EdgeView {
                        source: source.to_string(),
                        target: target.to_string(),
                        color: color.clone(),
                    }
                })
                .collect(),
        }
    }

    /// Flush the sink once the replay is over.
    pub fn finish(&mut self) {
        self.sink.finish();
    }

    fn emit(&mut self) {
        self.frame += 1;
        let snapshot = self.snapshot();
        tracing::trace!(
            frame = snapshot.frame,
            nodes = snapshot.nodes.len(),
            edges = snapshot.edges.len(),
            "Publishing snapshot"
        );
        self.sink.publish(&snapshot);
    }
}

impl std::fmt::Debug for TopologyStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TopologyStore")
            .field("nodes", &self.nodes.len())
            .field("edges", &self.edges.len())
            .field("frame", &self.frame)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::RngSource;
    use crate::sink::RecordingSink;

    fn store_with_sink() -> (TopologyStore, RecordingSink) {
        let sink = RecordingSink::new();
        let store = TopologyStore::new(
            &TopologyConfig::default(),
            Box::new(RngSource::seeded(5)),
            Box::new(sink.clone()),
        );
        (store, sink)
    }

    #[test]
    fn test_edge_key_is_unordered() {
        assert_eq!(EdgeKey::new("a", "b"), EdgeKey::new("b", "a"));
        assert!(EdgeKey::new("b", "a").touches("a"));
        assert_eq!(EdgeKey::new("b", "a").endpoints(), ("a", "b"));
    }

    #[test]
    fn test_add_node_defaults_to_gray() {
        let (mut store, sink) = store_with_sink();
        store.add_node("n1").unwrap();

        assert!(store.contains("n1"));
        assert_eq!(store.color("n1"), Some(&Color::gray()));
        assert!(store.position("n1").is_some());
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_add_node_twice_is_noop() {
        let (mut store, sink) = store_with_sink();
        store.add_node("n1").unwrap();
        let position = store.position("n1");
        store.add_node("n1").unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.position("n1"), position);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_add_edge_requires_both_endpoints() {
        let (mut store, sink) = store_with_sink();
        store.add_node("a").unwrap();
        store.add_edge("a", "ghost", true);
        store.add_edge("a", "a", true);

        assert_eq!(store.edge_count(), 0);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_add_edge_emit_flag() {
        let (mut store, sink) = store_with_sink();
        store.add_node("a").unwrap();
        store.add_node("b").unwrap();
        store.add_node("c").unwrap();

        store.add_edge("a", "b", false);
        assert_eq!(sink.len(), 3);
        store.add_edge("b", "c", true);
        assert_eq!(sink.len(), 4);
        assert_eq!(store.edge_color("c", "b"), Some(&Color::black()));
    }

    #[test]
    fn test_complete_edges_for_emits_once() {
        let (mut store, sink) = store_with_sink();
        for id in ["a", "b", "c", "d"] {
            store.add_node(id).unwrap();
        }
        let before = sink.len();
        store.complete_edges_for("d");

        assert_eq!(sink.len(), before + 1);
        assert_eq!(store.edge_count(), 3);
        for other in ["a", "b", "c"] {
            assert!(store.has_edge(other, "d"));
        }
    }

    #[test]
    fn test_complete_edges_for_missing_node() {
        let (mut store, sink) = store_with_sink();
        store.add_node("a").unwrap();
        store.complete_edges_for("ghost");
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_remove_node_purges_edges() {
        let (mut store, _sink) = store_with_sink();
        for id in ["a", "b", "c"] {
            store.add_node(id).unwrap();
            store.complete_edges_for(id);
        }
        assert_eq!(store.edge_count(), 3);

        store.remove_node("b");
        assert!(!store.contains("b"));
        assert_eq!(store.edge_count(), 1);
        assert!(store.has_edge("a", "c"));
        assert!(store.edges().all(|e| !e.touches("b")));
    }

    #[test]
    fn test_remove_missing_node_is_silent() {
        let (mut store, sink) = store_with_sink();
        store.remove_node("ghost");
        assert_eq!(sink.len(), 0);
    }

    #[test]
    fn test_set_color_missing_single_is_noop() {
        let (mut store, sink) = store_with_sink();
        store.add_node("a").unwrap();
        store.set_color(&ColorTarget::Single("ghost".to_string()), Color::blue());
        assert_eq!(sink.len(), 1);
        assert_eq!(store.color("a"), Some(&Color::gray()));
    }

    #[test]
    fn test_set_color_all_except() {
        let (mut store, _sink) = store_with_sink();
        for id in ["a", "b", "c"] {
            store.add_node(id).unwrap();
        }
        store.set_color(&ColorTarget::Single("a".to_string()), Color::blue());
        store.set_color(&ColorTarget::AllExcept("a".to_string()), Color::new("red"));

        assert_eq!(store.color("a"), Some(&Color::blue()));
        assert_eq!(store.color("b"), Some(&Color::new("red")));
        assert_eq!(store.color("c"), Some(&Color::new("red")));
    }

    #[test]
    fn test_capacity_exceeded_leaves_store_unchanged() {
        let config = TopologyConfig::new(3, 3.0).with_max_placement_attempts(50);
        let sink = RecordingSink::new();
        let mut store = TopologyStore::new(
            &config,
            Box::new(RngSource::seeded(2)),
            Box::new(sink.clone()),
        );
        store.add_node("a").unwrap();

        let err = store.add_node("b").unwrap_err();
        assert!(matches!(
            err,
            SimError::CapacityExceeded { ref node, attempts: 50 } if node == "b"
        ));
        assert_eq!(store.len(), 1);
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn test_snapshot_frames_increase() {
        let (mut store, sink) = store_with_sink();
        store.add_node("a").unwrap();
        store.add_node("b").unwrap();
        store.complete_edges_for("b");

        let frames: Vec<u64> = sink.snapshots().iter().map(|s| s.frame).collect();
        assert_eq!(frames, vec![1, 2, 3]);
        assert_eq!(store.frame(), 3);
        assert_eq!(store.snapshot().edges.len(), 1);
    }
}
