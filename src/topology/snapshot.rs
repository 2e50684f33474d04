use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::color::Color;
use super::NodeId;

/// A point on the replay canvas. Fixed once a node is placed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    pub fn distance(&self, other: &Position) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeView {
    pub id: NodeId,
    pub position: Position,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeView {
    pub source: NodeId,
    pub target: NodeId,
    pub color: Color,
}

/// Full topology state at one instant, handed to the visualization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopologySnapshot {
    /// Sequence number of this frame, starting at 1 for the first emission.
    pub frame: u64,
    pub captured_at: DateTime<Utc>,
    pub canvas_size: u32,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<EdgeView>,
}

impl TopologySnapshot {
    /// Frame zero: an empty canvas before anything happened.
    pub fn empty(canvas_size: u32) -> Self {
        Self {
            frame: 0,
            captured_at: Utc::now(),
            canvas_size,
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    pub fn node(&self, id: &str) -> Option<&NodeView> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn color_of(&self, id: &str) -> Option<&Color> {
        self.node(id).map(|n| &n.color)
    }

    pub fn has_edge(&self, a: &str, b: &str) -> bool {
        self.edges
            .iter()
            .any(|e| (e.source == a && e.target == b) || (e.source == b && e.target == a))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_distance() {
        let a = Position::new(1.0, 1.0);
        let b = Position::new(4.0, 5.0);
        assert_eq!(a.distance(&b), 5.0);
        assert_eq!(b.distance(&a), 5.0);
        assert_eq!(a.distance(&a), 0.0);
    }

    #[test]
    fn test_lookup_helpers() {
        let snapshot = TopologySnapshot {
            nodes: vec![
                NodeView {
                    id: "a".to_string(),
                    position: Position::new(1.0, 1.0),
                    color: Color::gray(),
                },
                NodeView {
                    id: "b".to_string(),
                    position: Position::new(5.0, 5.0),
                    color: Color::blue(),
                },
            ],
            edges: vec![EdgeView {
                source: "a".to_string(),
                target: "b".to_string(),
                color: Color::black(),
            }],
            ..TopologySnapshot::empty(20)
        };

        assert_eq!(snapshot.color_of("b"), Some(&Color::blue()));
        assert!(snapshot.color_of("c").is_none());
        assert!(snapshot.has_edge("b", "a"));
        assert!(!snapshot.has_edge("a", "c"));
    }

    #[test]
    fn test_snapshot_json_shape() {
        let snapshot = TopologySnapshot {
            nodes: vec![NodeView {
                id: "n1".to_string(),
                position: Position::new(3.0, 4.0),
                color: Color::gray(),
            }],
            ..TopologySnapshot::empty(20)
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(value["frame"], 0);
        assert_eq!(value["canvas_size"], 20);
        assert_eq!(value["nodes"][0]["id"], "n1");
        assert_eq!(value["nodes"][0]["position"]["x"], 3.0);
        assert_eq!(value["nodes"][0]["color"], "gray");
        assert!(value["captured_at"].is_string());
    }
}
