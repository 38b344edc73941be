//! The graph: the unit of synchronization.
//!
//! Node and edge order is semantically irrelevant but preserved for stable
//! diffing and export. Well-formedness means every edge endpoint references
//! an existing node; transient violations during partial updates are
//! tolerated, but a dangling edge must never reach a persisted snapshot.
//! [`crate::store::GraphStore::delete_node`] cascades to enforce this.

use serde::{Deserialize, Serialize};

use crate::edge::{Edge, EdgeRouting};
use crate::node::{Node, NodeColor, NodeData, Position};

/// The current diagram: ordered nodes plus ordered edges.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Graph {
    /// The built-in sample graph shown when a room has never been saved.
    pub fn welcome() -> Self {
        let sample = |id: &str, x: f64, y: f64, label: &str, color: NodeColor, emoji: &str| Node {
            id: id.to_string(),
            position: Position::new(x, y),
            data: NodeData {
                label: label.to_string(),
                color,
                emoji: Some(emoji.to_string()),
                color_override: None,
            },
            size: None,
            selected: false,
        };
        let link = |id: &str, source: &str, target: &str| Edge {
            id: id.to_string(),
            source: source.to_string(),
            target: target.to_string(),
            source_handle: None,
            target_handle: None,
            animated: true,
            dashed: false,
            routing: EdgeRouting::SmoothStep,
            selected: false,
        };

        Self {
            nodes: vec![
                sample(
                    "welcome-1",
                    250.0,
                    200.0,
                    "🎯 Welcome to MindFlow",
                    NodeColor::Blue,
                    "🎯",
                ),
                sample(
                    "welcome-2",
                    100.0,
                    350.0,
                    "Click to add nodes",
                    NodeColor::Purple,
                    "✨",
                ),
                sample(
                    "welcome-3",
                    400.0,
                    350.0,
                    "Drag to connect ideas",
                    NodeColor::Pink,
                    "🔗",
                ),
            ],
            edges: vec![
                link("e1-2", "welcome-1", "welcome-2"),
                link("e1-3", "welcome-1", "welcome-3"),
            ],
        }
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.node(id).is_some()
    }

    /// Edges whose source or target references a missing node.
    pub fn dangling_edges(&self) -> Vec<&Edge> {
        self.edges
            .iter()
            .filter(|e| !self.has_node(&e.source) || !self.has_node(&e.target))
            .collect()
    }

    /// Whether every edge endpoint references an existing node.
    pub fn is_well_formed(&self) -> bool {
        self.dangling_edges().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_welcome_graph_shape() {
        let graph = Graph::welcome();
        assert_eq!(graph.nodes.len(), 3);
        assert_eq!(graph.edges.len(), 2);
        assert!(graph.is_well_formed());

        let root = graph.node("welcome-1").unwrap();
        assert_eq!(root.data.color, NodeColor::Blue);
        assert_eq!(root.data.emoji.as_deref(), Some("🎯"));
        assert!(graph.edges.iter().all(|e| e.animated));
    }

    #[test]
    fn test_dangling_edge_detection() {
        let mut graph = Graph::welcome();
        graph.nodes.retain(|n| n.id != "welcome-2");

        assert!(!graph.is_well_formed());
        let dangling = graph.dangling_edges();
        assert_eq!(dangling.len(), 1);
        assert_eq!(dangling[0].id, "e1-2");
    }

    #[test]
    fn test_empty_graph_is_well_formed() {
        assert!(Graph::default().is_well_formed());
    }

    #[test]
    fn test_graph_serde_roundtrip() {
        let graph = Graph::welcome();
        let json = serde_json::to_string(&graph).unwrap();
        let back: Graph = serde_json::from_str(&json).unwrap();
        assert_eq!(back, graph);
    }
}
