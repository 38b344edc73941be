//! Node data model for the mindmap graph.
//!
//! A node is a single idea unit: a position on the infinite canvas plus a
//! label, a palette color, and an optional emoji glyph. Sizing and the
//! `selected` flag are carried through snapshots for the rendering layer
//! but carry no invariants here.

use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed palette for node classification.
///
/// Serialized lowercase so snapshots stay readable (`"color": "blue"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeColor {
    Blue,
    Purple,
    Pink,
    Green,
    Orange,
    Gray,
}

impl NodeColor {
    /// Every palette entry, in display order.
    pub const ALL: [NodeColor; 6] = [
        NodeColor::Blue,
        NodeColor::Purple,
        NodeColor::Pink,
        NodeColor::Green,
        NodeColor::Orange,
        NodeColor::Gray,
    ];

    /// Accent hex value used by the rendering layer and the minimap.
    pub fn accent(&self) -> &'static str {
        match self {
            NodeColor::Blue => "#3b82f6",
            NodeColor::Purple => "#a855f7",
            NodeColor::Pink => "#ec4899",
            NodeColor::Green => "#10b981",
            NodeColor::Orange => "#f97316",
            NodeColor::Gray => "#6b7280",
        }
    }

    /// Uniform pick over the palette, used for freshly created nodes.
    pub fn random() -> Self {
        *Self::ALL
            .choose(&mut rand::thread_rng())
            .unwrap_or(&NodeColor::Gray)
    }
}

/// 2D coordinate on the infinite canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Explicit dimensions overriding the renderer's defaults, set by resize.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeSize {
    pub width: f64,
    pub height: f64,
}

/// User-editable content of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeData {
    pub label: String,
    pub color: NodeColor,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    /// Literal color value taking rendering precedence over `color`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_override: Option<String>,
}

/// Partial update merged into a node's [`NodeData`].
///
/// `None` fields are left untouched, mirroring a partial-object merge.
#[derive(Debug, Clone, Default)]
pub struct NodePatch {
    pub label: Option<String>,
    pub color: Option<NodeColor>,
    pub emoji: Option<String>,
    pub color_override: Option<String>,
}

/// A single idea unit on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Globally unique within a room, immutable after creation.
    pub id: String,
    pub position: Position,
    pub data: NodeData,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<NodeSize>,
    /// Transient selection flag; passed through snapshots unchanged.
    #[serde(default)]
    pub selected: bool,
}

impl Node {
    /// Create a node with a fresh id and a random palette color.
    pub fn new(position: Position, label: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            position,
            data: NodeData {
                label: label.into(),
                color: NodeColor::random(),
                emoji: None,
                color_override: None,
            },
            size: None,
            selected: false,
        }
    }

    /// Merge a partial update into this node's data.
    pub fn apply(&mut self, patch: NodePatch) {
        if let Some(label) = patch.label {
            self.data.label = label;
        }
        if let Some(color) = patch.color {
            self.data.color = color;
        }
        if let Some(emoji) = patch.emoji {
            self.data.emoji = Some(emoji);
        }
        if let Some(over) = patch.color_override {
            self.data.color_override = Some(over);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_color_in_palette() {
        for _ in 0..64 {
            let color = NodeColor::random();
            assert!(NodeColor::ALL.contains(&color));
        }
    }

    #[test]
    fn test_accent_values() {
        assert_eq!(NodeColor::Blue.accent(), "#3b82f6");
        assert_eq!(NodeColor::Gray.accent(), "#6b7280");
    }

    #[test]
    fn test_new_nodes_have_unique_ids() {
        let a = Node::new(Position::new(0.0, 0.0), "a");
        let b = Node::new(Position::new(0.0, 0.0), "b");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_patch_merges_only_present_fields() {
        let mut node = Node::new(Position::default(), "Original");
        node.data.color = NodeColor::Blue;

        node.apply(NodePatch {
            label: Some("Renamed".to_string()),
            ..NodePatch::default()
        });

        assert_eq!(node.data.label, "Renamed");
        assert_eq!(node.data.color, NodeColor::Blue);
        assert!(node.data.emoji.is_none());
    }

    #[test]
    fn test_color_serializes_lowercase() {
        let json = serde_json::to_string(&NodeColor::Purple).unwrap();
        assert_eq!(json, "\"purple\"");
    }

    #[test]
    fn test_node_serde_roundtrip_with_override() {
        let mut node = Node::new(Position::new(10.0, 20.0), "idea");
        node.data.color_override = Some("#112233".to_string());
        node.size = Some(NodeSize {
            width: 240.0,
            height: 96.0,
        });

        let json = serde_json::to_string(&node).unwrap();
        assert!(json.contains("\"colorOverride\":\"#112233\""));

        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_optional_fields_absent_from_json() {
        let node = Node::new(Position::default(), "bare");
        let json = serde_json::to_string(&node).unwrap();
        assert!(!json.contains("emoji"));
        assert!(!json.contains("colorOverride"));
        assert!(!json.contains("size"));
    }
}
