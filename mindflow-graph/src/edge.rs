//! Directed connections between nodes.
//!
//! Edge ids are derived from the endpoints, the attachment handles, and the
//! creation timestamp, so they stay collision-free while remaining
//! reconstructable when reading a raw snapshot.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// How the rendering layer routes an edge between its endpoints.
///
/// Presentational only; carried through snapshots without interpretation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeRouting {
    Straight,
    SmoothStep,
    Bezier,
}

impl Default for EdgeRouting {
    fn default() -> Self {
        EdgeRouting::SmoothStep
    }
}

/// A directed connection between two nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// Which side/point of the source node the edge attaches to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
    #[serde(default)]
    pub animated: bool,
    #[serde(default)]
    pub dashed: bool,
    #[serde(default)]
    pub routing: EdgeRouting,
    /// Transient selection flag; passed through snapshots unchanged.
    #[serde(default)]
    pub selected: bool,
}

impl Edge {
    /// Create an edge between two nodes with a derived id.
    ///
    /// New connections default to the animated smooth-step style.
    pub fn connect(
        source: impl Into<String>,
        source_handle: Option<String>,
        target: impl Into<String>,
        target_handle: Option<String>,
    ) -> Self {
        let source = source.into();
        let target = target.into();
        let id = derive_id(
            &source,
            source_handle.as_deref(),
            &target,
            target_handle.as_deref(),
            unix_millis(),
        );
        Self {
            id,
            source,
            target,
            source_handle,
            target_handle,
            animated: true,
            dashed: false,
            routing: EdgeRouting::SmoothStep,
            selected: false,
        }
    }

    /// Whether this edge touches the given node, at either end.
    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

/// `e{source}-{sourceHandle|s}-{target}-{targetHandle|t}-{millis}`.
fn derive_id(
    source: &str,
    source_handle: Option<&str>,
    target: &str,
    target_handle: Option<&str>,
    millis: u64,
) -> String {
    format!(
        "e{source}-{}-{target}-{}-{millis}",
        source_handle.unwrap_or("s"),
        target_handle.unwrap_or("t"),
    )
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
