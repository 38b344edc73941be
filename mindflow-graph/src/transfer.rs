//! File import/export boundary.
//!
//! Export produces a tagged document wrapping the graph; import accepts the
//! same shape, or a bare `{nodes, edges}` object for leniency, and replaces
//! the store wholesale. A failed import leaves the store untouched and
//! surfaces a user-visible error.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::graph::Graph;
use crate::store::GraphStore;

/// Format tag stamped on exported documents.
pub const DOCUMENT_FORMAT: &str = "mindflow-document";
/// Current document format version.
pub const DOCUMENT_VERSION: u32 = 1;

/// A portable snapshot of one room's graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    pub format: String,
    pub version: u32,
    pub room_id: String,
    /// Unix milliseconds at export time.
    pub exported_at: u64,
    pub state: Graph,
}

/// Import/export failures surfaced to the user.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferError {
    /// The file is not valid JSON.
    InvalidJson(String),
    /// The document has no `nodes` sequence.
    MissingNodes,
    /// The document has no `edges` sequence.
    MissingEdges,
    /// `nodes`/`edges` are present but an entry has the wrong shape.
    InvalidShape(String),
}

impl std::fmt::Display for TransferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransferError::InvalidJson(e) => write!(f, "This file is not valid JSON: {e}"),
            TransferError::MissingNodes => write!(f, "This file has no \"nodes\" list"),
            TransferError::MissingEdges => write!(f, "This file has no \"edges\" list"),
            TransferError::InvalidShape(e) => {
                write!(f, "This file does not look like a MindFlow map: {e}")
            }
        }
    }
}

impl std::error::Error for TransferError {}

/// Wrap a graph in a tagged, timestamped export document.
pub fn export_document(room_id: impl Into<String>, graph: &Graph) -> GraphDocument {
    GraphDocument {
        format: DOCUMENT_FORMAT.to_string(),
        version: DOCUMENT_VERSION,
        room_id: room_id.into(),
        exported_at: unix_millis(),
        state: graph.clone(),
    }
}

/// Serialize an export document for download.
pub fn export_json(room_id: impl Into<String>, graph: &Graph) -> Result<String, TransferError> {
    serde_json::to_string_pretty(&export_document(room_id, graph))
        .map_err(|e| TransferError::InvalidShape(e.to_string()))
}

/// Parse an exported document or a bare `{nodes, edges}` object.
pub fn parse_document(raw: &str) -> Result<Graph, TransferError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| TransferError::InvalidJson(e.to_string()))?;

    // Full documents carry the graph under `state`; bare graphs are the
    // object itself.
    let state = match value.get("state") {
        Some(inner) => inner,
        None => &value,
    };

    match state.get("nodes") {
        Some(nodes) if nodes.is_array() => {}
        _ => return Err(TransferError::MissingNodes),
    }
    match state.get("edges") {
        Some(edges) if edges.is_array() => {}
        _ => return Err(TransferError::MissingEdges),
    }

    serde_json::from_value(state.clone()).map_err(|e| TransferError::InvalidShape(e.to_string()))
}

/// Parse `raw` and replace the store wholesale on success.
pub fn import_into(store: &GraphStore, raw: &str) -> Result<(), TransferError> {
    let graph = parse_document(raw)?;
    log::info!(
        "importing graph: {} nodes, {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );
    store.replace_nodes(graph.nodes);
    store.replace_edges(graph.edges);
    Ok(())
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_document_shape() {
        let graph = Graph::welcome();
        let doc = export_document("room-9", &graph);

        assert_eq!(doc.format, DOCUMENT_FORMAT);
        assert_eq!(doc.version, DOCUMENT_VERSION);
        assert_eq!(doc.room_id, "room-9");
        assert!(doc.exported_at > 0);
        assert_eq!(doc.state, graph);
    }

    #[test]
    fn test_import_full_document() {
        let store = GraphStore::with_graph(Graph::default());
        let json = export_json("room-9", &Graph::welcome()).unwrap();

        import_into(&store, &json).unwrap();
        assert_eq!(store.graph(), Graph::welcome());
    }

    #[test]
    fn test_import_bare_graph_object() {
        let store = GraphStore::with_graph(Graph::default());
        let json = serde_json::to_string(&Graph::welcome()).unwrap();

        import_into(&store, &json).unwrap();
        assert_eq!(store.graph(), Graph::welcome());
    }

    #[test]
    fn test_import_rejects_missing_edges() {
        let store = GraphStore::new();
        let before = store.graph();

        let err = import_into(&store, r#"{"nodes": []}"#).unwrap_err();
        assert_eq!(err, TransferError::MissingEdges);
        // Store untouched on failure.
        assert_eq!(store.graph(), before);
    }

    #[test]
    fn test_import_rejects_non_json() {
        let store = GraphStore::new();
        let err = import_into(&store, "not json at all").unwrap_err();
        assert!(matches!(err, TransferError::InvalidJson(_)));
    }

    #[test]
    fn test_import_rejects_wrong_entry_shape() {
        let store = GraphStore::new();
        let err = import_into(&store, r#"{"nodes": [{"bogus": 1}], "edges": []}"#).unwrap_err();
        assert!(matches!(err, TransferError::InvalidShape(_)));
    }

    #[test]
    fn test_errors_are_user_readable() {
        let msg = TransferError::MissingNodes.to_string();
        assert!(msg.contains("nodes"));
    }
}
