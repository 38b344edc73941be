//! # mindflow-graph — Graph data model for MindFlow
//!
//! The client-side half of the mindmap editor's state: the graph itself
//! (nodes + edges), the in-process store every read and write goes through,
//! and the portable-document boundaries for file transfer and clipboard.
//!
//! ## Modules
//!
//! - [`node`] / [`edge`] / [`graph`] — typed data model with serde wire shapes
//! - [`store`] — [`GraphStore`]: single source of truth with synchronous
//!   change notification
//! - [`transfer`] — tagged export documents and lenient, validated import
//! - [`clipboard`] — tagged selection payloads with a same-process fallback

pub mod clipboard;
pub mod edge;
pub mod graph;
pub mod node;
pub mod store;
pub mod transfer;

// Re-exports for convenience
pub use clipboard::{
    ClipboardBackend, ClipboardError, InProcessClipboard, SelectionClipboard, SelectionPayload,
};
pub use edge::{Edge, EdgeRouting};
pub use graph::Graph;
pub use node::{Node, NodeColor, NodeData, NodePatch, NodeSize, Position};
pub use store::{GraphStore, DEFAULT_NODE_LABEL};
pub use transfer::{export_document, export_json, import_into, parse_document, GraphDocument, TransferError};
