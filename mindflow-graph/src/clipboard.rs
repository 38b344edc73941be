//! Clipboard boundary for cross-tab selection copy.
//!
//! Copied selections travel as tagged JSON so a paste can tell MindFlow
//! content apart from arbitrary clipboard text. When the system clipboard is
//! unavailable or denied, a same-process slot takes over; the user never
//! sees the difference.

use std::sync::{Mutex, PoisonError};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::edge::Edge;
use crate::graph::Graph;
use crate::node::Node;

/// Application tag stamped on clipboard payloads.
pub const CLIPBOARD_APP: &str = "mindflow";
/// Current clipboard payload version.
pub const CLIPBOARD_VERSION: u32 = 1;

const KIND_SELECTION: &str = "selection";

/// A copied sub-graph, tagged for recognition on paste.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionPayload {
    pub app: String,
    pub version: u32,
    #[serde(rename = "type")]
    pub kind: String,
    pub state: Graph,
    /// Unix milliseconds at copy time.
    pub copied_at: u64,
}

impl SelectionPayload {
    pub fn new(nodes: Vec<Node>, edges: Vec<Edge>) -> Self {
        Self {
            app: CLIPBOARD_APP.to_string(),
            version: CLIPBOARD_VERSION,
            kind: KIND_SELECTION.to_string(),
            state: Graph { nodes, edges },
            copied_at: unix_millis(),
        }
    }

    pub fn encode(&self) -> Result<String, ClipboardError> {
        serde_json::to_string(self).map_err(|e| ClipboardError::Serialization(e.to_string()))
    }

    /// Parse and validate a clipboard string; the `app` tag and payload
    /// kind must both match.
    pub fn decode(raw: &str) -> Result<Self, ClipboardError> {
        let payload: SelectionPayload =
            serde_json::from_str(raw).map_err(|e| ClipboardError::Serialization(e.to_string()))?;
        if payload.app != CLIPBOARD_APP {
            return Err(ClipboardError::ForeignPayload);
        }
        if payload.kind != KIND_SELECTION {
            return Err(ClipboardError::WrongKind);
        }
        Ok(payload)
    }
}

/// Clipboard failures; all recovered internally via the fallback slot.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardError {
    /// No system clipboard, or access was denied.
    Unavailable(String),
    /// The clipboard holds nothing usable.
    Empty,
    /// The text is not a MindFlow payload.
    ForeignPayload,
    /// Tagged as MindFlow but not a selection.
    WrongKind,
    Serialization(String),
}

impl std::fmt::Display for ClipboardError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClipboardError::Unavailable(e) => write!(f, "Clipboard unavailable: {e}"),
            ClipboardError::Empty => write!(f, "Clipboard is empty"),
            ClipboardError::ForeignPayload => write!(f, "Clipboard content is not a MindFlow selection"),
            ClipboardError::WrongKind => write!(f, "Unexpected clipboard payload kind"),
            ClipboardError::Serialization(e) => write!(f, "Clipboard payload error: {e}"),
        }
    }
}

impl std::error::Error for ClipboardError {}

/// Seam to the platform clipboard.
pub trait ClipboardBackend: Send + Sync {
    fn write(&self, text: &str) -> Result<(), ClipboardError>;
    fn read(&self) -> Result<String, ClipboardError>;
}

/// Same-process clipboard slot, used directly and as the fallback.
#[derive(Default)]
pub struct InProcessClipboard {
    slot: Mutex<Option<String>>,
}

impl InProcessClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ClipboardBackend for InProcessClipboard {
    fn write(&self, text: &str) -> Result<(), ClipboardError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
        Ok(())
    }

    fn read(&self) -> Result<String, ClipboardError> {
        self.slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .ok_or(ClipboardError::Empty)
    }
}

/// Selection clipboard with automatic same-process fallback.
pub struct SelectionClipboard {
    backend: Option<Box<dyn ClipboardBackend>>,
    fallback: InProcessClipboard,
}

impl SelectionClipboard {
    pub fn new(backend: Box<dyn ClipboardBackend>) -> Self {
        Self {
            backend: Some(backend),
            fallback: InProcessClipboard::new(),
        }
    }

    /// A clipboard with no platform backend at all.
    pub fn in_process() -> Self {
        Self {
            backend: None,
            fallback: InProcessClipboard::new(),
        }
    }

    /// Copy a selection. Backend failures fall through to the same-process
    /// slot; the caller never sees them.
    pub fn copy(&self, payload: &SelectionPayload) {
        let text = match payload.encode() {
            Ok(text) => text,
            Err(e) => {
                log::warn!("selection copy failed to encode: {e}");
                return;
            }
        };
        // The fallback slot always holds the latest copy, so paste keeps
        // working in-process even when the platform write succeeds.
        let _ = self.fallback.write(&text);
        if let Some(backend) = &self.backend {
            if let Err(e) = backend.write(&text) {
                log::debug!("system clipboard write failed, using fallback: {e}");
            }
        }
    }

    /// Paste the most recent selection, if any valid one is reachable.
    pub fn paste(&self) -> Option<SelectionPayload> {
        if let Some(backend) = &self.backend {
            match backend.read().and_then(|text| SelectionPayload::decode(&text)) {
                Ok(payload) => return Some(payload),
                Err(e) => log::debug!("system clipboard paste failed, using fallback: {e}"),
            }
        }
        self.fallback
            .read()
            .and_then(|text| SelectionPayload::decode(&text))
            .ok()
    }
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
    use crate::node::Position;

    struct DeniedClipboard;

    impl ClipboardBackend for DeniedClipboard {
        fn write(&self, _text: &str) -> Result<(), ClipboardError> {
            Err(ClipboardError::Unavailable("permission denied".into()))
        }

        fn read(&self) -> Result<String, ClipboardError> {
            Err(ClipboardError::Unavailable("permission denied".into()))
        }
    }

    fn sample_payload() -> SelectionPayload {
        let node = Node::new(Position::new(5.0, 6.0), "copied");
        SelectionPayload::new(vec![node], vec![])
    }

    #[test]
    fn test_payload_roundtrip() {
        let payload = sample_payload();
        let text = payload.encode().unwrap();
        let back = SelectionPayload::decode(&text).unwrap();
        assert_eq!(back, payload);
    }

    #[test]
    fn test_payload_wire_tags() {
        let text = sample_payload().encode().unwrap();
        assert!(text.contains("\"app\":\"mindflow\""));
        assert!(text.contains("\"type\":\"selection\""));
        assert!(text.contains("copiedAt"));
    }

    #[test]
    fn test_decode_rejects_foreign_app() {
        let mut payload = sample_payload();
        payload.app = "someone-else".to_string();
        let text = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            SelectionPayload::decode(&text).unwrap_err(),
            ClipboardError::ForeignPayload
        );
    }

    #[test]
    fn test_decode_rejects_wrong_kind() {
        let mut payload = sample_payload();
        payload.kind = "document".to_string();
        let text = serde_json::to_string(&payload).unwrap();
        assert_eq!(
            SelectionPayload::decode(&text).unwrap_err(),
            ClipboardError::WrongKind
        );
    }

    #[test]
    fn test_decode_rejects_arbitrary_text() {
        assert!(SelectionPayload::decode("just some text").is_err());
    }

    #[test]
    fn test_in_process_copy_paste() {
        let clipboard = SelectionClipboard::in_process();
        let payload = sample_payload();

        clipboard.copy(&payload);
        assert_eq!(clipboard.paste(), Some(payload));
    }

    #[test]
    fn test_denied_backend_falls_back() {
        let clipboard = SelectionClipboard::new(Box::new(DeniedClipboard));
        let payload = sample_payload();

        clipboard.copy(&payload);
        assert_eq!(clipboard.paste(), Some(payload));
    }

    #[test]
    fn test_paste_empty_returns_none() {
        let clipboard = SelectionClipboard::in_process();
        assert!(clipboard.paste().is_none());
    }
}
