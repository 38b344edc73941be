//! Wire types for the room document protocol.
//!
//! One JSON document plus an integer revision per room id. Two operations:
//!
//! ```text
//! GET /rooms/{roomId}              → { id, state | null, rev }
//! PUT /rooms/{roomId} {state,rev?} → { ok, rev }   (rev bumps by 1, always)
//! ```
//!
//! The revision is owned exclusively by the service. Clients never assign
//! it; they read it, forward it as an advisory field, and compare it to
//! decide whether a fetched state is newer than what they already have.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use mindflow_graph::Graph;

/// `GET /rooms/{roomId}` response.
///
/// An unknown room answers `state: null, rev: 0`, never an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomResponse {
    pub id: String,
    pub state: Option<Value>,
    pub rev: u64,
}

/// `PUT /rooms/{roomId}` request body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRequest {
    pub state: Value,
    /// Advisory only: accepted, echoed nowhere, never used for conflict
    /// detection. Retained for forward compatibility.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<u64>,
}

/// `PUT /rooms/{roomId}` response body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveResponse {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rev: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SaveResponse {
    pub fn saved(rev: u64) -> Self {
        Self {
            ok: true,
            rev: Some(rev),
            error: None,
        }
    }

    pub fn rejected(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            rev: None,
            error: Some(error.into()),
        }
    }
}

/// A (state, revision) pair as seen by the sync engine.
///
/// `state: None` means the room has never been saved (or the stored
/// document no longer decodes as a graph).
#[derive(Debug, Clone, PartialEq)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub state: Option<Graph>,
    pub revision: u64,
}

/// Room service errors.
#[derive(Debug, Clone)]
pub enum ServiceError {
    /// The backing store failed.
    Storage(String),
    /// A stored record or payload would not (de)serialize.
    Serialization(String),
    /// The service could not be reached.
    Unavailable(String),
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServiceError::Storage(e) => write!(f, "Storage error: {e}"),
            ServiceError::Serialization(e) => write!(f, "Serialization error: {e}"),
            ServiceError::Unavailable(e) => write!(f, "Service unavailable: {e}"),
        }
    }
}

impl std::error::Error for ServiceError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_response_null_state_wire_shape() {
        let resp = RoomResponse {
            id: "abc".to_string(),
            state: None,
            rev: 0,
        };
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"id":"abc","state":null,"rev":0}"#);
    }

    #[test]
    fn test_save_request_rev_is_optional() {
        let req: SaveRequest = serde_json::from_str(r#"{"state":{"nodes":[],"edges":[]}}"#).unwrap();
        assert!(req.rev.is_none());

        let req: SaveRequest =
            serde_json::from_str(r#"{"state":{"nodes":[],"edges":[]},"rev":7}"#).unwrap();
        assert_eq!(req.rev, Some(7));
    }

    #[test]
    fn test_save_response_shapes() {
        let ok = serde_json::to_string(&SaveResponse::saved(3)).unwrap();
        assert_eq!(ok, r#"{"ok":true,"rev":3}"#);

        let err = serde_json::to_string(&SaveResponse::rejected("Missing state")).unwrap();
        assert_eq!(err, r#"{"ok":false,"error":"Missing state"}"#);
    }

    #[test]
    fn test_service_error_display() {
        let e = ServiceError::Storage("disk on fire".to_string());
        assert_eq!(e.to_string(), "Storage error: disk on fire");
    }
}
