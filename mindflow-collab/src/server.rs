//! HTTP surface for the room document service.
//!
//! ```text
//! Browser tab A ──┐
//!                  ├── GET  /rooms/{roomId}  → { id, state | null, rev }
//! Browser tab B ──┤
//!                  └── PUT  /rooms/{roomId}  → { ok, rev }
//!                              │
//!                       ┌──────▼───────┐
//!                       │ RoomService  │  memory, or RocksDB when a
//!                       │ (trait obj)  │  storage path is configured
//!                       └──────────────┘
//! ```
//!
//! The surface is deliberately dumb: no auth, no conflict detection, no
//! room listing. A malformed PUT body answers `ok: false` with a client
//! error status; it never takes the service down.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;

use crate::protocol::{SaveResponse, ServiceError};
use crate::service::{MemoryRoomService, RoomService};
use crate::storage::{RocksRoomStore, StoreConfig};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct RoomServerConfig {
    /// Address to bind to
    pub bind_addr: String,
    /// Persistence storage path (None = in-memory only)
    pub storage_path: Option<PathBuf>,
}

impl Default for RoomServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:9090".to_string(),
            storage_path: None,
        }
    }
}

/// The room document server.
pub struct RoomServer {
    config: RoomServerConfig,
    service: Arc<dyn RoomService>,
}

impl RoomServer {
    /// Create a server from configuration, opening durable storage when a
    /// path is configured.
    pub fn new(config: RoomServerConfig) -> Result<Self, ServiceError> {
        let service: Arc<dyn RoomService> = match &config.storage_path {
            Some(path) => {
                let store_config = StoreConfig {
                    path: path.clone(),
                    ..StoreConfig::default()
                };
                Arc::new(RocksRoomStore::open(store_config)?)
            }
            None => Arc::new(MemoryRoomService::new()),
        };
        Ok(Self { config, service })
    }

    /// Create with default configuration (in-memory, no persistence).
    pub fn with_defaults() -> Self {
        Self {
            config: RoomServerConfig::default(),
            service: Arc::new(MemoryRoomService::new()),
        }
    }

    /// Create over an existing service instance.
    pub fn with_service(config: RoomServerConfig, service: Arc<dyn RoomService>) -> Self {
        Self { config, service }
    }

    /// Build the router. Exposed separately so tests can drive it
    /// in-process.
    pub fn router(&self) -> Router {
        Router::new()
            .route("/rooms/{room_id}", get(get_room).put(put_room))
            .with_state(self.service.clone())
    }

    /// Bind and serve until the task is cancelled.
    pub async fn run(&self) -> Result<(), std::io::Error> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        log::info!("room server listening on {}", self.config.bind_addr);
        axum::serve(listener, self.router()).await
    }

    pub fn bind_addr(&self) -> &str {
        &self.config.bind_addr
    }

    pub fn service(&self) -> &Arc<dyn RoomService> {
        &self.service
    }
}

async fn get_room(
    State(service): State<Arc<dyn RoomService>>,
    Path(room_id): Path<String>,
) -> Response {
    match service.load(&room_id).await {
        Ok(resp) => Json(resp).into_response(),
        Err(e) => {
            log::error!("room {room_id}: load failed: {e}");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

async fn put_room(
    State(service): State<Arc<dyn RoomService>>,
    Path(room_id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<SaveResponse>) {
    let Ok(Json(body)) = body else {
        return (
            StatusCode::BAD_REQUEST,
            Json(SaveResponse::rejected("Invalid JSON body")),
        );
    };

    // `rev` is accepted but advisory; only `state` is required.
    let known_rev = body.get("rev").and_then(Value::as_u64);
    let state = match body.get("state") {
        Some(state) if !state.is_null() => state.clone(),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(SaveResponse::rejected("Missing state")),
            )
        }
    };

    match service.save(&room_id, state, known_rev).await {
        Ok(rev) => {
            log::debug!("room {room_id}: saved rev {rev}");
            (StatusCode::OK, Json(SaveResponse::saved(rev)))
        }
        Err(e) => {
            log::error!("room {room_id}: save failed: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(SaveResponse::rejected(e.to_string())),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use tower::ServiceExt;

    use crate::protocol::SaveRequest;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn put(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("PUT")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[test]
    fn test_config_default() {
        let config = RoomServerConfig::default();
        assert_eq!(config.bind_addr, "127.0.0.1:9090");
        assert!(config.storage_path.is_none());
    }

    #[test]
    fn test_server_with_storage() {
        let dir = tempfile::tempdir().unwrap();
        let server = RoomServer::new(RoomServerConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            storage_path: Some(dir.path().join("db")),
        });
        assert!(server.is_ok());
    }

    #[tokio::test]
    async fn test_get_unknown_room_is_empty_not_error() {
        let server = RoomServer::with_defaults();
        let response = server
            .router()
            .oneshot(Request::get("/rooms/abc").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["id"], "abc");
        assert!(json["state"].is_null());
        assert_eq!(json["rev"], 0);
    }

    #[tokio::test]
    async fn test_put_then_get_roundtrip() {
        let server = RoomServer::with_defaults();
        let app = server.router();

        let body = serde_json::to_string(&SaveRequest {
            state: serde_json::json!({"nodes": [], "edges": []}),
            rev: Some(0),
        })
        .unwrap();
        let response = app.clone().oneshot(put("/rooms/xyz", &body)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["ok"], true);
        assert_eq!(json["rev"], 1);

        let response = app
            .oneshot(Request::get("/rooms/xyz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let json = body_json(response).await;
        assert_eq!(json["rev"], 1);
        assert_eq!(json["state"]["nodes"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_put_missing_state_is_client_error() {
        let server = RoomServer::with_defaults();
        let response = server
            .router()
            .oneshot(put("/rooms/abc", r#"{"rev":3}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
        assert_eq!(json["error"], "Missing state");
    }

    #[tokio::test]
    async fn test_put_invalid_body_is_client_error() {
        let server = RoomServer::with_defaults();
        let response = server
            .router()
            .oneshot(put("/rooms/abc", "this is not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["ok"], false);
    }

    #[tokio::test]
    async fn test_put_bumps_revision_every_time() {
        let server = RoomServer::with_defaults();
        let app = server.router();

        for expected in 1..=3 {
            let response = app
                .clone()
                .oneshot(put("/rooms/abc", r#"{"state":{"nodes":[],"edges":[]}}"#))
                .await
                .unwrap();
            let json = body_json(response).await;
            assert_eq!(json["rev"], expected);
        }
    }
}
