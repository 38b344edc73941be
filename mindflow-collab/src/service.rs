//! The room document contract and its in-memory implementation.
//!
//! A service stores one JSON document and one revision per room id. Reads
//! never fail for unknown rooms; writes upsert and bump the revision by
//! exactly 1, unconditionally: last-writer-wins, no conflict detection.
//! Divergent concurrent writers silently clobber each other, which is
//! acceptable for a handful of simultaneous editors on a shared link.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::protocol::{RoomResponse, ServiceError};

/// The room document service contract.
#[async_trait]
pub trait RoomService: Send + Sync {
    /// Read a room. Unknown rooms answer `state: None, rev: 0`.
    async fn load(&self, room_id: &str) -> Result<RoomResponse, ServiceError>;

    /// Upsert a room's state, bump its revision by 1, return the new
    /// revision (1 on first write). `known_rev` is advisory and ignored.
    async fn save(
        &self,
        room_id: &str,
        state: Value,
        known_rev: Option<u64>,
    ) -> Result<u64, ServiceError>;
}

struct StoredRoom {
    state: Value,
    rev: u64,
}

/// In-memory room service.
///
/// The reference backend for tests and the default server backend when no
/// storage path is configured.
#[derive(Default)]
pub struct MemoryRoomService {
    rooms: RwLock<HashMap<String, StoredRoom>>,
}

impl MemoryRoomService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current revision of a room; 0 if it was never saved.
    pub async fn revision(&self, room_id: &str) -> u64 {
        self.rooms
            .read()
            .await
            .get(room_id)
            .map_or(0, |room| room.rev)
    }

    /// Number of rooms with stored state.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }
}

#[async_trait]
impl RoomService for MemoryRoomService {
    async fn load(&self, room_id: &str) -> Result<RoomResponse, ServiceError> {
        let rooms = self.rooms.read().await;
        Ok(match rooms.get(room_id) {
            Some(room) => RoomResponse {
                id: room_id.to_string(),
                state: Some(room.state.clone()),
                rev: room.rev,
            },
            None => RoomResponse {
                id: room_id.to_string(),
                state: None,
                rev: 0,
            },
        })
    }

    async fn save(
        &self,
        room_id: &str,
        state: Value,
        _known_rev: Option<u64>,
    ) -> Result<u64, ServiceError> {
        let mut rooms = self.rooms.write().await;
        match rooms.get_mut(room_id) {
            Some(room) => {
                room.state = state;
                room.rev += 1;
                Ok(room.rev)
            }
            None => {
                rooms.insert(room_id.to_string(), StoredRoom { state, rev: 1 });
                Ok(1)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_unknown_room_loads_empty() {
        let service = MemoryRoomService::new();
        let resp = service.load("nowhere").await.unwrap();
        assert_eq!(resp.id, "nowhere");
        assert!(resp.state.is_none());
        assert_eq!(resp.rev, 0);
    }

    #[tokio::test]
    async fn test_first_save_sets_rev_1() {
        let service = MemoryRoomService::new();
        let rev = service
            .save("abc", json!({"nodes": [], "edges": []}), Some(0))
            .await
            .unwrap();
        assert_eq!(rev, 1);
        assert_eq!(service.revision("abc").await, 1);
    }

    #[tokio::test]
    async fn test_revisions_increase_by_one_regardless_of_payload() {
        let service = MemoryRoomService::new();
        let mut last = 0;
        for i in 0..5 {
            // Identical and differing payloads alike bump by exactly 1.
            let state = if i % 2 == 0 { json!({"n": i}) } else { json!({"n": 0}) };
            let rev = service.save("room", state, None).await.unwrap();
            assert_eq!(rev, last + 1);
            last = rev;
        }
    }

    #[tokio::test]
    async fn test_stale_known_rev_is_ignored() {
        let service = MemoryRoomService::new();
        service.save("room", json!({"v": 1}), None).await.unwrap();
        service.save("room", json!({"v": 2}), None).await.unwrap();

        // A writer carrying an ancient revision still wins.
        let rev = service.save("room", json!({"v": 3}), Some(0)).await.unwrap();
        assert_eq!(rev, 3);
        let resp = service.load("room").await.unwrap();
        assert_eq!(resp.state, Some(json!({"v": 3})));
    }

    #[tokio::test]
    async fn test_rooms_are_isolated() {
        let service = MemoryRoomService::new();
        service.save("a", json!({"who": "a"}), None).await.unwrap();
        service.save("b", json!({"who": "b"}), None).await.unwrap();
        service.save("b", json!({"who": "b2"}), None).await.unwrap();

        assert_eq!(service.revision("a").await, 1);
        assert_eq!(service.revision("b").await, 2);
        assert_eq!(service.room_count().await, 2);

        let a = service.load("a").await.unwrap();
        assert_eq!(a.state, Some(json!({"who": "a"})));
    }
}
