//! Client-side access to the room document service.
//!
//! Translates between [`Graph`] values and the JSON wire format, and folds
//! every transport failure into a sentinel the sync engine can ignore:
//! a failed fetch is "no update available this cycle", a failed push keeps
//! the caller's revision. Failure is never a reason to erase local state.

use std::sync::Arc;

use mindflow_graph::Graph;

use crate::protocol::RoomSnapshot;
use crate::service::RoomService;

/// Read/write adapter over a [`RoomService`].
pub struct PersistenceClient<S: RoomService> {
    service: Arc<S>,
}

impl<S: RoomService> Clone for PersistenceClient<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
        }
    }
}

impl<S: RoomService> PersistenceClient<S> {
    pub fn new(service: Arc<S>) -> Self {
        Self { service }
    }

    /// Fetch the current snapshot for a room.
    ///
    /// `None` means the read failed; callers treat that as "nothing newer
    /// this cycle" and try again next tick. A room that exists but whose
    /// stored document no longer decodes as a graph yields `state: None`
    /// with the fetched revision.
    pub async fn fetch_snapshot(&self, room_id: &str) -> Option<RoomSnapshot> {
        match self.service.load(room_id).await {
            Ok(resp) => {
                let state = resp.state.and_then(|value| {
                    match serde_json::from_value::<Graph>(value) {
                        Ok(graph) => Some(graph),
                        Err(e) => {
                            log::warn!("room {room_id}: stored state is not a graph: {e}");
                            None
                        }
                    }
                });
                Some(RoomSnapshot {
                    room_id: resp.id,
                    state,
                    revision: resp.rev,
                })
            }
            Err(e) => {
                log::debug!("room {room_id}: fetch failed: {e}");
                None
            }
        }
    }

    /// Push the graph, forwarding `known_revision` as the advisory field.
    ///
    /// Returns the service-assigned revision on success; on failure,
    /// returns `known_revision` unchanged. There is no retry queue; the
    /// next debounce cycle pushes naturally.
    pub async fn push_snapshot(&self, room_id: &str, graph: &Graph, known_revision: u64) -> u64 {
        let state = match serde_json::to_value(graph) {
            Ok(state) => state,
            Err(e) => {
                log::warn!("room {room_id}: graph failed to serialize: {e}");
                return known_revision;
            }
        };

        match self
            .service
            .save(room_id, state, Some(known_revision))
            .await
        {
            Ok(rev) => rev,
            Err(e) => {
                log::warn!("room {room_id}: push failed: {e}");
                known_revision
            }
        }
    }
}
