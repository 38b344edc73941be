//! # mindflow-collab — Room state synchronization for MindFlow
//!
//! Keeps each client's in-memory graph consistent with a shared,
//! server-held revision of that graph under concurrent, uncoordinated
//! editors, using polling reads, debounced writes, and a monotonic
//! revision counter instead of a persistent connection or CRDT machinery.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐  edits    ┌────────────┐  debounced PUT  ┌─────────────┐
//! │ editor UI  │ ────────► │ GraphStore │ ──────────────► │ RoomService │
//! └────────────┘           └─────┬──────┘                 │ (doc + rev) │
//!                                │ notify                 └──────┬──────┘
//!                          ┌─────▼──────┐    GET (poll)          │
//!                          │ SyncEngine │ ◄──────────────────────┘
//!                          └────────────┘  apply iff rev increased
//! ```
//!
//! Consistency is last-writer-wins at whole-snapshot granularity: the most
//! recently completed write fully replaces prior state, and the revision
//! counter answers only "is there something newer", never "which edits".
//!
//! ## Modules
//!
//! - [`protocol`] — wire types and the revision contract
//! - [`service`] — `RoomService` trait + in-memory implementation
//! - [`storage`] — durable RocksDB implementation
//! - [`server`] — HTTP surface (`GET`/`PUT /rooms/{roomId}`)
//! - [`persistence`] — client-side fetch/push with swallowed failures
//! - [`sync`] — the poll + debounced-save engine

pub mod persistence;
pub mod protocol;
pub mod server;
pub mod service;
pub mod storage;
pub mod sync;

// Re-exports for convenience
pub use persistence::PersistenceClient;
pub use protocol::{RoomResponse, RoomSnapshot, SaveRequest, SaveResponse, ServiceError};
pub use server::{RoomServer, RoomServerConfig};
pub use service::{MemoryRoomService, RoomService};
pub use storage::{RocksRoomStore, StoreConfig, StoreError};
pub use sync::{SyncConfig, SyncEngine};
