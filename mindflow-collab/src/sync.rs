//! Room state synchronization engine.
//!
//! Reconciles a [`GraphStore`] with the remote room document over time,
//! without a persistent connection, using two cooperating loops:
//!
//! ```text
//!        user edits                    remote editors
//!             │                              │
//!             ▼                              ▼
//!       ┌────────────┐   PUT (debounced)  ┌─────────────┐
//!       │ GraphStore │ ─────────────────► │ RoomService │
//!       └─────┬──────┘                    └──────┬──────┘
//!             │ notify                           │ GET (every 800ms)
//!             ▼                                  ▼
//!       save loop ◄── applying_remote ──── poll loop
//!                      (echo guard)
//! ```
//!
//! The poll loop applies a fetched snapshot only when its revision is
//! strictly greater than the last known one. The save loop coalesces
//! bursts of edits into one push per debounce window. A remote apply flips
//! `applying_remote` for the duration of the overwrite, so the store
//! notifications it produces are never echoed back as a push.
//!
//! The revision compare and the apply are deliberately not atomic against
//! a concurrent push completion: last-writer-wins holds at whole-snapshot
//! granularity, and an interleaved poll/push pair may clobber one
//! snapshot with another. Do not add a lock around it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use mindflow_graph::{Graph, GraphStore};

use crate::persistence::PersistenceClient;
use crate::service::RoomService;

/// Engine timing configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Fixed period of the poll loop.
    pub poll_interval: Duration,
    /// Quiet window before a burst of local edits becomes one push.
    pub save_debounce: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(800),
            save_debounce: Duration::from_millis(200),
        }
    }
}

/// Per-room synchronization engine.
///
/// Constructed at room open, torn down at room close. Constructing the
/// engine registers its store subscription; [`SyncEngine::start`] performs
/// the initial load and spawns the poll and save loops.
pub struct SyncEngine<S: RoomService + 'static> {
    room_id: String,
    store: Arc<GraphStore>,
    client: PersistenceClient<S>,
    config: SyncConfig,
    last_known_revision: Arc<AtomicU64>,
    applying_remote: Arc<AtomicBool>,
    dirty_rx: Option<mpsc::UnboundedReceiver<()>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<S: RoomService + 'static> SyncEngine<S> {
    pub fn new(
        room_id: impl Into<String>,
        store: Arc<GraphStore>,
        client: PersistenceClient<S>,
        config: SyncConfig,
    ) -> Self {
        let applying_remote = Arc::new(AtomicBool::new(false));
        let (dirty_tx, dirty_rx) = mpsc::unbounded_channel();

        // Changes made while a remote snapshot is being applied originate
        // from the poll loop, not the user; they must not schedule a push.
        let applying = applying_remote.clone();
        store.subscribe(move |_| {
            if !applying.load(Ordering::SeqCst) {
                let _ = dirty_tx.send(());
            }
        });

        Self {
            room_id: room_id.into(),
            store,
            client,
            config,
            last_known_revision: Arc::new(AtomicU64::new(0)),
            applying_remote,
            dirty_rx: Some(dirty_rx),
            tasks: Vec::new(),
        }
    }

    /// Initial load, then spawn the poll and save loops.
    pub async fn start(&mut self) {
        let Some(dirty_rx) = self.dirty_rx.take() else {
            return; // already started
        };

        self.initial_load().await;
        self.spawn_poll_loop();
        self.spawn_save_loop(dirty_rx);
    }

    /// Fetch once at room open. A stored state overwrites the default
    /// graph; an empty room just records the revision (0). A failed fetch
    /// leaves everything as-is and the poll loop catches up later.
    async fn initial_load(&self) {
        match self.client.fetch_snapshot(&self.room_id).await {
            Some(snapshot) => {
                if let Some(state) = snapshot.state {
                    log::info!(
                        "room {}: loaded rev {} ({} nodes)",
                        self.room_id,
                        snapshot.revision,
                        state.nodes.len()
                    );
                    apply_remote(
                        &self.store,
                        &self.applying_remote,
                        &self.last_known_revision,
                        state,
                        snapshot.revision,
                    );
                } else {
                    self.last_known_revision
                        .store(snapshot.revision, Ordering::SeqCst);
                }
            }
            None => {
                log::debug!("room {}: initial load unavailable", self.room_id);
            }
        }
    }

    fn spawn_poll_loop(&mut self) {
        let room_id = self.room_id.clone();
        let store = self.store.clone();
        let client = self.client.clone();
        let last_rev = self.last_known_revision.clone();
        let applying = self.applying_remote.clone();
        let period = self.config.poll_interval;

        self.tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            // The first tick completes immediately; the initial load
            // already ran, so skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(snapshot) = client.fetch_snapshot(&room_id).await else {
                    continue;
                };
                if snapshot.revision <= last_rev.load(Ordering::SeqCst) {
                    continue;
                }
                let Some(state) = snapshot.state else {
                    continue;
                };
                log::debug!("room {room_id}: applying remote rev {}", snapshot.revision);
                apply_remote(&store, &applying, &last_rev, state, snapshot.revision);
            }
        }));
    }

    fn spawn_save_loop(&mut self, mut dirty_rx: mpsc::UnboundedReceiver<()>) {
        let room_id = self.room_id.clone();
        let store = self.store.clone();
        let client = self.client.clone();
        let last_rev = self.last_known_revision.clone();
        let debounce = self.config.save_debounce;

        self.tasks.push(tokio::spawn(async move {
            while dirty_rx.recv().await.is_some() {
                // Debounce: every further notification restarts the quiet
                // window, so a drag burst collapses into one push.
                loop {
                    tokio::select! {
                        _ = tokio::time::sleep(debounce) => break,
                        more = dirty_rx.recv() => {
                            if more.is_none() {
                                return;
                            }
                        }
                    }
                }

                let graph = store.graph();
                let known = last_rev.load(Ordering::SeqCst);
                let rev = client.push_snapshot(&room_id, &graph, known).await;
                last_rev.store(rev, Ordering::SeqCst);
                log::debug!("room {room_id}: pushed rev {rev}");
            }
        }));
    }

    /// Last revision observed from a fetch or assigned by a push.
    pub fn revision(&self) -> u64 {
        self.last_known_revision.load(Ordering::SeqCst)
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn store(&self) -> &Arc<GraphStore> {
        &self.store
    }

    /// Tear down both loops and any pending debounce.
    ///
    /// Results of calls still in flight are never observed; they die with
    /// their task.
    pub fn shutdown(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl<S: RoomService + 'static> Drop for SyncEngine<S> {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Overwrite the store from a fetched snapshot.
///
/// The flag is set for the duration of the overwrite and cleared before
/// returning, so the save loop never mistakes the overwrite for an edit.
fn apply_remote(
    store: &GraphStore,
    applying: &AtomicBool,
    last_rev: &AtomicU64,
    state: Graph,
    revision: u64,
) {
    applying.store(true, Ordering::SeqCst);
    store.replace_nodes(state.nodes);
    store.replace_edges(state.edges);
    last_rev.store(revision, Ordering::SeqCst);
    applying.store(false, Ordering::SeqCst);
}
