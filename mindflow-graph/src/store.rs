//! In-process source of truth for one room's graph.
//!
//! All reads by rendering code and all writes by interaction handlers go
//! through the store. Every mutating operation notifies subscribers
//! synchronously with the new graph, unconditionally; callers short-circuit
//! on equality themselves if they need to. Operating on a nonexistent id is
//! a silent no-op: a stale id reference is transient and self-corrects on
//! the next sync cycle.

use std::sync::{Mutex, PoisonError};

use crate::edge::Edge;
use crate::graph::Graph;
use crate::node::{Node, NodePatch, Position};

/// Label given to nodes created without one.
pub const DEFAULT_NODE_LABEL: &str = "New Idea";

type Subscriber = Box<dyn Fn(&Graph) + Send + Sync>;

/// Single in-process source of truth for the current room's graph.
pub struct GraphStore {
    graph: Mutex<Graph>,
    subscribers: Mutex<Vec<Subscriber>>,
}

impl GraphStore {
    /// Create a store holding the built-in welcome graph.
    pub fn new() -> Self {
        Self::with_graph(Graph::welcome())
    }

    /// Create a store holding an explicit initial graph.
    pub fn with_graph(graph: Graph) -> Self {
        Self {
            graph: Mutex::new(graph),
            subscribers: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the current graph.
    pub fn graph(&self) -> Graph {
        self.lock_graph().clone()
    }

    /// Register a callback invoked synchronously after every mutation.
    pub fn subscribe(&self, subscriber: impl Fn(&Graph) + Send + Sync + 'static) {
        self.subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(subscriber));
    }

    /// Wholesale node replacement; used for local edits and remote applies.
    pub fn replace_nodes(&self, nodes: Vec<Node>) {
        let graph = {
            let mut g = self.lock_graph();
            g.nodes = nodes;
            g.clone()
        };
        self.notify(&graph);
    }

    /// Wholesale edge replacement; used for local edits and remote applies.
    pub fn replace_edges(&self, edges: Vec<Edge>) {
        let graph = {
            let mut g = self.lock_graph();
            g.edges = edges;
            g.clone()
        };
        self.notify(&graph);
    }

    /// Create a node at `position` and append it to the graph.
    ///
    /// The new node gets a fresh id and a random palette color.
    pub fn add_node(&self, position: Position, label: Option<&str>) -> Node {
        let node = Node::new(position, label.unwrap_or(DEFAULT_NODE_LABEL));
        let graph = {
            let mut g = self.lock_graph();
            g.nodes.push(node.clone());
            g.clone()
        };
        self.notify(&graph);
        node
    }

    /// Merge a partial update into the matching node's data.
    pub fn update_node(&self, id: &str, patch: NodePatch) {
        let graph = {
            let mut g = self.lock_graph();
            if let Some(node) = g.nodes.iter_mut().find(|n| n.id == id) {
                node.apply(patch);
            }
            g.clone()
        };
        self.notify(&graph);
    }

    /// Remove a node, cascading to every edge touching it.
    pub fn delete_node(&self, id: &str) {
        let graph = {
            let mut g = self.lock_graph();
            g.nodes.retain(|n| n.id != id);
            g.edges.retain(|e| !e.touches(id));
            g.clone()
        };
        self.notify(&graph);
    }

    pub fn add_edge(&self, edge: Edge) {
        let graph = {
            let mut g = self.lock_graph();
            g.edges.push(edge);
            g.clone()
        };
        self.notify(&graph);
    }

    pub fn delete_edge(&self, id: &str) {
        let graph = {
            let mut g = self.lock_graph();
            g.edges.retain(|e| e.id != id);
            g.clone()
        };
        self.notify(&graph);
    }

    /// Restore the built-in welcome graph.
    pub fn reset(&self) {
        let graph = {
            let mut g = self.lock_graph();
            *g = Graph::welcome();
            g.clone()
        };
        self.notify(&graph);
    }

    fn lock_graph(&self) -> std::sync::MutexGuard<'_, Graph> {
        self.graph.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Invoked outside the graph lock so subscribers may read the store.
    fn notify(&self, graph: &Graph) {
        let subscribers = self
            .subscribers
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        for subscriber in subscribers.iter() {
            subscriber(graph);
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
