//! Neighbor-node bookkeeping.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Lifecycle states announced by the discovery backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    Up,
    Down,
}

/// One node in the mesh, as advertised through discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Data center / zone the node runs in.
    pub dc: String,
    /// Unique node identifier.
    pub nid: String,
    /// Service tag the node advertises (e.g. `"sfu"`, `"islb"`).
    pub service: String,
    /// gRPC endpoint URL for reaching the node.
    pub endpoint: String,
}

/// Shared map of currently known neighbor nodes, keyed by node id.
///
/// Cheap to clone; all clones observe the same map. Reads take the
/// shared lock and return owned copies, so callers never hold the lock
/// across their own work.
#[derive(Debug, Clone, Default)]
pub struct NeighborRegistry {
    nodes: Arc<RwLock<HashMap<String, Node>>>,
}

impl NeighborRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a node coming up. The first announcement wins; repeated
    /// `Up` announcements for a known node id are ignored.
    pub fn record_up(&self, node: Node) {
        let Ok(mut nodes) = self.nodes.write() else {
            return;
        };
        if !nodes.contains_key(&node.nid) {
            tracing::info!(target: "cluster", nid = %node.nid, service = %node.service, "neighbor node up");
            nodes.insert(node.nid.clone(), node);
        }
    }

    /// Record a node going down. Unknown ids are ignored.
    pub fn record_down(&self, nid: &str) {
        let Ok(mut nodes) = self.nodes.write() else {
            return;
        };
        if nodes.remove(nid).is_some() {
            tracing::info!(target: "cluster", nid = %nid, "neighbor node down");
        }
    }

    /// Dispatch one discovery announcement.
    pub fn handle(&self, state: NodeState, node: Node) {
        match state {
            NodeState::Up => self.record_up(node),
            NodeState::Down => self.record_down(&node.nid),
        }
    }

    /// Copy of the current node set.
    pub fn snapshot(&self) -> HashMap<String, Node> {
        match self.nodes.read() {
            Ok(nodes) => nodes.clone(),
            Err(_) => HashMap::new(),
        }
    }

    /// First known node advertising `service`, if any.
    pub fn resolve_by_service(&self, service: &str) -> Option<Node> {
        let nodes = self.nodes.read().ok()?;
        nodes.values().find(|n| n.service == service).cloned()
    }

    /// Number of currently known neighbors.
    pub fn len(&self) -> usize {
        self.nodes.read().map(|n| n.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
