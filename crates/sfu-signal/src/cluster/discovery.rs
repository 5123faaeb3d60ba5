//! Discovery-backend seam.
//!
//! The backing service (etcd, redis, a static file) is injected behind
//! this trait; the rest of the crate only sees register/keep-alive/watch.

use crate::errors::DiscoveryError;
use async_trait::async_trait;
use std::sync::Arc;

use super::registry::{Node, NodeState};

/// Invoked by the backend whenever a watched node changes state.
pub type WatchCallback = Arc<dyn Fn(NodeState, Node) + Send + Sync>;

/// Node-discovery backend.
#[async_trait]
pub trait Discovery: Send + Sync + 'static {
    /// Advertise `node` to the cluster.
    async fn register(&self, node: &Node) -> Result<(), DiscoveryError>;

    /// Refresh an existing registration before it expires.
    async fn keep_alive(&self, node: &Node) -> Result<(), DiscoveryError>;

    /// Fetch the nodes currently advertising `service`. An empty or
    /// wildcard service returns every known node.
    async fn get(&self, service: &str) -> Result<Vec<Node>, DiscoveryError>;

    /// Install `callback` for subsequent state changes of nodes
    /// advertising `service`.
    async fn watch(&self, service: &str, callback: WatchCallback) -> Result<(), DiscoveryError>;
}
