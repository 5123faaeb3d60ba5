//! Cluster membership for one media node.

use crate::errors::DiscoveryError;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::discovery::Discovery;
use super::registry::{NeighborRegistry, Node, NodeState};

/// This node's view of the cluster: its own identity, the discovery
/// backend, and the neighbor set the backend announces.
pub struct ClusterNode<D> {
    node: Node,
    discovery: Arc<D>,
    registry: NeighborRegistry,
    shutdown: CancellationToken,
}

impl<D: Discovery> ClusterNode<D> {
    pub fn new(node: Node, discovery: Arc<D>) -> Self {
        Self {
            node,
            discovery,
            registry: NeighborRegistry::new(),
            shutdown: CancellationToken::new(),
        }
    }

    /// This node's advertised identity.
    pub fn identity(&self) -> &Node {
        &self.node
    }

    /// Handle to the neighbor set. Clones stay live as the watch
    /// callback updates it.
    pub fn registry(&self) -> NeighborRegistry {
        self.registry.clone()
    }

    /// Advertise this node to the cluster.
    pub async fn register(&self) -> Result<(), DiscoveryError> {
        info!(target: "cluster", nid = %self.node.nid, service = %self.node.service, "registering node");
        self.discovery.register(&self.node).await
    }

    /// Seed the neighbor set with the nodes currently advertising
    /// `service`, then watch for subsequent changes. Announcements for
    /// this node itself are skipped.
    pub async fn watch(&self, service: &str) -> Result<(), DiscoveryError> {
        for node in self.discovery.get(service).await? {
            self.handle_state_change(NodeState::Up, node);
        }

        let registry = self.registry.clone();
        let own_nid = self.node.nid.clone();
        self.discovery
            .watch(
                service,
                Arc::new(move |state, node| {
                    if node.nid == own_nid {
                        return;
                    }
                    registry.handle(state, node);
                }),
            )
            .await
    }

    fn handle_state_change(&self, state: NodeState, node: Node) {
        if node.nid == self.node.nid {
            return;
        }
        self.registry.handle(state, node);
    }

    /// Spawn the registration keep-alive loop. Failures are logged and
    /// the loop keeps trying; the task ends on [`close`](Self::close).
    pub fn spawn_keep_alive(&self, interval: Duration) -> JoinHandle<()> {
        let discovery = Arc::clone(&self.discovery);
        let node = self.node.clone();
        let shutdown = self.shutdown.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick fires immediately; registration already
            // happened, so skip it.
            ticker.tick().await;

            loop {
                tokio::select! {
                    () = shutdown.cancelled() => {
                        debug!(target: "cluster", nid = %node.nid, "keep-alive task stopping");
                        break;
                    }
                    _ = ticker.tick() => {
                        if let Err(e) = discovery.keep_alive(&node).await {
                            warn!(target: "cluster", nid = %node.nid, error = %e, "keep-alive failed");
                        }
                    }
                }
            }
        })
    }

    /// Stop background tasks. Idempotent.
    pub fn close(&self) {
        self.shutdown.cancel();
    }
}

impl<D> Drop for ClusterNode<D> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::cluster::discovery::WatchCallback;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct FakeDiscovery {
        seeded: Vec<Node>,
        register_calls: AtomicUsize,
        keep_alive_calls: AtomicUsize,
        callback: Mutex<Option<WatchCallback>>,
    }

    impl FakeDiscovery {
        fn announce(&self, state: NodeState, node: Node) {
            let callback = self.callback.lock().unwrap();
            if let Some(cb) = callback.as_ref() {
                cb(state, node);
            }
        }
    }

    #[async_trait]
    impl Discovery for FakeDiscovery {
        async fn register(&self, _node: &Node) -> Result<(), DiscoveryError> {
            self.register_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn keep_alive(&self, _node: &Node) -> Result<(), DiscoveryError> {
            self.keep_alive_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn get(&self, _service: &str) -> Result<Vec<Node>, DiscoveryError> {
            Ok(self.seeded.clone())
        }

        async fn watch(
            &self,
            _service: &str,
            callback: WatchCallback,
        ) -> Result<(), DiscoveryError> {
            *self.callback.lock().unwrap() = Some(callback);
            Ok(())
        }
    }

    fn node(nid: &str, service: &str) -> Node {
        Node {
            dc: "dc1".to_string(),
            nid: nid.to_string(),
            service: service.to_string(),
            endpoint: format!("http://{nid}:5551"),
        }
    }

    #[tokio::test]
    async fn test_watch_seeds_then_tracks_changes() {
        let discovery = Arc::new(FakeDiscovery {
            seeded: vec![node("islb-1", "islb")],
            ..FakeDiscovery::default()
        });
        let cluster = ClusterNode::new(node("sfu-1", "sfu"), Arc::clone(&discovery));

        cluster.watch("").await.unwrap();
        assert_eq!(cluster.registry().len(), 1);

        discovery.announce(NodeState::Up, node("sfu-2", "sfu"));
        assert_eq!(cluster.registry().len(), 2);

        discovery.announce(NodeState::Down, node("islb-1", "islb"));
        assert!(cluster.registry().resolve_by_service("islb").is_none());
    }

    #[tokio::test]
    async fn test_watch_skips_own_announcements() {
        let discovery = Arc::new(FakeDiscovery {
            seeded: vec![node("sfu-1", "sfu")],
            ..FakeDiscovery::default()
        });
        let cluster = ClusterNode::new(node("sfu-1", "sfu"), Arc::clone(&discovery));

        cluster.watch("sfu").await.unwrap();
        assert!(cluster.registry().is_empty());

        discovery.announce(NodeState::Up, node("sfu-1", "sfu"));
        assert!(cluster.registry().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_keep_alive_ticks_until_closed() {
        let discovery = Arc::new(FakeDiscovery::default());
        let cluster = ClusterNode::new(node("sfu-1", "sfu"), Arc::clone(&discovery));

        let handle = cluster.spawn_keep_alive(Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(16)).await;
        assert_eq!(discovery.keep_alive_calls.load(Ordering::SeqCst), 3);

        cluster.close();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_register_delegates_to_backend() {
        let discovery = Arc::new(FakeDiscovery::default());
        let cluster = ClusterNode::new(node("sfu-1", "sfu"), Arc::clone(&discovery));

        cluster.register().await.unwrap();
        assert_eq!(discovery.register_calls.load(Ordering::SeqCst), 1);
    }
}
