//! Lifecycle-event publication to the cluster event sink.

use crate::errors::SinkError;
use async_trait::async_trait;
use signal_proto::rtc::event_sink_client::EventSinkClient;
use signal_proto::rtc::ClusterEvent;
use tokio::sync::Mutex;
use tonic::transport::Endpoint;
use tracing::{debug, info, warn};

use super::registry::NeighborRegistry;

/// Consumer for peer/stream lifecycle events.
///
/// Publication is best effort: implementations log failures and never
/// propagate them into signaling.
#[async_trait]
pub trait EventDispatch: Send + Sync + 'static {
    async fn publish(&self, event: ClusterEvent);
}

type Connector = Box<dyn Fn(&str) -> Result<EventSinkClient, SinkError> + Send + Sync>;

/// Posts events to whichever neighbor advertises the sink service.
///
/// The sink node is resolved through the neighbor registry on first use
/// and the client is cached for the lifetime of the publisher. Transport
/// failures are logged and the cached client is kept; the underlying
/// channel reconnects on its own.
pub struct EventPublisher {
    registry: NeighborRegistry,
    sink_service: String,
    client: Mutex<Option<EventSinkClient>>,
    connector: Connector,
}

impl EventPublisher {
    pub fn new(registry: NeighborRegistry, sink_service: impl Into<String>) -> Self {
        Self::with_connector(registry, sink_service, Box::new(lazy_connector))
    }

    /// Publisher with an injected connector, for tests.
    pub fn with_connector(
        registry: NeighborRegistry,
        sink_service: impl Into<String>,
        connector: Connector,
    ) -> Self {
        Self {
            registry,
            sink_service: sink_service.into(),
            client: Mutex::new(None),
            connector,
        }
    }
}

fn lazy_connector(endpoint: &str) -> Result<EventSinkClient, SinkError> {
    let endpoint =
        Endpoint::from_shared(endpoint.to_string()).map_err(|e| SinkError::Endpoint(e.to_string()))?;
    Ok(EventSinkClient::new(endpoint.connect_lazy()))
}

#[async_trait]
impl EventDispatch for EventPublisher {
    async fn publish(&self, event: ClusterEvent) {
        let mut cached = self.client.lock().await;

        if cached.is_none() {
            let Some(node) = self.registry.resolve_by_service(&self.sink_service) else {
                debug!(target: "cluster", service = %self.sink_service, "no event sink node found, dropping event");
                return;
            };
            match (self.connector)(&node.endpoint) {
                Ok(client) => {
                    info!(target: "cluster", nid = %node.nid, endpoint = %node.endpoint, "connected to event sink");
                    *cached = Some(client);
                }
                Err(e) => {
                    warn!(target: "cluster", nid = %node.nid, error = %e, "event sink connection failed");
                    return;
                }
            }
        }

        if let Some(client) = cached.as_mut() {
            if let Err(status) = client.post_event(event).await {
                warn!(target: "cluster", error = %status, "posting event to sink failed");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::cluster::registry::Node;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn sink_node() -> Node {
        Node {
            dc: "dc1".to_string(),
            nid: "islb-1".to_string(),
            service: "islb".to_string(),
            // Nothing listens here; the channel is lazy so connection
            // only fails once an RPC is attempted.
            endpoint: "http://127.0.0.1:1".to_string(),
        }
    }

    fn counting_connector(counter: Arc<AtomicUsize>) -> Connector {
        Box::new(move |endpoint| {
            counter.fetch_add(1, Ordering::SeqCst);
            lazy_connector(endpoint)
        })
    }

    #[tokio::test]
    async fn test_event_dropped_when_no_sink_known() {
        let connects = Arc::new(AtomicUsize::new(0));
        let publisher = EventPublisher::with_connector(
            NeighborRegistry::new(),
            "islb",
            counting_connector(Arc::clone(&connects)),
        );

        publisher.publish(ClusterEvent::default()).await;
        assert_eq!(connects.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_client_cached_across_publishes() {
        let registry = NeighborRegistry::new();
        registry.record_up(sink_node());

        let connects = Arc::new(AtomicUsize::new(0));
        let publisher = EventPublisher::with_connector(
            registry,
            "islb",
            counting_connector(Arc::clone(&connects)),
        );

        // Both RPCs fail (nothing is listening) but the cached client
        // survives: only one connect attempt is made.
        publisher.publish(ClusterEvent::default()).await;
        publisher.publish(ClusterEvent::default()).await;
        assert_eq!(connects.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalid_endpoint_is_not_cached() {
        let registry = NeighborRegistry::new();
        let mut node = sink_node();
        node.endpoint = "not a url".to_string();
        registry.record_up(node);

        let publisher = EventPublisher::new(registry, "islb");
        // Drops the event without panicking or caching a client.
        publisher.publish(ClusterEvent::default()).await;
    }
}
