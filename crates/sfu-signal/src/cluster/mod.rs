//! Cluster membership and event publication.
//!
//! A media node participates in the mesh three ways: it registers itself
//! with the discovery backend and keeps that registration alive, it
//! tracks the neighbor nodes the backend announces, and it pushes peer
//! and stream lifecycle events to whichever neighbor advertises the
//! event-sink service.

pub mod discovery;
pub mod node;
pub mod publisher;
pub mod registry;

pub use discovery::{Discovery, WatchCallback};
pub use node::ClusterNode;
pub use publisher::{EventDispatch, EventPublisher};
pub use registry::{NeighborRegistry, Node, NodeState};
