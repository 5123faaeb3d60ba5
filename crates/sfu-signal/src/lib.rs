//! Signaling and cluster coordination for an SFU media node.
//!
//! This library implements the control plane of a mesh of selective
//! forwarding units: the per-connection signaling session driving a
//! pluggable media engine, the room layer that fans presence, stream
//! and message events out to co-located peers, and the cluster layer
//! that tracks neighbor nodes through a discovery backend and posts
//! lifecycle events to the mesh's bookkeeping node.
//!
//! Media transport (ICE/DTLS/SRTP), the discovery backend and process
//! bootstrap live with the embedder; they appear here only as the
//! [`media::MediaEngine`], [`cluster::Discovery`] and
//! [`cluster::EventDispatch`] trait seams.

pub mod cluster;
pub mod config;
pub mod errors;
pub mod grpc;
pub mod media;
pub mod room;
pub mod signal;

pub use config::Config;
pub use errors::SignalError;
