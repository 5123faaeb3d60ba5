//! Wire types for the SFU-mesh signaling control plane.
//!
//! This crate contains the Protocol Buffer message definitions and the
//! gRPC client/server plumbing used between signaling clients, media nodes
//! and the cluster event sink:
//!
//! - `rtc::RtcSignal` - one bidirectional stream per client connection,
//!   carrying join/offer/answer/ICE-trickle frames.
//! - `rtc::EventSink` - unary `PostEvent` RPC that media nodes use to push
//!   peer/stream lifecycle events to the cluster bookkeeping node.
//!
//! The message structs are hand-maintained `prost` derives and the service
//! glue is written against `tonic::codegen` in the shape `tonic-build`
//! emits, so the workspace builds without `protoc` or vendored `.proto`
//! files.

#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::must_use_candidate)]

// Re-export prost traits for convenience
pub use prost::Message;

pub mod rtc;
