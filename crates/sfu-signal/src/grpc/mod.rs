//! gRPC service implementations.

pub mod signal_service;

pub use signal_service::SignalingService;
