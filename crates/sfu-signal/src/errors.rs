//! Error types for the signaling node.
//!
//! Session-fatal conditions are surfaced to clients as `tonic::Status`
//! directly; recoverable negotiation failures travel in-band as `Error`
//! frames and never appear here. These types cover everything else:
//! configuration, discovery, and event publication.

use thiserror::Error;

/// Top-level error for node construction and cluster plumbing.
#[derive(Debug, Error)]
pub enum SignalError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A gRPC endpoint could not be parsed or dialed.
    #[error("Endpoint error: {0}")]
    Endpoint(String),

    /// Discovery backend failure.
    #[error("Discovery error: {0}")]
    Discovery(#[from] DiscoveryError),

    /// Event sink publication failure.
    #[error("Event sink error: {0}")]
    Sink(#[from] SinkError),
}

/// Errors from the node-discovery backend.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Initial registration with the discovery service failed.
    #[error("Registration failed: {0}")]
    Registration(String),

    /// A keep-alive refresh failed.
    #[error("Keep-alive failed: {0}")]
    KeepAlive(String),

    /// Fetching or watching the node set failed.
    #[error("Watch failed: {0}")]
    Watch(String),
}

/// Errors from posting lifecycle events to the cluster event sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// No node advertising the sink service is currently known.
    #[error("No event sink node available")]
    NoSink,

    /// The sink endpoint could not be constructed.
    #[error("Invalid sink endpoint: {0}")]
    Endpoint(String),

    /// The `PostEvent` RPC failed.
    #[error("PostEvent failed: {0}")]
    Rpc(#[from] tonic::Status),
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_display_formatting() {
        assert_eq!(
            format!("{}", SignalError::Config("missing node id".to_string())),
            "Configuration error: missing node id"
        );

        assert_eq!(
            format!(
                "{}",
                SignalError::Discovery(DiscoveryError::KeepAlive("timeout".to_string()))
            ),
            "Discovery error: Keep-alive failed: timeout"
        );

        assert_eq!(
            format!("{}", SinkError::NoSink),
            "No event sink node available"
        );
    }

    #[test]
    fn test_sink_error_wraps_status() {
        let err = SinkError::from(tonic::Status::unavailable("sink down"));
        assert!(matches!(err, SinkError::Rpc(_)));
        assert!(format!("{err}").contains("sink down"));
    }
}
