//! Node configuration.
//!
//! Loaded from environment variables with sensible defaults; tests
//! inject a `HashMap` instead of touching the process environment.

use std::collections::HashMap;
use std::env;
use std::time::Duration;
use thiserror::Error;

use crate::cluster::Node;
use crate::errors::SignalError;

/// Default service tag this node advertises.
pub const DEFAULT_SERVICE: &str = "sfu";

/// Default service tag of the cluster event sink.
pub const DEFAULT_EVENT_SINK_SERVICE: &str = "islb";

/// Default gRPC bind address for the signaling service.
pub const DEFAULT_GRPC_BIND_ADDRESS: &str = "0.0.0.0:5551";

/// Default data center identifier.
pub const DEFAULT_DC: &str = "dc1";

/// Default discovery keep-alive interval in seconds.
pub const DEFAULT_KEEPALIVE_INTERVAL_SECONDS: u64 = 5;

/// Default node id prefix for auto-generated ids.
pub const DEFAULT_NODE_ID_PREFIX: &str = "sfu";

/// Signaling node configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Unique identifier for this node. Auto-generated as
    /// `sfu-<hostname>-<uuid8>` when unset.
    pub node_id: String,

    /// Data center / zone identifier (default: "dc1").
    pub dc: String,

    /// Service tag advertised through discovery (default: "sfu").
    pub service: String,

    /// Service tag of the node consuming lifecycle events (default: "islb").
    pub event_sink_service: String,

    /// URL of the discovery backend.
    pub discovery_url: String,

    /// Signaling gRPC bind address (default: "0.0.0.0:5551").
    pub grpc_bind_address: String,

    /// Endpoint other nodes use to reach this one. Defaults to the
    /// bind address with an `http://` scheme.
    pub advertise_endpoint: String,

    /// Discovery keep-alive interval (default: 5s).
    pub keepalive_interval: Duration,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

impl From<ConfigError> for SignalError {
    fn from(err: ConfigError) -> Self {
        SignalError::Config(err.to_string())
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a `HashMap` (for testing).
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let discovery_url = vars
            .get("SFU_DISCOVERY_URL")
            .ok_or_else(|| ConfigError::MissingEnvVar("SFU_DISCOVERY_URL".to_string()))?
            .clone();

        let dc = vars
            .get("SFU_DC")
            .cloned()
            .unwrap_or_else(|| DEFAULT_DC.to_string());

        let service = vars
            .get("SFU_SERVICE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_SERVICE.to_string());

        let event_sink_service = vars
            .get("SFU_EVENT_SINK_SERVICE")
            .cloned()
            .unwrap_or_else(|| DEFAULT_EVENT_SINK_SERVICE.to_string());

        let grpc_bind_address = vars
            .get("SFU_GRPC_BIND_ADDRESS")
            .cloned()
            .unwrap_or_else(|| DEFAULT_GRPC_BIND_ADDRESS.to_string());

        let advertise_endpoint = vars
            .get("SFU_ADVERTISE_ENDPOINT")
            .cloned()
            .unwrap_or_else(|| format!("http://{grpc_bind_address}"));

        let keepalive_seconds = match vars.get("SFU_KEEPALIVE_INTERVAL_SECONDS") {
            Some(raw) => raw.parse().map_err(|_| {
                ConfigError::InvalidValue(format!(
                    "SFU_KEEPALIVE_INTERVAL_SECONDS must be an integer, got {raw:?}"
                ))
            })?,
            None => DEFAULT_KEEPALIVE_INTERVAL_SECONDS,
        };

        let node_id = vars.get("SFU_NODE_ID").cloned().unwrap_or_else(|| {
            let hostname = env::var("HOSTNAME").unwrap_or_else(|_| "unknown".to_string());
            let uuid_suffix = uuid::Uuid::new_v4().to_string();
            let short_suffix = uuid_suffix.get(..8).unwrap_or("00000000");
            format!("{DEFAULT_NODE_ID_PREFIX}-{hostname}-{short_suffix}")
        });

        Ok(Config {
            node_id,
            dc,
            service,
            event_sink_service,
            discovery_url,
            grpc_bind_address,
            advertise_endpoint,
            keepalive_interval: Duration::from_secs(keepalive_seconds),
        })
    }

    /// The identity this node advertises through discovery.
    pub fn local_node(&self) -> Node {
        Node {
            dc: self.dc.clone(),
            nid: self.node_id.clone(),
            service: self.service.clone(),
            endpoint: self.advertise_endpoint.clone(),
        }
    }
}
