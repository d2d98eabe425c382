//! Configuration of the graph store connection
//!
//! Loaded from environment variables (and a `.env` file when present).

use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::adapters::{EmbeddedGraphStore, RemoteGraphStore, RemoteGraphStoreConfig};
use crate::data::StoreError;
use crate::traits::GraphStore;
use crate::traversal::{GraphTraversalSource, PartitionStrategy};

/// Which graph engine to run traversals against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreMode {
    /// In-process engine, executing synchronously
    Embedded,
    /// Managed graph service reached over HTTP
    Remote,
}

impl std::str::FromStr for StoreMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "embedded" | "local" => Ok(StoreMode::Embedded),
            "remote" => Ok(StoreMode::Remote),
            other => Err(format!("unknown store mode: {}", other)),
        }
    }
}

/// Graph store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default = "default_mode")]
    pub mode: StoreMode,

    /// Base URL of the remote graph service
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Property carrying the partition name on every element
    #[serde(default = "default_partition_key")]
    pub partition_key: String,

    /// Partition all traversals are confined to
    #[serde(default = "default_partition_name")]
    pub partition_name: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// Idle HTTP connections kept to the remote service
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

fn default_mode() -> StoreMode {
    StoreMode::Embedded
}

fn default_endpoint() -> String {
    "http://localhost:8182".to_string()
}

fn default_partition_key() -> String {
    "_partition".to_string()
}

fn default_partition_name() -> String {
    "default".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_max_connections() -> usize {
    5
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            mode: default_mode(),
            endpoint: default_endpoint(),
            partition_key: default_partition_key(),
            partition_name: default_partition_name(),
            request_timeout: default_request_timeout(),
            max_connections: default_max_connections(),
        }
    }
}

impl GraphConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from an arbitrary variable source. Invalid values
    /// are logged and the default is kept.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(mode) = lookup("GRAPH_STORE_MODE") {
            match mode.parse::<StoreMode>() {
                Ok(mode) => config.mode = mode,
                Err(_) => warn!("Invalid GRAPH_STORE_MODE value: {}", mode),
            }
        }

        if let Some(endpoint) = lookup("GRAPH_ENDPOINT") {
            config.endpoint = endpoint;
        }

        if let Some(key) = lookup("GRAPH_PARTITION_KEY") {
            if key.trim().is_empty() {
                warn!("Empty GRAPH_PARTITION_KEY value, keeping {}", config.partition_key);
            } else {
                config.partition_key = key;
            }
        }

        if let Some(name) = lookup("GRAPH_PARTITION_NAME") {
            config.partition_name = name;
        }

        if let Some(timeout) = lookup("GRAPH_REQUEST_TIMEOUT_SECS") {
            if let Ok(secs) = timeout.parse::<u64>() {
                config.request_timeout = Duration::from_secs(secs);
            } else {
                warn!("Invalid GRAPH_REQUEST_TIMEOUT_SECS value: {}", timeout);
            }
        }

        if let Some(max_connections) = lookup("GRAPH_MAX_CONNECTIONS") {
            match max_connections.parse::<usize>() {
                Ok(n) if n > 0 => config.max_connections = n,
                _ => warn!("Invalid GRAPH_MAX_CONNECTIONS value: {}", max_connections),
            }
        }

        config
    }

    pub fn partition_strategy(&self) -> PartitionStrategy {
        PartitionStrategy::new(&self.partition_key, &self.partition_name)
    }
}

/// Builds the configured store.
pub fn connect(config: &GraphConfig) -> Result<Arc<dyn GraphStore>, StoreError> {
    let store: Arc<dyn GraphStore> = match config.mode {
        StoreMode::Embedded => {
            info!("Using embedded graph store");
            Arc::new(EmbeddedGraphStore::new())
        }
        StoreMode::Remote => {
            info!(endpoint = %config.endpoint, "Using remote graph store");
            Arc::new(RemoteGraphStore::new(RemoteGraphStoreConfig {
                endpoint: config.endpoint.clone(),
                timeout_secs: config.request_timeout.as_secs(),
                max_connections: config.max_connections,
            })?)
        }
    };
    Ok(store)
}

/// Builds the configured store and a traversal source confined to the
/// configured partition.
pub fn traversal_source(config: &GraphConfig) -> Result<GraphTraversalSource, StoreError> {
    Ok(GraphTraversalSource::new(connect(config)?).with_partition(config.partition_strategy()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = GraphConfig::from_lookup(lookup(&[]));
        assert_eq!(config, GraphConfig::default());
        assert_eq!(config.mode, StoreMode::Embedded);
        assert_eq!(config.partition_key, "_partition");
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.max_connections, 5);
    }

    #[test]
    fn test_overrides() {
        let config = GraphConfig::from_lookup(lookup(&[
            ("GRAPH_STORE_MODE", "Remote"),
            ("GRAPH_ENDPOINT", "https://graph.internal:8182"),
            ("GRAPH_PARTITION_NAME", "tenant-a"),
            ("GRAPH_REQUEST_TIMEOUT_SECS", "5"),
            ("GRAPH_MAX_CONNECTIONS", "16"),
        ]));
        assert_eq!(config.mode, StoreMode::Remote);
        assert_eq!(config.endpoint, "https://graph.internal:8182");
        assert_eq!(config.partition_strategy(), PartitionStrategy::new("_partition", "tenant-a"));
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.max_connections, 16);
    }

    #[test]
    fn test_invalid_values_keep_defaults() {
        let config = GraphConfig::from_lookup(lookup(&[
            ("GRAPH_STORE_MODE", "tinkergraph"),
            ("GRAPH_PARTITION_KEY", " "),
            ("GRAPH_REQUEST_TIMEOUT_SECS", "soon"),
            ("GRAPH_MAX_CONNECTIONS", "0"),
        ]));
        assert_eq!(config, GraphConfig::default());
    }

    #[test]
    fn test_connect_builds_both_modes() {
        assert!(connect(&GraphConfig::default()).is_ok());
        let remote = GraphConfig {
            mode: StoreMode::Remote,
            ..GraphConfig::default()
        };
        assert!(connect(&remote).is_ok());
    }
}
