//! Application-level configuration.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::connection::ConnectionConfig;
use super::store::IndexStoreConfig;
use crate::error::ConfigError;

/// Named queue connections plus the default connection name.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueConfig {
    /// Connection used when a caller does not name one
    #[serde(default = "default_connection_name")]
    pub default: String,
    /// Connection name → driver config
    #[serde(default)]
    pub connections: BTreeMap<String, ConnectionConfig>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        let mut connections = BTreeMap::new();
        connections.insert(default_connection_name(), ConnectionConfig::memory());
        Self { default: default_connection_name(), connections }
    }
}

impl QueueConfig {
    /// Look up a connection entry by name.
    pub fn connection(&self, name: &str) -> Option<&ConnectionConfig> {
        self.connections.get(name)
    }

    /// Check that the default connection is defined.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.connections.contains_key(&self.default) {
            return Err(ConfigError::ValidationError {
                field: "queue.default".to_string(),
                message: format!("default connection '{}' is not defined", self.default),
            });
        }
        Ok(())
    }
}

/// Full application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    /// Queue connections
    #[serde(default)]
    pub queue: QueueConfig,
    /// Rotation index store
    #[serde(default)]
    pub store: IndexStoreConfig,
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.queue.validate()
    }
}

fn default_connection_name() -> String {
    "sync".to_string()
}
