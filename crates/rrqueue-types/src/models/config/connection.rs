//! Per-connection configuration.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::enums::RotationMode;
use crate::error::ConfigError;

/// A named connection entry: a driver plus driver-specific options.
///
/// ```json
/// { "driver": "roundrobin", "connections": ["q1", "q2"], "queue": "default" }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// Driver name used to pick a connector
    pub driver: String,
    /// Remaining keys, interpreted by the connector
    #[serde(flatten)]
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl ConnectionConfig {
    pub fn new(driver: impl Into<String>) -> Self {
        Self { driver: driver.into(), options: serde_json::Map::new() }
    }

    /// Builder-style option setter.
    pub fn with_option(mut self, key: &str, value: serde_json::Value) -> Self {
        self.options.insert(key.to_string(), value);
        self
    }

    /// Deserialize the options into a driver-specific config struct.
    pub fn parse_options<T: DeserializeOwned>(&self) -> Result<T, ConfigError> {
        serde_json::from_value(serde_json::Value::Object(self.options.clone()))
            .map_err(|e| ConfigError::from_json_error(&e))
    }

    /// Round-robin connection config shorthand.
    pub fn round_robin<S: AsRef<str>>(connections: &[S], queue: &str) -> Self {
        let targets: Vec<serde_json::Value> = connections
            .iter()
            .map(|c| serde_json::Value::String(c.as_ref().to_string()))
            .collect();
        Self::new("roundrobin")
            .with_option("connections", serde_json::Value::Array(targets))
            .with_option("queue", serde_json::Value::String(queue.to_string()))
    }

    /// In-memory connection config shorthand.
    pub fn memory() -> Self {
        Self::new("memory")
    }
}

/// Options recognized by the `roundrobin` driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct RoundRobinConfig {
    /// Target connections in rotation order
    #[serde(default)]
    pub connections: Vec<String>,
    /// Queue name used when the caller does not pass one
    #[validate(length(min = 1_u64))]
    #[serde(default = "default_queue_name")]
    pub queue: String,
    /// Rotation index update strategy
    #[serde(default)]
    pub rotation: RotationMode,
}

impl Default for RoundRobinConfig {
    fn default() -> Self {
        Self { connections: Vec::new(), queue: default_queue_name(), rotation: RotationMode::default() }
    }
}

/// Options recognized by the `memory` driver.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Validate)]
pub struct MemoryConfig {
    /// Queue name used when the caller does not pass one
    #[validate(length(min = 1_u64))]
    #[serde(default = "default_queue_name")]
    pub queue: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self { queue: default_queue_name() }
    }
}

pub fn default_queue_name() -> String {
    "default".to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_robin_options_parse() {
        let json = r#"{"driver":"roundrobin","queue":"default","connections":["q1","q2"]}"#;
        let conn: ConnectionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(conn.driver, "roundrobin");

        let rr: RoundRobinConfig = conn.parse_options().unwrap();
        assert_eq!(rr.connections, vec!["q1".to_string(), "q2".to_string()]);
        assert_eq!(rr.queue, "default");
        assert_eq!(rr.rotation, RotationMode::AfterDispatch);
    }

    #[test]
    fn test_round_robin_defaults_queue_name() {
        let conn = ConnectionConfig::new("roundrobin")
            .with_option("connections", serde_json::json!(["a"]))
            .with_option("rotation", serde_json::json!("reserve"));
        let rr: RoundRobinConfig = conn.parse_options().unwrap();
        assert_eq!(rr.queue, "default");
        assert_eq!(rr.rotation, RotationMode::Reserve);
    }

    #[test]
    fn test_parse_options_reports_type_errors() {
        let conn = ConnectionConfig::new("roundrobin").with_option("connections", serde_json::json!("q1"));
        let err = conn.parse_options::<RoundRobinConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn test_empty_queue_name_fails_validation() {
        let rr = RoundRobinConfig { queue: String::new(), ..RoundRobinConfig::default() };
        assert!(rr.validate().is_err());
    }

    #[test]
    fn test_shorthand_matches_json_form() {
        let built = ConnectionConfig::round_robin(&["q1", "q2"], "default");
        let parsed: ConnectionConfig = serde_json::from_value(serde_json::json!({
            "driver": "roundrobin",
            "connections": ["q1", "q2"],
            "queue": "default",
        }))
        .unwrap();
        assert_eq!(built, parsed);
    }
}
