//! Configuration-related errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by misconfigured connections or unreadable config files.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum ConfigError {
    /// Config file parse error (JSON)
    #[error("Config parse error: {message}")]
    ParseError {
        /// Description of the parse failure
        message: String,
    },

    /// Config validation error (invalid values)
    #[error("Config validation error for {field}: {message}")]
    ValidationError {
        /// Name of the field that failed validation
        field: String,
        /// Description of the validation failure
        message: String,
    },

    /// Config write error (permission denied, disk full, etc)
    #[error("Config write error: {message}")]
    WriteError {
        /// Description of the write failure
        message: String,
    },

    /// A round-robin connection was configured without any target connections
    #[error("Round robin connection '{connection}' has no target connections")]
    EmptyConnections {
        /// Name of the round-robin connection
        connection: String,
    },

    /// A round-robin connection lists itself as one of its targets
    #[error("Round robin connection '{connection}' must not have itself as target connection")]
    InfiniteRecursion {
        /// Name of the round-robin connection
        connection: String,
    },

    /// No connector is registered for the requested driver
    #[error("Unsupported queue driver '{driver}' for connection '{connection}'")]
    UnknownDriver {
        /// Driver named in the connection config
        driver: String,
        /// Connection that requested the driver
        connection: String,
    },
}

impl ConfigError {
    /// Create a parse error from a serde_json error.
    pub fn from_json_error(e: &serde_json::Error) -> Self {
        Self::ParseError { message: e.to_string() }
    }

    /// Create a write error from an IO error.
    pub fn from_io_error(e: &std::io::Error) -> Self {
        Self::WriteError { message: e.to_string() }
    }

    /// Flatten `validator` errors into a single validation error.
    pub fn from_validation_errors(e: &validator::ValidationErrors) -> Self {
        let field = e
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());
        Self::ValidationError { field, message: e.to_string() }
    }
}
