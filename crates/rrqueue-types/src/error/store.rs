//! Index store errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading or writing the rotation index.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum StoreError {
    /// Underlying storage could not be reached (IO, database, lock poisoned)
    #[error("Index store unavailable: {message}")]
    Unavailable { message: String },

    /// Stored value for a key could not be interpreted as an index
    #[error("Corrupt index for key {key}: {message}")]
    Corrupt { key: String, message: String },
}

impl StoreError {
    /// Create an unavailable error from an IO error.
    pub fn from_io_error(e: &std::io::Error) -> Self {
        Self::Unavailable { message: e.to_string() }
    }
}
