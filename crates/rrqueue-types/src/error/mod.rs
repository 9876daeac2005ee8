//! Typed error definitions for rrqueue.
//!
//! Errors are grouped by domain:
//!
//! - [`ConfigError`] for misconfigured topologies and unreadable config files
//! - [`BackendError`] for connection lookup and forwarded backend operations
//! - [`StoreError`] for the rotation index store
//!
//! [`QueueError`] wraps all of them so a single `?` works across layers.

mod backend;
mod config;
mod store;

pub use backend::BackendError;
pub use config::ConfigError;
pub use store::StoreError;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type that wraps all domain-specific errors.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "domain", content = "error")]
pub enum QueueError {
    /// Wraps a configuration error
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Wraps a backend lookup or backend operation error
    #[error("Backend error: {0}")]
    Backend(#[from] BackendError),

    /// Wraps an index store error
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl QueueError {
    /// Check if this error signals a misconfigured topology.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::Config(_))
    }

    /// Check if this is the self-referencing dispatcher error.
    pub fn is_infinite_recursion(&self) -> bool {
        matches!(self, Self::Config(ConfigError::InfiniteRecursion { .. }))
    }
}

/// Standard Result type using QueueError.
pub type Result<T> = std::result::Result<T, QueueError>;
