//! Backend-related errors.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from resolving a connection or running an operation on it.
#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "details")]
pub enum BackendError {
    /// Connection name is not present in the queue config
    #[error("Queue connection [{name}] is not defined")]
    UnknownConnection { name: String },

    /// The component resolving connections has been dropped
    #[error("Queue manager is no longer available to resolve [{name}]")]
    ManagerUnavailable { name: String },

    /// The backend rejected or failed the operation
    #[error("Operation {operation} failed on [{connection}]: {message}")]
    Operation { connection: String, operation: String, message: String },
}
