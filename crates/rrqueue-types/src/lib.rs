//! # rrqueue Types
//!
//! Error definitions and configuration models shared by the rrqueue crates.
//!
//! - **`error`** - Typed error hierarchy for configuration, backends, and index stores
//! - **`models`** - Queue, connection, and index store configuration
//!
//! ## Architecture Role
//!
//! `rrqueue-types` sits at the bottom of the dependency graph:
//!
//! ```text
//!          rrqueue-types (this crate)
//!                  │
//!                  ▼
//!            rrqueue-core
//!                  │
//!                  ▼
//!             rrqueue-cli
//! ```
//!
//! All types are designed to be:
//! - **Serializable** via serde for config files and CLI output
//! - **Clone** for cheap sharing across async boundaries
//! - **PartialEq** for testing and comparison

pub mod error;
pub mod models;

// Re-export error types for convenience
pub use error::{BackendError, ConfigError, QueueError, Result, StoreError};

// Re-export core model types
pub use models::{
    AppConfig, ConnectionConfig, IndexStoreConfig, MemoryConfig, QueueConfig, RotationMode,
    RoundRobinConfig,
};
