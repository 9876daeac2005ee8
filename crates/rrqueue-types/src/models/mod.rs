//! Configuration models for rrqueue.

pub mod config;

pub use config::{
    AppConfig, ConnectionConfig, IndexStoreConfig, MemoryConfig, QueueConfig, RotationMode,
    RoundRobinConfig,
};
