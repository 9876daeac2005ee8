//! Application, queue, and index store configuration models.

mod app;
mod connection;
mod enums;
mod store;

pub use app::{AppConfig, QueueConfig};
pub use connection::{default_queue_name, ConnectionConfig, MemoryConfig, RoundRobinConfig};
pub use enums::RotationMode;
pub use store::IndexStoreConfig;
