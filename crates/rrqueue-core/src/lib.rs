//! # rrqueue Core
//!
//! Round-robin dispatch of queue operations across a fixed set of backends.
//!
//! ```text
//! rrqueue-core/src/
//! ├── backend/      # Backend trait, lookup, in-memory queue
//! ├── store/        # Rotation index stores (memory, file, sqlite)
//! ├── dispatcher/   # RoundRobinQueue
//! ├── connector.rs  # Driver name → backend construction
//! ├── manager.rs    # Lazily resolved, cached connections
//! └── config.rs     # Config file loading
//! ```

#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

pub mod backend;
pub mod config;
pub mod connector;
pub mod dispatcher;
pub mod manager;
pub mod store;

pub use backend::{Backend, BackendLookup, Delay, Job, MemoryQueue, PushOptions, StaticLookup};
pub use connector::{connect_round_robin, ConnectContext, Connector, MemoryConnector};
pub use dispatcher::RoundRobinQueue;
pub use manager::QueueManager;
pub use rrqueue_types::{QueueError, Result};
pub use store::{
    open_index_store, rotation_key, FileIndexStore, IndexStore, MemoryIndexStore, SqliteIndexStore,
};
