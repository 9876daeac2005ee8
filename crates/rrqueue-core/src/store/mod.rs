//! Rotation index stores.
//!
//! A round-robin connection keeps a single integer per connection name: the
//! index of the target to use for the next push. The value lives outside the
//! dispatcher so every process sharing a store continues the same rotation.

mod file;
mod memory;
mod sqlite;

pub use file::FileIndexStore;
pub use memory::MemoryIndexStore;
pub use sqlite::SqliteIndexStore;

use async_trait::async_trait;
use rrqueue_types::{IndexStoreConfig, StoreError};
use std::sync::Arc;

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub const ROTATION_KEY_PREFIX: &str = "round-robin-queue";

/// Store key holding the rotation index of `connection`.
pub fn rotation_key(connection: &str) -> String {
    format!("{}-{}", ROTATION_KEY_PREFIX, connection)
}

/// `value mod modulus`, rejecting a zero modulus instead of panicking.
pub(crate) fn wrap(key: &str, value: u64, modulus: u64) -> StoreResult<u64> {
    value.checked_rem(modulus).ok_or_else(|| zero_modulus(key))
}

pub(crate) fn zero_modulus(key: &str) -> StoreError {
    StoreError::Corrupt {
        key: key.to_string(),
        message: "rotation modulus must be non-zero".to_string(),
    }
}

/// Key-value store for rotation indexes. Entries never expire.
#[async_trait]
pub trait IndexStore: Send + Sync {
    /// Short identifier for logs ("memory", "file", "sqlite").
    fn kind(&self) -> &'static str;

    async fn get(&self, key: &str, default: u64) -> StoreResult<u64>;

    async fn set(&self, key: &str, value: u64) -> StoreResult<()>;

    /// Claim the current slot: returns `stored mod modulus` and stores the
    /// slot after it.
    ///
    /// The default is a plain get followed by a set. Stores that can do this
    /// atomically override it.
    async fn reserve(&self, key: &str, modulus: u64) -> StoreResult<u64> {
        let current = wrap(key, self.get(key, 0).await?, modulus)?;
        self.set(key, wrap(key, current + 1, modulus)?).await?;
        Ok(current)
    }

    /// Whether `reserve` is atomic for every process sharing this store.
    fn is_atomic(&self) -> bool {
        false
    }
}

/// Build the index store described by `config`.
pub fn open_index_store(config: &IndexStoreConfig) -> StoreResult<Arc<dyn IndexStore>> {
    let store: Arc<dyn IndexStore> = match config {
        IndexStoreConfig::Memory => Arc::new(MemoryIndexStore::new()),
        IndexStoreConfig::File { path } => Arc::new(FileIndexStore::new(path.clone())),
        IndexStoreConfig::Sqlite { path } => Arc::new(SqliteIndexStore::open(path)?),
    };
    tracing::info!(kind = store.kind(), "Rotation index store opened");
    Ok(store)
}
