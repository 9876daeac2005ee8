use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::BTreeMap;

use super::{wrap, zero_modulus, IndexStore, StoreResult};

/// Process-local index store.
#[derive(Debug, Default)]
pub struct MemoryIndexStore {
    values: DashMap<String, u64>,
}

impl MemoryIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Sorted copy of every stored key and value.
    pub fn snapshot(&self) -> BTreeMap<String, u64> {
        self.values.iter().map(|e| (e.key().clone(), *e.value())).collect()
    }
}

#[async_trait]
impl IndexStore for MemoryIndexStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str, default: u64) -> StoreResult<u64> {
        Ok(self.values.get(key).map_or(default, |v| *v))
    }

    async fn set(&self, key: &str, value: u64) -> StoreResult<()> {
        self.values.insert(key.to_string(), value);
        Ok(())
    }

    async fn reserve(&self, key: &str, modulus: u64) -> StoreResult<u64> {
        if modulus == 0 {
            return Err(zero_modulus(key));
        }
        // The entry guard holds the shard lock for the whole read-modify-write.
        let mut entry = self.values.entry(key.to_string()).or_insert(0);
        let current = wrap(key, *entry, modulus)?;
        *entry = wrap(key, current + 1, modulus)?;
        Ok(current)
    }

    fn is_atomic(&self) -> bool {
        true
    }
}
