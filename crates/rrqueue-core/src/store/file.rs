//! JSON file index store.

use async_trait::async_trait;
use rrqueue_types::StoreError;
use std::collections::BTreeMap;
use std::path::PathBuf;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{wrap, IndexStore, StoreResult};

/// Index store persisted as a JSON object of `key → index`.
///
/// Writes go to a uniquely named temp file that is renamed over the current
/// one. The mutex serializes read-modify-write cycles within one process only,
/// so `reserve` is not atomic across processes.
pub struct FileIndexStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileIndexStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path, lock: Mutex::new(()) }
    }

    async fn read_all(&self) -> StoreResult<BTreeMap<String, u64>> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StoreError::from_io_error(&e)),
        };
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }

        serde_json::from_str(&content).map_err(|e| StoreError::Corrupt {
            key: self.path.display().to_string(),
            message: e.to_string(),
        })
    }

    async fn write_all(&self, values: &BTreeMap<String, u64>) -> StoreResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| StoreError::from_io_error(&e))?;
        }

        let json = serde_json::to_string_pretty(values)
            .map_err(|e| StoreError::Unavailable { message: format!("JSON serialize: {}", e) })?;

        // Each write gets its own temp file so writers in other processes never
        // rename ours away.
        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, json).await.map_err(|e| StoreError::from_io_error(&e))?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(StoreError::from_io_error(&e));
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map_or_else(|| "index".into(), |n| n.to_string_lossy().into_owned());
        self.path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4().simple()))
    }
}

#[async_trait]
impl IndexStore for FileIndexStore {
    fn kind(&self) -> &'static str {
        "file"
    }

    async fn get(&self, key: &str, default: u64) -> StoreResult<u64> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.get(key).copied().unwrap_or(default))
    }

    async fn set(&self, key: &str, value: u64) -> StoreResult<()> {
        let _guard = self.lock.lock().await;
        let mut values = self.read_all().await?;
        values.insert(key.to_string(), value);
        self.write_all(&values).await
    }

    async fn reserve(&self, key: &str, modulus: u64) -> StoreResult<u64> {
        let _guard = self.lock.lock().await;
        let mut values = self.read_all().await?;
        let current = wrap(key, values.get(key).copied().unwrap_or(0), modulus)?;
        values.insert(key.to_string(), wrap(key, current + 1, modulus)?);
        self.write_all(&values).await?;
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_reads_as_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileIndexStore::new(dir.path().join("index.json"));
        assert_eq!(store.get("round-robin-queue-rr", 0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("index.json");

        let store = FileIndexStore::new(path.clone());
        store.set("a", 1).await.unwrap();
        store.set("b", 5).await.unwrap();
        drop(store);

        let reopened = FileIndexStore::new(path);
        assert_eq!(reopened.get("a", 0).await.unwrap(), 1);
        assert_eq!(reopened.get("b", 0).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_reserve_advances_and_wraps() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileIndexStore::new(dir.path().join("index.json"));

        assert_eq!(store.reserve("k", 2).await.unwrap(), 0);
        assert_eq!(store.reserve("k", 2).await.unwrap(), 1);
        assert_eq!(store.reserve("k", 2).await.unwrap(), 0);
        assert_eq!(store.get("k", 9).await.unwrap(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stores_sharing_a_path_write_concurrently() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");

        let mut handles = Vec::new();
        for worker in 0..4_u64 {
            let store = FileIndexStore::new(path.clone());
            handles.push(tokio::spawn(async move {
                let key = format!("round-robin-queue-w{}", worker);
                for i in 0..50 {
                    store.set(&key, i).await?;
                    store.get(&key, 0).await?;
                }
                Ok::<_, StoreError>(())
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        // Only the index file is left behind.
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .filter(|name| name != "index.json")
            .collect();
        assert!(leftovers.is_empty(), "temp files left: {:?}", leftovers);

        let store = FileIndexStore::new(path);
        assert!(store.get("round-robin-queue-w0", 0).await.is_ok());
        assert!(!store.is_atomic());
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileIndexStore::new(path);
        assert!(matches!(store.get("k", 0).await, Err(StoreError::Corrupt { .. })));
    }
}
