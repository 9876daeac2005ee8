//! SQLite index store.

use async_trait::async_trait;
use parking_lot::Mutex;
use rrqueue_types::StoreError;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use super::{wrap, IndexStore, StoreResult};

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Index store backed by a `rotation_index` table.
///
/// `reserve` runs inside an immediate transaction, so it is atomic across
/// every process that opens the same database file.
pub struct SqliteIndexStore {
    conn: Arc<Mutex<Connection>>,
}

fn unavailable(err: rusqlite::Error) -> StoreError {
    StoreError::Unavailable { message: err.to_string() }
}

fn to_index(key: &str, raw: i64) -> StoreResult<u64> {
    u64::try_from(raw).map_err(|_| StoreError::Corrupt {
        key: key.to_string(),
        message: format!("negative index {}", raw),
    })
}

fn to_raw(key: &str, value: u64) -> StoreResult<i64> {
    i64::try_from(value).map_err(|_| StoreError::Corrupt {
        key: key.to_string(),
        message: format!("index {} exceeds SQLite integer range", value),
    })
}

fn read_index(conn: &Connection, key: &str) -> StoreResult<Option<u64>> {
    conn.query_row("SELECT value FROM rotation_index WHERE key = ?1", params![key], |row| {
        row.get::<_, i64>(0)
    })
    .optional()
    .map_err(unavailable)?
    .map(|raw| to_index(key, raw))
    .transpose()
}

fn write_index(conn: &Connection, key: &str, value: u64) -> StoreResult<()> {
    let _rows_affected: usize = conn
        .execute(
            "INSERT INTO rotation_index (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, to_raw(key, value)?],
        )
        .map_err(unavailable)?;
    Ok(())
}

impl SqliteIndexStore {
    /// Open (or create) the database at `path` and ensure the schema exists.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::from_io_error(&e))?;
        }
        let conn = Connection::open(path).map_err(unavailable)?;
        Self::init(conn)
    }

    /// Private in-memory database, mostly useful for tests.
    pub fn open_in_memory() -> StoreResult<Self> {
        Self::init(Connection::open_in_memory().map_err(unavailable)?)
    }

    fn init(conn: Connection) -> StoreResult<Self> {
        conn.busy_timeout(BUSY_TIMEOUT).map_err(unavailable)?;
        let _rows_affected: usize = conn
            .execute(
                "CREATE TABLE IF NOT EXISTS rotation_index (
                    key TEXT PRIMARY KEY,
                    value INTEGER NOT NULL
                )",
                [],
            )
            .map_err(unavailable)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    async fn with_connection<T, F>(&self, f: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> StoreResult<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let mut guard = conn.lock();
            f(&mut guard)
        })
        .await
        .map_err(|e| StoreError::Unavailable { message: format!("spawn_blocking panicked: {}", e) })?
    }
}

#[async_trait]
impl IndexStore for SqliteIndexStore {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    async fn get(&self, key: &str, default: u64) -> StoreResult<u64> {
        let key = key.to_string();
        self.with_connection(move |conn| Ok(read_index(conn, &key)?.unwrap_or(default))).await
    }

    async fn set(&self, key: &str, value: u64) -> StoreResult<()> {
        let key = key.to_string();
        self.with_connection(move |conn| write_index(conn, &key, value)).await
    }

    async fn reserve(&self, key: &str, modulus: u64) -> StoreResult<u64> {
        let key = key.to_string();
        self.with_connection(move |conn| {
            let tx = conn
                .transaction_with_behavior(TransactionBehavior::Immediate)
                .map_err(unavailable)?;
            let current = wrap(&key, read_index(&tx, &key)?.unwrap_or(0), modulus)?;
            write_index(&tx, &key, wrap(&key, current + 1, modulus)?)?;
            tx.commit().map_err(unavailable)?;
            Ok(current)
        })
        .await
    }

    fn is_atomic(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_round_trip() {
        let store = SqliteIndexStore::open_in_memory().unwrap();
        assert_eq!(store.get("k", 3).await.unwrap(), 3);

        store.set("k", 1).await.unwrap();
        store.set("k", 2).await.unwrap();
        assert_eq!(store.get("k", 0).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_two_handles_share_rotation() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("index.db");
        let a = SqliteIndexStore::open(&path).unwrap();
        let b = SqliteIndexStore::open(&path).unwrap();

        assert_eq!(a.reserve("k", 3).await.unwrap(), 0);
        assert_eq!(b.reserve("k", 3).await.unwrap(), 1);
        assert_eq!(a.reserve("k", 3).await.unwrap(), 2);
        assert_eq!(b.get("k", 0).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_stale_index_wraps_on_reserve() {
        let store = SqliteIndexStore::open_in_memory().unwrap();
        store.set("k", 11).await.unwrap();
        assert_eq!(store.reserve("k", 4).await.unwrap(), 3);
        assert_eq!(store.get("k", 0).await.unwrap(), 0);
    }
}
