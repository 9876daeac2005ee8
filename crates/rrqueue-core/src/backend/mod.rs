//! Backend capability trait and connection lookup.

mod memory;

pub use memory::MemoryQueue;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rrqueue_types::{BackendError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Opaque per-push options forwarded to `push_raw`.
pub type PushOptions = serde_json::Map<String, serde_json::Value>;

/// How long a delayed job waits before it becomes available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    Seconds(u64),
    Duration(Duration),
    At(DateTime<Utc>),
}

impl Delay {
    /// Point in time the job becomes available, relative to `now`.
    pub fn available_at(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match *self {
            Self::Seconds(secs) => Self::Duration(Duration::from_secs(secs)).available_at(now),
            Self::Duration(d) => chrono::Duration::from_std(d)
                .ok()
                .and_then(|d| now.checked_add_signed(d))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            Self::At(at) => at,
        }
    }
}

/// A job as stored by a backend that holds jobs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub payload: serde_json::Value,
    pub queue: String,
    pub attempts: u32,
    pub available_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Operations every queue connection supports.
///
/// `queue` is the target queue on that connection; `None` means the
/// connection's own default.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Name this connection is registered under.
    fn connection_name(&self) -> &str;

    async fn size(&self, queue: Option<&str>) -> Result<u64>;

    async fn push(
        &self,
        job: &str,
        payload: &serde_json::Value,
        queue: Option<&str>,
    ) -> Result<serde_json::Value>;

    async fn push_raw(
        &self,
        payload: &str,
        queue: Option<&str>,
        options: &PushOptions,
    ) -> Result<serde_json::Value>;

    async fn later(
        &self,
        delay: Delay,
        job: &str,
        payload: &serde_json::Value,
        queue: Option<&str>,
    ) -> Result<serde_json::Value>;

    async fn pop(&self, queue: Option<&str>) -> Result<Option<Job>>;
}

/// Resolves connection names to live backends.
pub trait BackendLookup: Send + Sync {
    fn backend(&self, name: &str) -> Result<Arc<dyn Backend>>;
}

/// Fixed name → backend table.
#[derive(Default, Clone)]
pub struct StaticLookup {
    backends: HashMap<String, Arc<dyn Backend>>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a backend under its own connection name.
    pub fn insert(&mut self, backend: Arc<dyn Backend>) {
        self.backends.insert(backend.connection_name().to_string(), backend);
    }

    pub fn with(mut self, backend: Arc<dyn Backend>) -> Self {
        self.insert(backend);
        self
    }
}

impl BackendLookup for StaticLookup {
    fn backend(&self, name: &str) -> Result<Arc<dyn Backend>> {
        self.backends
            .get(name)
            .cloned()
            .ok_or_else(|| BackendError::UnknownConnection { name: name.to_string() }.into())
    }
}
