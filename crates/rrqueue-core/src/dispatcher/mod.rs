//! Round-robin dispatch across a fixed list of connections.
//!
//! Every push, raw push, or delayed push goes to exactly one target
//! connection, picked in strict rotation order. The rotation index lives in an
//! [`IndexStore`] under `round-robin-queue-<name>`, so independent dispatchers
//! registered under the same name continue one shared rotation. `size` fans
//! out to every target and sums.
//!
//! Two rotation modes exist (see [`RotationMode`]):
//!
//! - `AfterDispatch` reads the index, forwards the call, and stores the next
//!   index only after the call returned `Ok`. A failing target is retried by
//!   the next push. Concurrent callers may read the same index and both land
//!   on the same target.
//! - `Reserve` claims the slot with [`IndexStore::reserve`] before forwarding.
//!   With an atomic store, concurrent callers get distinct consecutive slots.
//!   A failing call still consumes its slot.

use async_trait::async_trait;
use rrqueue_types::{BackendError, ConfigError, Result, RotationMode, RoundRobinConfig};
use std::sync::Arc;
use validator::Validate;

use crate::backend::{Backend, BackendLookup, Delay, Job, PushOptions};
use crate::store::{rotation_key, IndexStore};


/// Target chosen for one mutating call.
struct Slot {
    index: usize,
    backend: Arc<dyn Backend>,
    reserved: bool,
}

/// Queue connection that forwards pushes to its targets in rotation.
pub struct RoundRobinQueue {
    name: String,
    connections: Vec<String>,
    default_queue: String,
    rotation: RotationMode,
    lookup: Arc<dyn BackendLookup>,
    store: Arc<dyn IndexStore>,
}

impl RoundRobinQueue {
    /// Create a dispatcher registered as `name`.
    ///
    /// Fails if `config.connections` is empty. A config that lists `name`
    /// itself is accepted here and rejected by every operation instead.
    pub fn new(
        name: impl Into<String>,
        config: RoundRobinConfig,
        lookup: Arc<dyn BackendLookup>,
        store: Arc<dyn IndexStore>,
    ) -> Result<Self> {
        let name = name.into();
        if config.connections.is_empty() {
            return Err(ConfigError::EmptyConnections { connection: name }.into());
        }
        config.validate().map_err(|e| ConfigError::from_validation_errors(&e))?;

        let queue = Self {
            name,
            connections: config.connections,
            default_queue: config.queue,
            rotation: config.rotation,
            lookup,
            store,
        };

        if queue.rotation == RotationMode::Reserve && !queue.rotation_is_atomic() {
            tracing::warn!(
                connection = %queue.name,
                store = queue.store.kind(),
                "Reserve rotation requested but the index store is not atomic across processes"
            );
        }

        tracing::info!(
            connection = %queue.name,
            targets = ?queue.connections,
            queue = %queue.default_queue,
            rotation = %queue.rotation,
            "Round robin queue created"
        );
        Ok(queue)
    }

    /// Target connections in rotation order.
    pub fn connections(&self) -> &[String] {
        &self.connections
    }

    pub fn default_queue(&self) -> &str {
        &self.default_queue
    }

    pub fn rotation_mode(&self) -> RotationMode {
        self.rotation
    }

    /// True when concurrent pushes from any process are guaranteed distinct
    /// slots: `Reserve` rotation over an atomic store.
    pub fn rotation_is_atomic(&self) -> bool {
        self.rotation == RotationMode::Reserve && self.store.is_atomic()
    }

    pub fn store_kind(&self) -> &'static str {
        self.store.kind()
    }

    fn queue_or_default<'a>(&'a self, queue: Option<&'a str>) -> &'a str {
        queue.filter(|q| !q.is_empty()).unwrap_or(&self.default_queue)
    }

    fn check_for_infinite_recursion(&self) -> Result<()> {
        if self.connections.iter().any(|c| *c == self.name) {
            return Err(ConfigError::InfiniteRecursion { connection: self.name.clone() }.into());
        }
        Ok(())
    }

    fn len(&self) -> u64 {
        self.connections.len() as u64
    }

    /// Stored index clamped to the current list length.
    async fn current_index(&self) -> Result<usize> {
        let stored = self.store.get(&rotation_key(&self.name), 0).await?;
        Ok((stored % self.len()) as usize)
    }

    async fn claim_slot(&self) -> Result<Slot> {
        let (index, reserved) = match self.rotation {
            RotationMode::AfterDispatch => (self.current_index().await?, false),
            RotationMode::Reserve => {
                let index = self.store.reserve(&rotation_key(&self.name), self.len()).await?;
                (index as usize, true)
            },
        };
        let backend = self.lookup.backend(&self.connections[index])?;
        Ok(Slot { index, backend, reserved })
    }

    async fn advance(&self, slot: &Slot) -> Result<()> {
        if slot.reserved {
            return Ok(());
        }
        let next = (slot.index + 1) % self.connections.len();
        self.store.set(&rotation_key(&self.name), next as u64).await?;
        Ok(())
    }

    /// Name of the connection the next push would go to.
    pub async fn current_backend(&self) -> Result<&str> {
        self.check_for_infinite_recursion()?;
        let index = self.current_index().await?;
        Ok(&self.connections[index])
    }

    fn log_dispatch(&self, operation: &str, slot: &Slot, queue: &str) {
        tracing::debug!(
            connection = %self.name,
            backend = %slot.backend.connection_name(),
            index = slot.index,
            queue = %queue,
            operation,
            "Dispatched to round robin target"
        );
    }
}

#[async_trait]
impl Backend for RoundRobinQueue {
    fn connection_name(&self) -> &str {
        &self.name
    }

    async fn size(&self, queue: Option<&str>) -> Result<u64> {
        self.check_for_infinite_recursion()?;
        let queue = self.queue_or_default(queue);

        let mut total = 0_u64;
        for connection in &self.connections {
            let size = self.lookup.backend(connection)?.size(Some(queue)).await?;
            total = total.checked_add(size).ok_or_else(|| BackendError::Operation {
                connection: self.name.clone(),
                operation: "size".to_string(),
                message: format!("total size of queue '{}' overflows u64", queue),
            })?;
        }
        Ok(total)
    }

    async fn push(
        &self,
        job: &str,
        payload: &serde_json::Value,
        queue: Option<&str>,
    ) -> Result<serde_json::Value> {
        self.check_for_infinite_recursion()?;
        let queue = self.queue_or_default(queue);
        let slot = self.claim_slot().await?;
        let result = slot.backend.push(job, payload, Some(queue)).await?;
        self.advance(&slot).await?;
        self.log_dispatch("push", &slot, queue);
        Ok(result)
    }

    async fn push_raw(
        &self,
        payload: &str,
        queue: Option<&str>,
        options: &PushOptions,
    ) -> Result<serde_json::Value> {
        self.check_for_infinite_recursion()?;
        let queue = self.queue_or_default(queue);
        let slot = self.claim_slot().await?;
        let result = slot.backend.push_raw(payload, Some(queue), options).await?;
        self.advance(&slot).await?;
        self.log_dispatch("push_raw", &slot, queue);
        Ok(result)
    }

    async fn later(
        &self,
        delay: Delay,
        job: &str,
        payload: &serde_json::Value,
        queue: Option<&str>,
    ) -> Result<serde_json::Value> {
        self.check_for_infinite_recursion()?;
        let queue = self.queue_or_default(queue);
        let slot = self.claim_slot().await?;
        let result = slot.backend.later(delay, job, payload, Some(queue)).await?;
        self.advance(&slot).await?;
        self.log_dispatch("later", &slot, queue);
        Ok(result)
    }

    /// Always empty: jobs are popped from the target connections directly.
    async fn pop(&self, _queue: Option<&str>) -> Result<Option<Job>> {
        Ok(None)
    }
}
