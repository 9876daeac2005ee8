//! Connectors turn a driver config entry into a live backend.

use rrqueue_types::{ConfigError, ConnectionConfig, MemoryConfig, Result, RoundRobinConfig};
use std::sync::Arc;
use validator::Validate;

use crate::backend::{Backend, BackendLookup, MemoryQueue};
use crate::dispatcher::RoundRobinQueue;
use crate::store::IndexStore;

pub const ROUND_ROBIN_DRIVER: &str = "roundrobin";
pub const MEMORY_DRIVER: &str = "memory";

/// Shared collaborators handed to every connector.
#[derive(Clone)]
pub struct ConnectContext {
    pub lookup: Arc<dyn BackendLookup>,
    pub store: Arc<dyn IndexStore>,
}

/// Builds a backend for one driver name.
pub trait Connector: Send + Sync {
    fn connect(
        &self,
        name: &str,
        config: &ConnectionConfig,
        ctx: &ConnectContext,
    ) -> Result<Arc<dyn Backend>>;
}

/// Build the `roundrobin` driver's dispatcher.
///
/// This driver is built in: the manager keeps the typed handle so callers can
/// inspect rotation state without downcasting.
pub fn connect_round_robin(
    name: &str,
    config: &ConnectionConfig,
    ctx: &ConnectContext,
) -> Result<RoundRobinQueue> {
    let options: RoundRobinConfig = config.parse_options()?;
    RoundRobinQueue::new(name, options, Arc::clone(&ctx.lookup), Arc::clone(&ctx.store))
}

/// `memory` driver.
#[derive(Debug, Default, Clone, Copy)]
pub struct MemoryConnector;

impl Connector for MemoryConnector {
    fn connect(
        &self,
        name: &str,
        config: &ConnectionConfig,
        _ctx: &ConnectContext,
    ) -> Result<Arc<dyn Backend>> {
        let options: MemoryConfig = config.parse_options()?;
        options.validate().map_err(|e| ConfigError::from_validation_errors(&e))?;
        Ok(Arc::new(MemoryQueue::new(name, options.queue)))
    }
}
