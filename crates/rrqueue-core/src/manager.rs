//! Queue manager: resolves connection names to backends.
//!
//! Connections are built on first use by the connector registered for their
//! driver and cached for the lifetime of the manager. Round-robin connections
//! resolve their targets through a weak handle back into the manager, so the
//! cache never forms a reference cycle.

use dashmap::DashMap;
use rrqueue_types::{AppConfig, BackendError, ConfigError, QueueConfig, Result};
use std::sync::{Arc, Weak};

use crate::backend::{Backend, BackendLookup};
use crate::connector::{
    connect_round_robin, ConnectContext, Connector, MemoryConnector, MEMORY_DRIVER,
    ROUND_ROBIN_DRIVER,
};
use crate::dispatcher::RoundRobinQueue;
use crate::store::{open_index_store, IndexStore};

struct ManagerInner {
    config: QueueConfig,
    store: Arc<dyn IndexStore>,
    connectors: DashMap<String, Arc<dyn Connector>>,
    connections: DashMap<String, Arc<dyn Backend>>,
    round_robins: DashMap<String, Arc<RoundRobinQueue>>,
}

impl ManagerInner {
    fn resolve(self: &Arc<Self>, name: &str) -> Result<Arc<dyn Backend>> {
        if let Some(existing) = self.connections.get(name) {
            return Ok(Arc::clone(existing.value()));
        }

        let config = self
            .config
            .connection(name)
            .ok_or_else(|| BackendError::UnknownConnection { name: name.to_string() })?;
        let ctx = ConnectContext {
            lookup: Arc::new(ManagerHandle(Arc::downgrade(self))),
            store: Arc::clone(&self.store),
        };

        // Another caller may have connected first; keep whichever landed first.
        let backend: Arc<dyn Backend> = if config.driver == ROUND_ROBIN_DRIVER {
            let queue = Arc::new(connect_round_robin(name, config, &ctx)?);
            let queue = Arc::clone(self.round_robins.entry(name.to_string()).or_insert(queue).value());
            Arc::clone(self.connections.entry(name.to_string()).or_insert(queue).value())
        } else {
            let connector = self
                .connectors
                .get(&config.driver)
                .map(|c| Arc::clone(c.value()))
                .ok_or_else(|| ConfigError::UnknownDriver {
                    driver: config.driver.clone(),
                    connection: name.to_string(),
                })?;
            let backend = connector.connect(name, config, &ctx)?;
            Arc::clone(self.connections.entry(name.to_string()).or_insert(backend).value())
        };
        tracing::info!(connection = %name, driver = %config.driver, "Queue connection resolved");
        Ok(backend)
    }
}

/// Lookup handle given to connectors; does not keep the manager alive.
struct ManagerHandle(Weak<ManagerInner>);

impl BackendLookup for ManagerHandle {
    fn backend(&self, name: &str) -> Result<Arc<dyn Backend>> {
        let inner = self
            .0
            .upgrade()
            .ok_or_else(|| BackendError::ManagerUnavailable { name: name.to_string() })?;
        inner.resolve(name)
    }
}

/// Entry point for resolving queue connections by name.
#[derive(Clone)]
pub struct QueueManager {
    inner: Arc<ManagerInner>,
}

impl QueueManager {
    /// Create a manager with the built-in `roundrobin` and `memory` drivers.
    pub fn new(config: QueueConfig, store: Arc<dyn IndexStore>) -> Self {
        let connectors: DashMap<String, Arc<dyn Connector>> = DashMap::new();
        connectors.insert(MEMORY_DRIVER.to_string(), Arc::new(MemoryConnector));

        Self {
            inner: Arc::new(ManagerInner {
                config,
                store,
                connectors,
                connections: DashMap::new(),
                round_robins: DashMap::new(),
            }),
        }
    }

    /// Validate `config`, open its index store, and build a manager.
    pub fn from_app_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let store = open_index_store(&config.store)?;
        Ok(Self::new(config.queue.clone(), store))
    }

    /// Register (or replace) the connector for `driver`.
    ///
    /// The `roundrobin` driver is built in and cannot be replaced.
    pub fn add_connector(&self, driver: &str, connector: Arc<dyn Connector>) -> Result<()> {
        if driver == ROUND_ROBIN_DRIVER {
            return Err(ConfigError::ValidationError {
                field: "driver".to_string(),
                message: format!("driver '{}' is built in", ROUND_ROBIN_DRIVER),
            }
            .into());
        }
        self.inner.connectors.insert(driver.to_string(), connector);
        Ok(())
    }

    /// Resolve a connection by name, connecting it on first use.
    pub fn connection(&self, name: &str) -> Result<Arc<dyn Backend>> {
        self.inner.resolve(name)
    }

    /// Resolve the configured default connection.
    pub fn default_connection(&self) -> Result<Arc<dyn Backend>> {
        self.connection(&self.inner.config.default)
    }

    /// Resolve `name` or the default connection when `None`.
    pub fn connection_or_default(&self, name: Option<&str>) -> Result<Arc<dyn Backend>> {
        match name {
            Some(name) => self.connection(name),
            None => self.default_connection(),
        }
    }

    /// Resolve `name` and require it to be a round-robin connection.
    pub fn round_robin(&self, name: &str) -> Result<Arc<RoundRobinQueue>> {
        self.connection(name)?;
        self.inner.round_robins.get(name).map(|rr| Arc::clone(rr.value())).ok_or_else(|| {
            ConfigError::ValidationError {
                field: format!("queue.connections.{}.driver", name),
                message: format!("connection '{}' is not a round robin connection", name),
            }
            .into()
        })
    }

    pub fn default_connection_name(&self) -> &str {
        &self.inner.config.default
    }

    pub fn store(&self) -> &Arc<dyn IndexStore> {
        &self.inner.store
    }

    /// Lookup view of this manager for dispatchers built by hand.
    pub fn lookup(&self) -> Arc<dyn BackendLookup> {
        Arc::new(ManagerHandle(Arc::downgrade(&self.inner)))
    }

    /// Build a round-robin queue that is not part of the config.
    pub fn build_round_robin(
        &self,
        name: &str,
        options: rrqueue_types::RoundRobinConfig,
    ) -> Result<RoundRobinQueue> {
        RoundRobinQueue::new(name, options, self.lookup(), Arc::clone(&self.inner.store))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryIndexStore;
    use rrqueue_types::{ConnectionConfig, QueueError, RoundRobinConfig};
    use serde_json::json;

    fn manager() -> QueueManager {
        let mut config = QueueConfig { default: "rr".to_string(), ..QueueConfig::default() };
        config.connections.insert("rr".into(), ConnectionConfig::round_robin(&["q1", "q2"], "default"));
        config.connections.insert("q1".into(), ConnectionConfig::memory());
        config.connections.insert("q2".into(), ConnectionConfig::memory());
        config.connections.insert("odd".into(), ConnectionConfig::new("beanstalkd"));
        QueueManager::new(config, Arc::new(MemoryIndexStore::new()))
    }

    #[test]
    fn test_connections_are_cached() {
        let manager = manager();
        let first = manager.connection("q1").unwrap();
        let second = manager.connection("q1").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_default_connection_is_round_robin() {
        let manager = manager();
        let backend = manager.default_connection().unwrap();
        assert_eq!(backend.connection_name(), "rr");

        let rr = manager.round_robin("rr").unwrap();
        assert_eq!(rr.connections(), ["q1".to_string(), "q2".to_string()]);
        // The typed handle and the cached connection are the same dispatcher.
        let rr_backend: Arc<dyn Backend> = rr;
        assert!(Arc::ptr_eq(&rr_backend, &backend));

        assert!(manager.round_robin("q1").err().is_some_and(|e| e.is_configuration()));
        assert!(manager.round_robin("nope").err().is_some_and(|e| !e.is_configuration()));
    }

    #[test]
    fn test_unknown_connection_and_driver() {
        let manager = manager();
        assert_eq!(
            manager.connection("nope").err(),
            Some(QueueError::Backend(BackendError::UnknownConnection { name: "nope".into() }))
        );
        assert_eq!(
            manager.connection("odd").err(),
            Some(QueueError::Config(ConfigError::UnknownDriver {
                driver: "beanstalkd".into(),
                connection: "odd".into()
            }))
        );
    }

    #[tokio::test]
    async fn test_round_robin_pushes_land_on_memory_targets() {
        let manager = manager();
        let rr = manager.default_connection().unwrap();

        rr.push("job1", &json!({"n": 1}), None).await.unwrap();
        rr.push("job2", &json!({"n": 2}), None).await.unwrap();
        rr.push("job3", &json!({"n": 3}), None).await.unwrap();

        let q1 = manager.connection("q1").unwrap();
        let q2 = manager.connection("q2").unwrap();
        assert_eq!(q1.size(None).await.unwrap(), 2);
        assert_eq!(q2.size(None).await.unwrap(), 1);
        assert_eq!(rr.size(None).await.unwrap(), 3);

        assert!(rr.pop(None).await.unwrap().is_none());
        assert_eq!(q2.pop(None).await.unwrap().map(|j| j.name), Some("job2".to_string()));
    }

    #[tokio::test]
    async fn test_custom_connector_can_be_registered() {
        let manager = manager();
        manager.add_connector("beanstalkd", Arc::new(MemoryConnector)).unwrap();
        assert!(manager
            .add_connector(ROUND_ROBIN_DRIVER, Arc::new(MemoryConnector))
            .err()
            .is_some_and(|e| e.is_configuration()));
        let odd = manager.connection("odd").unwrap();
        odd.push("job", &json!(""), None).await.unwrap();
        assert_eq!(odd.size(None).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_lookup_fails_after_manager_dropped() {
        let manager = manager();
        let options =
            RoundRobinConfig { connections: vec!["q1".into()], ..RoundRobinConfig::default() };
        let rr = manager.build_round_robin("adhoc", options).unwrap();
        rr.push("job", &json!(""), None).await.unwrap();

        drop(manager);
        let err = rr.push("job", &json!(""), None).await.unwrap_err();
        assert_eq!(err, QueueError::Backend(BackendError::ManagerUnavailable { name: "q1".into() }));
    }

    #[test]
    fn test_from_app_config_rejects_missing_default() {
        let mut config = AppConfig::new();
        config.queue.default = "missing".into();
        assert!(matches!(
            QueueManager::from_app_config(&config),
            Err(QueueError::Config(ConfigError::ValidationError { .. }))
        ));
    }
}
