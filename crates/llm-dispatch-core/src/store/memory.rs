//! In-memory configuration store

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::domain::{Configuration, FilterKey, Provider, ToolServer};
use super::traits::{ConfigurationStore, StoreError, StoreResult};

/// In-memory configuration store
///
/// Keeps insertion order, which is the order `find_by_filter_key` returns.
#[derive(Debug, Default)]
pub struct MemoryConfigurationStore {
    configurations: RwLock<Vec<Configuration>>,
}

impl MemoryConfigurationStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with initial configurations
    pub fn with_configurations(configurations: Vec<Configuration>) -> Self {
        Self {
            configurations: RwLock::new(configurations),
        }
    }

    /// Add a configuration; ids are unique
    pub fn add(&self, configuration: Configuration) -> StoreResult<()> {
        let mut guard = self.configurations.write();
        if guard.iter().any(|c| c.id == configuration.id) {
            return Err(StoreError::ConfigurationExists(configuration.id));
        }
        guard.push(configuration);
        Ok(())
    }

    /// Remove a configuration by id, returning whether it existed
    pub fn remove(&self, id: &str) -> bool {
        let mut guard = self.configurations.write();
        let original_len = guard.len();
        guard.retain(|c| c.id != id);
        guard.len() != original_len
    }

    pub fn len(&self) -> usize {
        self.configurations.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.configurations.read().is_empty()
    }
}

#[async_trait]
impl ConfigurationStore for MemoryConfigurationStore {
    async fn find_by_filter_key(&self, key: Option<FilterKey>) -> StoreResult<Vec<Configuration>> {
        let guard = self.configurations.read();
        Ok(guard
            .iter()
            .filter(|c| match key {
                Some(key) => c.filter_key() == Some(key),
                None => c.filter.is_none(),
            })
            .cloned()
            .collect())
    }

    async fn find_provider(&self, id: &str) -> StoreResult<Option<Arc<Provider>>> {
        let guard = self.configurations.read();
        Ok(guard
            .iter()
            .map(|c| &c.provider)
            .find(|p| p.id == id)
            .cloned())
    }

    async fn find_tool_server(&self, id: &str) -> StoreResult<Option<Arc<ToolServer>>> {
        let guard = self.configurations.read();
        Ok(guard
            .iter()
            .flat_map(|c| c.tool_servers.iter())
            .find(|s| s.id == id)
            .cloned())
    }
}
