//! Storage collaborator trait

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{Configuration, FilterKey, Provider, ToolServer};

/// Read access to stored configurations
///
/// Implementations:
/// - `MemoryConfigurationStore`: in-memory, for tests and embedding
/// - Database-backed stores live outside this crate
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// Configurations whose filter key equals `key`
    ///
    /// With `key == None`, configurations without any filter are returned.
    async fn find_by_filter_key(&self, key: Option<FilterKey>) -> StoreResult<Vec<Configuration>>;

    /// Look up a provider by id
    async fn find_provider(&self, id: &str) -> StoreResult<Option<Arc<Provider>>>;

    /// Look up a tool server by id
    async fn find_tool_server(&self, id: &str) -> StoreResult<Option<Arc<ToolServer>>>;
}

/// Errors raised by a configuration store
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Configuration already exists: {0}")]
    ConfigurationExists(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
