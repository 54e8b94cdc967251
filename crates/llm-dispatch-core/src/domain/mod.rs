//! Dispatch records
//!
//! Configurations, providers and tool servers as read from the storage
//! collaborator. The dispatch path only reads them.

mod configuration;

pub use configuration::{
    Configuration, ExecutionPolicy, Filter, FilterKey, Provider, ProviderType, ToolServer,
};
