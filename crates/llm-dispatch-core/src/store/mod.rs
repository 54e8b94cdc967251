//! Storage collaborator interface
//!
//! The dispatch path only reads configurations through `ConfigurationStore`.

mod memory;
mod traits;

pub use memory::MemoryConfigurationStore;
pub use traits::{ConfigurationStore, StoreError, StoreResult};
