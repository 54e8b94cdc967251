//! Static dispatch configuration
//!
//! - `DispatchConfig`: tool loop, MCP and provider settings, loaded from YAML

mod dispatch;
mod error;

pub use dispatch::{DispatchConfig, McpSettings, ProviderSettings};
pub use error::{ConfigError, ConfigResult};
