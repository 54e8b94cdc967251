//! Static dispatch configuration (YAML)
//!
//! Read once at process start and shared as `Arc<DispatchConfig>`.
//!
//! ```yaml
//! mcp:
//!   max-iterations: 3
//!   timeout: 60
//!   max-tool-execution-retries: 3
//!   tool-execution-retry-delay: 1000
//! provider:
//!   timeout: 60
//!   log-requests: true
//! ```

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::retry::RetryPolicy;
use super::error::{ConfigError, ConfigResult};

/// Dispatch settings for the model call and the tool loop
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Tool server (MCP) settings
    pub mcp: McpSettings,
    /// Model provider settings
    pub provider: ProviderSettings,
}

/// Settings for tool servers and the tool-calling loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct McpSettings {
    /// Maximum number of tool-processing passes per chat request
    pub max_iterations: u32,
    /// Per-call timeout in seconds
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,
    pub log_requests: bool,
    #[serde(rename = "log-response")]
    pub log_responses: bool,
    /// Retries after the first failed tool execution or tool listing
    pub max_tool_execution_retries: u32,
    /// Delay in milliseconds between tool retries
    #[serde(rename = "tool-execution-retry-delay")]
    pub tool_execution_retry_delay_ms: u64,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            max_iterations: 3,
            timeout_secs: 60,
            log_requests: false,
            log_responses: false,
            max_tool_execution_retries: 3,
            tool_execution_retry_delay_ms: 1000,
        }
    }
}

impl McpSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy for tool execution and tool listing
    pub fn tool_retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_tool_execution_retries,
            Duration::from_millis(self.tool_execution_retry_delay_ms),
        )
    }
}

/// Settings for model calls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ProviderSettings {
    /// Per-call timeout in seconds
    #[serde(rename = "timeout")]
    pub timeout_secs: u64,
    pub log_requests: bool,
    #[serde(rename = "log-response")]
    pub log_responses: bool,
    /// Retries after the first failed model call
    pub max_retries: u32,
    /// Delay in milliseconds between model call retries
    #[serde(rename = "retry-delay")]
    pub retry_delay_ms: u64,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            log_requests: false,
            log_responses: false,
            max_retries: 3,
            retry_delay_ms: 0,
        }
    }
}

impl ProviderSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Retry policy for model calls
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries, Duration::from_millis(self.retry_delay_ms))
    }
}

impl DispatchConfig {
    /// Parse configuration from YAML text; missing keys take their defaults
    pub fn from_yaml_str(content: &str) -> ConfigResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a YAML file
    pub fn from_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.mcp.timeout_secs == 0 {
            return Err(ConfigError::Invalid("mcp.timeout must be greater than 0".to_string()));
        }
        if self.provider.timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "provider.timeout must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
