//! Configuration, provider and tool server records

use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Key a configuration filter matches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FilterKey {
    TenantId,
    ApplicationId,
    ProductName,
    WorkspaceName,
}

impl FilterKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterKey::TenantId => "TENANT_ID",
            FilterKey::ApplicationId => "APPLICATION_ID",
            FilterKey::ProductName => "PRODUCT_NAME",
            FilterKey::WorkspaceName => "WORKSPACE_NAME",
        }
    }
}

impl std::fmt::Display for FilterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Routing filter of a configuration
///
/// `value` is a pattern where `*` stands for any run of characters. A filter
/// without a value is the catch-all for its key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<FilterKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl Filter {
    /// Filter matching `key` with the given value pattern
    pub fn new(key: FilterKey, value: impl Into<String>) -> Self {
        Self {
            key: Some(key),
            value: Some(value.into()),
        }
    }

    /// Catch-all filter for `key`
    pub fn catch_all(key: FilterKey) -> Self {
        Self {
            key: Some(key),
            value: None,
        }
    }
}

/// Model backend family
///
/// Each variant is served by exactly one chat orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProviderType {
    Ollama,
}

impl ProviderType {
    /// Every provider type a router must be able to serve
    pub const ALL: &'static [ProviderType] = &[ProviderType::Ollama];
}

impl std::fmt::Display for ProviderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderType::Ollama => write!(f, "OLLAMA"),
        }
    }
}

/// An LLM backend endpoint and model identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Provider {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "type")]
    pub provider_type: ProviderType,
    /// Base URL of the model API
    pub llm_url: String,
    pub model_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Provider {
    /// Create a new provider record
    pub fn new(
        id: impl Into<String>,
        provider_type: ProviderType,
        llm_url: impl Into<String>,
        model_name: impl Into<String>,
    ) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: None,
            provider_type,
            llm_url: llm_url.into(),
            model_name: model_name.into(),
            api_key: None,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// How calls to a tool server's tools may be executed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionPolicy {
    #[default]
    Automatic,
    RequiresApproval,
}

/// A remote MCP server exposing callable tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolServer {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(default)]
    pub execution_policy: ExecutionPolicy,
}

impl ToolServer {
    /// Create a new tool server record
    pub fn new(id: impl Into<String>, url: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: None,
            url: url.into(),
            api_key: None,
            execution_policy: ExecutionPolicy::default(),
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// API key to send, if one is set and not blank
    pub fn auth_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

/// Named policy binding a provider, an optional filter and tool servers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Configuration {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm_system_message: Option<String>,
    /// Shared with every configuration pointing at the same provider
    pub provider: Arc<Provider>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(default)]
    pub tool_servers: Vec<Arc<ToolServer>>,
}

impl Configuration {
    /// Create a configuration without filter or tool servers
    pub fn new(id: impl Into<String>, provider: Arc<Provider>) -> Self {
        let id = id.into();
        Self {
            name: id.clone(),
            id,
            description: None,
            llm_system_message: None,
            provider,
            filter: None,
            tool_servers: Vec::new(),
        }
    }

    /// Set the routing filter
    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Set the system message
    pub fn with_system_message(mut self, message: impl Into<String>) -> Self {
        self.llm_system_message = Some(message.into());
        self
    }

    /// Add a tool server
    pub fn with_tool_server(mut self, server: Arc<ToolServer>) -> Self {
        self.tool_servers.push(server);
        self
    }

    /// Value pattern of the filter, if any
    pub fn filter_value(&self) -> Option<&str> {
        self.filter.as_ref().and_then(|f| f.value.as_deref())
    }

    /// Filter key, if any
    pub fn filter_key(&self) -> Option<FilterKey> {
        self.filter.as_ref().and_then(|f| f.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_configuration_builder() {
        let provider = Arc::new(Provider::new("p1", ProviderType::Ollama, "http://localhost:11434", "llama3"));
        let server = Arc::new(ToolServer::new("s1", "http://tools.local/mcp"));
        let config = Configuration::new("c1", Arc::clone(&provider))
            .with_filter(Filter::new(FilterKey::TenantId, "tenant-*"))
            .with_tool_server(server);

        assert_eq!(config.filter_key(), Some(FilterKey::TenantId));
        assert_eq!(config.filter_value(), Some("tenant-*"));
        assert_eq!(config.tool_servers.len(), 1);
        assert!(Arc::ptr_eq(&config.provider, &provider));
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let server = ToolServer::new("s1", "http://tools.local/mcp").with_api_key("   ");
        assert_eq!(server.auth_key(), None);

        let server = server.with_api_key("secret");
        assert_eq!(server.auth_key(), Some("secret"));
    }

    #[test]
    fn test_provider_type_rejects_unknown_variant() {
        let result: Result<Provider, _> = serde_json::from_value(json!({
            "id": "p1",
            "type": "SOMETHING_ELSE",
            "llmUrl": "http://x",
            "modelName": "m"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_configuration_deserialization() {
        let config: Configuration = serde_json::from_value(json!({
            "id": "c1",
            "provider": {
                "id": "p1",
                "type": "OLLAMA",
                "llmUrl": "http://localhost:11434",
                "modelName": "llama3"
            },
            "filter": { "key": "APPLICATION_ID", "value": "app-*" },
            "toolServers": [{ "id": "s1", "url": "http://tools.local/mcp" }]
        }))
        .unwrap();

        assert_eq!(config.provider.provider_type, ProviderType::Ollama);
        assert_eq!(config.filter_key(), Some(FilterKey::ApplicationId));
        assert_eq!(config.tool_servers[0].execution_policy, ExecutionPolicy::Automatic);
    }
}
