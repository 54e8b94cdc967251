//! Tool discovery across a configuration's tool servers
//!
//! Each server is handled on its own: a server that cannot be reached, fails
//! its health check or cannot list its tools contributes no tools, and the
//! remaining servers are unaffected.

use std::sync::Arc;

use crate::domain::{Configuration, ToolServer};
use crate::logging::Logger;
use crate::mcp::{McpResult, ToolClient, ToolConnector};
use crate::retry::{retry_async, RetryPolicy};
use crate::types::Tool;

use super::registry::{RemoteTool, ToolRegistry};

/// Builds a `ToolRegistry` for a configuration
pub struct ToolDiscovery {
    connector: Arc<dyn ToolConnector>,
    list_policy: RetryPolicy,
    logger: Arc<dyn Logger>,
}

impl ToolDiscovery {
    pub fn new(connector: Arc<dyn ToolConnector>, list_policy: RetryPolicy, logger: Arc<dyn Logger>) -> Self {
        Self {
            connector,
            list_policy,
            logger,
        }
    }

    /// Discover the tools of every server referenced by `configuration`
    ///
    /// Never fails; unusable servers are logged and skipped.
    pub async fn create_tool_registry(&self, configuration: &Configuration) -> ToolRegistry {
        if configuration.tool_servers.is_empty() {
            self.logger.debug(&format!(
                "[ToolDiscovery] Configuration '{}' has no tool servers",
                configuration.id
            ));
            return ToolRegistry::empty(Arc::clone(&self.logger));
        }

        let mut tools = Vec::new();
        for server in &configuration.tool_servers {
            match self.discover_server(server).await {
                Ok(discovered) => {
                    self.logger.info(&format!(
                        "[ToolDiscovery] {} tool(s) from server '{}' ({})",
                        discovered.len(),
                        server.id,
                        server.url
                    ));
                    tools.extend(discovered);
                }
                Err(e) => {
                    self.logger.warn(&format!(
                        "[ToolDiscovery] Skipping server '{}' ({}): {}",
                        server.id, server.url, e
                    ));
                }
            }
        }

        ToolRegistry::new(tools, Arc::clone(&self.logger))
    }

    async fn discover_server(&self, server: &ToolServer) -> McpResult<Vec<RemoteTool>> {
        let client = self.connector.connect(server).await?;

        if let Err(e) = client.health_check().await {
            self.release(&client, server).await;
            return Err(e);
        }

        let specs = self.list_tools(&client, server).await;
        if specs.is_empty() {
            self.release(&client, server).await;
            return Ok(Vec::new());
        }

        Ok(specs
            .into_iter()
            .map(|spec| RemoteTool::new(server.url.clone(), spec, Arc::clone(&client)))
            .collect())
    }

    /// List tool specifications with retries; exhaustion yields no tools
    async fn list_tools(&self, client: &Arc<dyn ToolClient>, server: &ToolServer) -> Vec<Tool> {
        let result = retry_async(
            &self.list_policy,
            |_| client.list_tools(),
            |attempt, e| {
                self.logger.warn(&format!(
                    "[ToolDiscovery] Listing tools of '{}' failed (attempt {}/{}): {}",
                    server.id,
                    attempt,
                    self.list_policy.max_attempts(),
                    e
                ));
            },
        )
        .await;

        match result {
            Ok(specs) => specs,
            Err(_) => {
                self.logger.error(&format!(
                    "[ToolDiscovery] Giving up listing tools of '{}'",
                    server.id
                ));
                Vec::new()
            }
        }
    }

    /// Close a client that contributes no tools
    async fn release(&self, client: &Arc<dyn ToolClient>, server: &ToolServer) {
        if let Err(e) = client.close().await {
            self.logger.debug(&format!(
                "[ToolDiscovery] Failed to close client of '{}': {}",
                server.id, e
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Provider, ProviderType};
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::mcp::{MockToolClient, MockToolConnector};
    use std::time::Duration;

    fn configuration(urls: &[&str]) -> Configuration {
        let provider = Arc::new(Provider::new("p1", ProviderType::Ollama, "http://localhost:11434", "llama3"));
        urls.iter().enumerate().fold(Configuration::new("c1", provider), |c, (i, url)| {
            c.with_tool_server(Arc::new(ToolServer::new(format!("s{}", i), *url)))
        })
    }

    fn discovery(connector: Arc<MockToolConnector>, logger: Arc<dyn Logger>) -> ToolDiscovery {
        ToolDiscovery::new(connector, RetryPolicy::new(2, Duration::ZERO), logger)
    }

    #[tokio::test]
    async fn test_no_servers_means_no_connections() {
        let connector = Arc::new(MockToolConnector::new());
        let registry = discovery(connector.clone(), Arc::new(NoOpLogger))
            .create_tool_registry(&configuration(&[]))
            .await;

        assert!(registry.is_empty());
        assert_eq!(connector.connects(), 0);
    }

    #[tokio::test]
    async fn test_aggregates_tools_from_all_servers() {
        let a = Arc::new(
            MockToolClient::new()
                .with_tool(Tool::new("read", "Read"), "r")
                .with_tool(Tool::new("write", "Write"), "w"),
        );
        let b = Arc::new(MockToolClient::new().with_tool(Tool::new("search", "Search"), "s"));
        let connector = Arc::new(
            MockToolConnector::new()
                .with_client("http://a/mcp", a.clone())
                .with_client("http://b/mcp", b.clone()),
        );

        let registry = discovery(connector, Arc::new(NoOpLogger))
            .create_tool_registry(&configuration(&["http://a/mcp", "http://b/mcp"]))
            .await;

        assert_eq!(registry.len(), 3);
        assert_eq!(registry.find_by_name("search").unwrap().server_url, "http://b/mcp");

        registry.close().await;
        assert_eq!(a.close_calls(), 1);
        assert_eq!(b.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_partial_failure_isolation() {
        let healthy = Arc::new(MockToolClient::new().with_tool(Tool::new("read", "Read"), "r"));
        let down = Arc::new(MockToolClient::new().with_tool(Tool::new("write", "Write"), "w").unhealthy());
        let connector = Arc::new(
            MockToolConnector::new()
                .with_client("http://healthy/mcp", healthy.clone())
                .with_client("http://down/mcp", down.clone()),
        );
        let logger = Arc::new(MemoryLogger::new());

        let registry = discovery(connector, logger.clone())
            .create_tool_registry(&configuration(&[
                "http://unreachable/mcp",
                "http://down/mcp",
                "http://healthy/mcp",
            ]))
            .await;

        assert_eq!(registry.len(), 1);
        assert!(registry.find_by_name("read").is_some());
        assert!(registry.find_by_name("write").is_none());
        assert_eq!(down.close_calls(), 1);
        assert!(logger.contains(LogLevel::Warn, "http://unreachable/mcp"));
        assert!(logger.contains(LogLevel::Warn, "http://down/mcp"));
    }

    #[tokio::test]
    async fn test_listing_is_retried() {
        let flaky = Arc::new(
            MockToolClient::new()
                .with_tool(Tool::new("read", "Read"), "r")
                .failing_list(2),
        );
        let connector = Arc::new(MockToolConnector::new().with_client("http://flaky/mcp", flaky.clone()));

        let registry = discovery(connector, Arc::new(NoOpLogger))
            .create_tool_registry(&configuration(&["http://flaky/mcp"]))
            .await;

        assert_eq!(registry.len(), 1);
        assert_eq!(flaky.list_calls(), 3);
    }

    #[tokio::test]
    async fn test_listing_exhaustion_contributes_nothing() {
        let broken = Arc::new(
            MockToolClient::new()
                .with_tool(Tool::new("read", "Read"), "r")
                .failing_list(10),
        );
        let connector = Arc::new(MockToolConnector::new().with_client("http://broken/mcp", broken.clone()));

        let registry = discovery(connector, Arc::new(NoOpLogger))
            .create_tool_registry(&configuration(&["http://broken/mcp"]))
            .await;

        assert!(registry.is_empty());
        assert_eq!(broken.list_calls(), 3);
        assert_eq!(broken.close_calls(), 1);
    }
}
