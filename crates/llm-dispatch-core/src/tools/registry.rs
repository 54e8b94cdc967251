//! Per-request tool registry
//!
//! Holds every tool discovered for one chat request together with the live
//! client it runs on. Several tools share one client; `close` releases each
//! distinct client exactly once.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::logging::Logger;
use crate::mcp::{McpResult, ToolClient};
use crate::types::Tool;

/// A callable tool bound to the server connection it was discovered on
#[derive(Clone)]
pub struct RemoteTool {
    /// URL of the server that offered the tool
    pub server_url: String,
    /// Specification offered to the model
    pub spec: Tool,
    client: Arc<dyn ToolClient>,
}

impl RemoteTool {
    pub fn new(server_url: impl Into<String>, spec: Tool, client: Arc<dyn ToolClient>) -> Self {
        Self {
            server_url: server_url.into(),
            spec,
            client,
        }
    }

    pub fn name(&self) -> &str {
        &self.spec.name
    }

    /// Invoke the tool on its server
    pub async fn execute(&self, arguments: Value) -> McpResult<String> {
        self.client.call_tool(&self.spec.name, arguments).await
    }

    pub fn client(&self) -> &Arc<dyn ToolClient> {
        &self.client
    }
}

impl std::fmt::Debug for RemoteTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTool")
            .field("server_url", &self.server_url)
            .field("name", &self.spec.name)
            .finish()
    }
}

/// Name-indexed set of tools for one chat request
pub struct ToolRegistry {
    tools: Vec<RemoteTool>,
    /// Tool name -> position in `tools`
    index: HashMap<String, usize>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Build a registry; on duplicate names the tool registered last wins
    pub fn new(tools: Vec<RemoteTool>, logger: Arc<dyn Logger>) -> Self {
        let mut index = HashMap::with_capacity(tools.len());

        for (position, tool) in tools.iter().enumerate() {
            if let Some(previous) = index.insert(tool.spec.name.clone(), position) {
                logger.warn(&format!(
                    "[ToolRegistry] Tool '{}' from {} replaces the one from {}",
                    tool.spec.name, tool.server_url, tools[previous].server_url
                ));
            }
        }

        Self { tools, index, logger }
    }

    /// Registry without tools
    pub fn empty(logger: Arc<dyn Logger>) -> Self {
        Self::new(Vec::new(), logger)
    }

    /// Look up a tool by name
    pub fn find_by_name(&self, name: &str) -> Option<&RemoteTool> {
        self.index.get(name).map(|&position| &self.tools[position])
    }

    /// Specifications of the callable tools, one per name
    pub fn tool_specifications(&self) -> Vec<Tool> {
        self.tools
            .iter()
            .enumerate()
            .filter(|(position, tool)| self.index.get(&tool.spec.name) == Some(position))
            .map(|(_, tool)| tool.spec.clone())
            .collect()
    }

    /// Number of callable tools
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Distinct clients backing the registered tools, by identity
    fn distinct_clients(&self) -> Vec<Arc<dyn ToolClient>> {
        let mut clients: Vec<Arc<dyn ToolClient>> = Vec::new();
        for tool in &self.tools {
            let ptr = Arc::as_ptr(&tool.client) as *const ();
            if !clients.iter().any(|c| Arc::as_ptr(c) as *const () == ptr) {
                clients.push(Arc::clone(&tool.client));
            }
        }
        clients
    }

    /// Close every distinct client once; close errors are logged and ignored
    pub async fn close(self) {
        let clients = self.distinct_clients();
        self.logger.debug(&format!(
            "[ToolRegistry] Closing {} client(s) for {} tool(s)",
            clients.len(),
            self.tools.len()
        ));

        for client in clients {
            if let Err(e) = client.close().await {
                self.logger.warn(&format!("[ToolRegistry] Failed to close client: {}", e));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::mcp::MockToolClient;
    use serde_json::json;

    fn tool(name: &str) -> Tool {
        Tool::new(name, format!("{} tool", name))
    }

    #[tokio::test]
    async fn test_find_and_execute() {
        let client = Arc::new(MockToolClient::new().with_tool(tool("echo"), "pong"));
        let registry = ToolRegistry::new(
            vec![RemoteTool::new("http://a/mcp", tool("echo"), client.clone())],
            Arc::new(NoOpLogger),
        );

        let found = registry.find_by_name("echo").unwrap();
        assert_eq!(found.execute(json!({ "x": 1 })).await.unwrap(), "pong");
        assert!(registry.find_by_name("missing").is_none());
        assert_eq!(client.calls(), vec![("echo".to_string(), json!({ "x": 1 }))]);
    }

    #[tokio::test]
    async fn test_close_once_per_distinct_client() {
        let a = Arc::new(MockToolClient::new());
        let b = Arc::new(MockToolClient::new());
        let registry = ToolRegistry::new(
            vec![
                RemoteTool::new("http://a/mcp", tool("a1"), a.clone()),
                RemoteTool::new("http://a/mcp", tool("a2"), a.clone()),
                RemoteTool::new("http://a/mcp", tool("a3"), a.clone()),
                RemoteTool::new("http://b/mcp", tool("b1"), b.clone()),
            ],
            Arc::new(NoOpLogger),
        );

        registry.close().await;

        assert_eq!(a.close_calls(), 1);
        assert_eq!(b.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_name_collision_last_wins() {
        let a = Arc::new(MockToolClient::new().with_tool(tool("search"), "from a"));
        let b = Arc::new(MockToolClient::new().with_tool(tool("search"), "from b"));
        let logger = Arc::new(MemoryLogger::new());
        let registry = ToolRegistry::new(
            vec![
                RemoteTool::new("http://a/mcp", tool("search"), a.clone()),
                RemoteTool::new("http://a/mcp", tool("other"), a.clone()),
                RemoteTool::new("http://b/mcp", tool("search"), b.clone()),
            ],
            logger.clone(),
        );

        assert_eq!(registry.len(), 2);
        let names: Vec<String> = registry.tool_specifications().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["other".to_string(), "search".to_string()]);
        assert_eq!(registry.find_by_name("search").unwrap().server_url, "http://b/mcp");
        assert!(logger.contains(LogLevel::Warn, "search"));

        registry.close().await;
        assert_eq!(a.close_calls(), 1);
        assert_eq!(b.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_empty_registry() {
        let registry = ToolRegistry::empty(Arc::new(NoOpLogger));
        assert!(registry.is_empty());
        assert!(registry.tool_specifications().is_empty());
        registry.close().await;
    }
}
