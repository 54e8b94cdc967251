//! Mock tool clients for testing
//!
//! Deterministic tool servers without network access. Every call is counted
//! so tests can assert on retries, ordering and connection release.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::error::{McpError, McpResult};
use super::traits::{ToolClient, ToolConnector};
use crate::domain::ToolServer;
use crate::types::Tool;

/// Scripted tool client
#[derive(Debug, Default)]
pub struct MockToolClient {
    tools: Vec<Tool>,
    /// Tool name -> result (Err is a failed call)
    results: HashMap<String, Result<String, String>>,
    unhealthy: bool,
    list_failures: usize,
    list_calls: AtomicUsize,
    close_calls: AtomicUsize,
    calls: Mutex<Vec<(String, Value)>>,
}

impl MockToolClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a tool that answers every call with `result`
    pub fn with_tool(mut self, tool: Tool, result: impl Into<String>) -> Self {
        self.results.insert(tool.name.clone(), Ok(result.into()));
        self.tools.push(tool);
        self
    }

    /// Offer a tool whose every call fails
    pub fn with_failing_tool(mut self, tool: Tool, error: impl Into<String>) -> Self {
        self.results.insert(tool.name.clone(), Err(error.into()));
        self.tools.push(tool);
        self
    }

    /// Fail every health check
    pub fn unhealthy(mut self) -> Self {
        self.unhealthy = true;
        self
    }

    /// Fail the first `count` list requests
    pub fn failing_list(mut self, count: usize) -> Self {
        self.list_failures = count;
        self
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn close_calls(&self) -> usize {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Tool invocations received so far, in order
    pub fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().clone()
    }

    /// Number of invocations of `name`
    pub fn call_count(&self, name: &str) -> usize {
        self.calls.lock().iter().filter(|(n, _)| n == name).count()
    }
}

#[async_trait]
impl ToolClient for MockToolClient {
    async fn health_check(&self) -> McpResult<()> {
        if self.unhealthy {
            return Err(McpError::Unhealthy("mock server is down".to_string()));
        }
        Ok(())
    }

    async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        let attempt = self.list_calls.fetch_add(1, Ordering::SeqCst);
        if attempt < self.list_failures {
            return Err(McpError::Protocol(format!("list attempt {} failed", attempt + 1)));
        }
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<String> {
        self.calls.lock().push((name.to_string(), arguments));
        match self.results.get(name) {
            Some(Ok(result)) => Ok(result.clone()),
            Some(Err(error)) => Err(McpError::ToolCallFailed(error.clone())),
            None => Err(McpError::ToolCallFailed(format!("unknown tool {}", name))),
        }
    }

    async fn close(&self) -> McpResult<()> {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Connector serving mock clients by server URL
///
/// Unknown URLs fail to connect.
#[derive(Debug, Default)]
pub struct MockToolConnector {
    clients: HashMap<String, Arc<MockToolClient>>,
    connects: AtomicUsize,
}

impl MockToolConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `client` for servers at `url`
    pub fn with_client(mut self, url: impl Into<String>, client: Arc<MockToolClient>) -> Self {
        self.clients.insert(url.into(), client);
        self
    }

    /// Number of connection attempts
    pub fn connects(&self) -> usize {
        self.connects.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ToolConnector for MockToolConnector {
    async fn connect(&self, server: &ToolServer) -> McpResult<Arc<dyn ToolClient>> {
        self.connects.fetch_add(1, Ordering::SeqCst);
        match self.clients.get(&server.url) {
            Some(client) => Ok(client.clone()),
            None => Err(McpError::ConnectionFailed(format!("no mock server at {}", server.url))),
        }
    }
}
