//! Remote tool client contract

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::ToolServer;
use crate::types::Tool;
use super::error::McpResult;

/// A live connection to one tool server
///
/// Shared by every tool discovered from that server; closed once when the
/// owning registry is released.
#[async_trait]
pub trait ToolClient: Send + Sync {
    /// Verify the server answers a ping
    async fn health_check(&self) -> McpResult<()>;

    /// Tool specifications offered by the server
    async fn list_tools(&self) -> McpResult<Vec<Tool>>;

    /// Invoke a tool and return its textual result
    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<String>;

    /// Release the connection; later calls fail
    async fn close(&self) -> McpResult<()>;
}

/// Opens tool clients for tool server records
#[async_trait]
pub trait ToolConnector: Send + Sync {
    async fn connect(&self, server: &ToolServer) -> McpResult<Arc<dyn ToolClient>>;
}
