//! MCP client errors

use thiserror::Error;

/// Errors raised while talking to a tool server
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Health check failed: {0}")]
    Unhealthy(String),

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    #[error("Client closed")]
    Closed,
}

pub type McpResult<T> = Result<T, McpError>;
