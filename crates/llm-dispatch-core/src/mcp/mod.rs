//! MCP (Model Context Protocol) tool clients
//!
//! `ToolClient` is the remote tool client contract the registry and the tool
//! loop depend on. `McpClient` implements it with the official rmcp SDK over
//! the Streamable HTTP transport; `MockToolClient` is a scripted stand-in for
//! tests.

mod client;
mod error;
mod mock;
mod traits;

pub use client::{from_mcp_tool, result_text, McpClient, McpConnector};
pub use error::{McpError, McpResult};
pub use mock::{MockToolClient, MockToolConnector};
pub use traits::{ToolClient, ToolConnector};
