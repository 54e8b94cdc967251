//! LLM Dispatch Core
//!
//! Configuration-driven dispatch of chat requests to LLM providers, with a
//! bounded tool-calling loop over remote MCP tool servers.
//!
//! ## Request flow
//!
//! 1. `ProviderRouter` resolves the configuration for the request's filter
//!    key and value (`resolver`), or fails with a not-found error.
//! 2. The orchestrator for the configuration's provider type builds a chat
//!    model (`providers`) and discovers the configuration's tools into a
//!    per-request `ToolRegistry` (`tools`, `mcp`).
//! 3. The model is called; requested tools are executed and their results fed
//!    back, at most `mcp.max-iterations` times.
//! 4. The registry is closed on every exit path.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use llm_dispatch_core::{ChatRequest, DispatchConfig, MemoryConfigurationStore, ProviderRouter, TracingLogger};
//!
//! let router = ProviderRouter::with_defaults(
//!     Arc::new(MemoryConfigurationStore::with_configurations(configurations)),
//!     Arc::new(DispatchConfig::from_file("dispatch.yaml")?),
//!     Arc::new(TracingLogger::new()),
//! )?;
//!
//! let reply = router.dispatch(&ChatRequest::new("What's the weather in Oslo?")).await?;
//! println!("{}", reply.text());
//! ```

pub mod config;
pub mod dispatch;
pub mod domain;
pub mod logging;
pub mod mcp;
pub mod providers;
pub mod resolver;
pub mod retry;
pub mod store;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use types::{
    ChatMessage, ChatReply, ChatRequest, ContentPart, Conversation, ConversationMessage,
    ConversationRole, MessageContent, MessageRole, RequestContext, RequestFilter, Tool, ToolCall,
    ToolResult,
};

pub use domain::{
    Configuration, ExecutionPolicy, Filter, FilterKey, Provider, ProviderType, ToolServer,
};

pub use config::{ConfigError, ConfigResult, DispatchConfig, McpSettings, ProviderSettings};

pub use logging::{init_tracing, Logger, MemoryLogger, NoOpLogger, SharedLogger, TracingLogger};

pub use store::{ConfigurationStore, MemoryConfigurationStore, StoreError, StoreResult};

pub use retry::RetryPolicy;

pub use resolver::ConfigurationResolver;

pub use providers::{
    ChatModel, ChatModelFactory, GenaiChatModel, GenaiModelFactory, ModelResponse, ProviderError,
    ProviderResult,
};

// MCP client using official rmcp SDK
pub use mcp::{McpClient, McpConnector, McpError, McpResult, ToolClient, ToolConnector};

pub use tools::{RemoteTool, ToolDiscovery, ToolRegistry};

pub use dispatch::{
    AgenticOrchestrator, ChatOrchestrator, DispatchError, DispatchResult, ProviderRouter,
    ProviderRouterBuilder,
};
