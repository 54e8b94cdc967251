//! MCP Client using the official rmcp SDK
//!
//! Connects to tool servers over the Streamable HTTP transport.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use rmcp::{
    model::{
        CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, ClientRequest,
        Implementation, Tool as McpTool,
    },
    service::{Peer, RunningService},
    transport::{
        streamable_http_client::StreamableHttpClientTransportConfig, StreamableHttpClientTransport,
    },
    RoleClient, ServiceExt,
};
use serde_json::Value;

use crate::config::McpSettings;
use crate::domain::ToolServer;
use crate::logging::Logger;
use crate::types::Tool;

use super::error::{McpError, McpResult};
use super::traits::{ToolClient, ToolConnector};

/// MCP client bound to one tool server
pub struct McpClient {
    server_url: String,
    /// Handle used for requests; cheap to clone
    peer: Peer<RoleClient>,
    /// Owned service, taken on close
    service: Mutex<Option<RunningService<RoleClient, ClientInfo>>>,
    settings: McpSettings,
    logger: Arc<dyn Logger>,
}

impl McpClient {
    /// Connect to a tool server over HTTP (Streamable HTTP transport)
    ///
    /// The API key, when set and not blank, is sent verbatim as the
    /// `Authorization` header.
    pub async fn connect(
        server: &ToolServer,
        settings: McpSettings,
        logger: Arc<dyn Logger>,
    ) -> McpResult<Self> {
        logger.info(&format!("[McpClient] Connecting to HTTP: {}", server.url));

        let http_client = build_http_client(server.auth_key(), settings.timeout())?;
        let transport = StreamableHttpClientTransport::with_client(
            http_client,
            StreamableHttpClientTransportConfig::with_uri(server.url.as_str()),
        );

        let service = with_timeout("initialize", settings.timeout(), async {
            client_info()
                .serve(transport)
                .await
                .map_err(|e| McpError::InitializationFailed(e.to_string()))
        })
        .await?;

        logger.info(&format!(
            "[McpClient] Connected and initialized: {}",
            server.url
        ));

        Ok(Self {
            server_url: server.url.clone(),
            peer: service.peer().clone(),
            service: Mutex::new(Some(service)),
            settings,
            logger,
        })
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    /// Get server info
    pub fn server_info(&self) -> Option<&Implementation> {
        self.peer.peer_info().map(|info| &info.server_info)
    }

    fn ensure_open(&self) -> McpResult<()> {
        if self.service.lock().is_none() {
            return Err(McpError::Closed);
        }
        Ok(())
    }
}

#[async_trait]
impl ToolClient for McpClient {
    /// Ping the server; any reply other than an error counts as healthy
    async fn health_check(&self) -> McpResult<()> {
        self.ensure_open()?;

        with_timeout("health_check", self.settings.timeout(), async {
            self.peer
                .send_request(ClientRequest::PingRequest(Default::default()))
                .await
                .map_err(|e| McpError::Unhealthy(format!("{} did not answer ping: {}", self.server_url, e)))
        })
        .await?;

        self.logger.debug(&format!("[McpClient] {} is healthy", self.server_url));
        Ok(())
    }

    async fn list_tools(&self) -> McpResult<Vec<Tool>> {
        self.ensure_open()?;

        let tools = with_timeout("list_tools", self.settings.timeout(), async {
            self.peer
                .list_all_tools()
                .await
                .map_err(|e| McpError::Protocol(e.to_string()))
        })
        .await?;

        self.logger.info(&format!(
            "[McpClient] Listed {} tools from {}",
            tools.len(),
            self.server_url
        ));

        Ok(tools.iter().map(from_mcp_tool).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> McpResult<String> {
        self.ensure_open()?;
        self.logger.info(&format!("[McpClient] Calling tool: {}", name));
        if self.settings.log_requests {
            self.logger.debug(&format!(
                "[McpClient] Tool request {}: {}",
                name, arguments
            ));
        }

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: arguments.as_object().cloned(),
            task: None,
        };

        let result = with_timeout("call_tool", self.settings.timeout(), async {
            self.peer
                .call_tool(params)
                .await
                .map_err(|e| McpError::ToolCallFailed(e.to_string()))
        })
        .await?;

        let text = result_text(&result);
        if self.settings.log_responses {
            self.logger.debug(&format!("[McpClient] Tool response {}: {}", name, text));
        }

        if result.is_error.unwrap_or(false) {
            return Err(McpError::ToolCallFailed(format!("{} returned an error: {}", name, text)));
        }

        Ok(text)
    }

    async fn close(&self) -> McpResult<()> {
        let service = self.service.lock().take();
        let Some(service) = service else {
            return Ok(());
        };

        self.logger.info(&format!("[McpClient] Closing connection to {}", self.server_url));
        service
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

/// Opens `McpClient`s with shared MCP settings
pub struct McpConnector {
    settings: McpSettings,
    logger: Arc<dyn Logger>,
}

impl McpConnector {
    pub fn new(settings: McpSettings, logger: Arc<dyn Logger>) -> Self {
        Self { settings, logger }
    }
}

#[async_trait]
impl ToolConnector for McpConnector {
    async fn connect(&self, server: &ToolServer) -> McpResult<Arc<dyn ToolClient>> {
        let client = McpClient::connect(server, self.settings.clone(), Arc::clone(&self.logger)).await?;
        Ok(Arc::new(client))
    }
}

fn client_info() -> ClientInfo {
    ClientInfo {
        meta: None,
        protocol_version: Default::default(),
        capabilities: ClientCapabilities::default(),
        client_info: Implementation {
            name: "llm-dispatch-core".to_string(),
            title: Some("LLM Dispatch Core".to_string()),
            version: env!("CARGO_PKG_VERSION").to_string(),
            website_url: None,
            icons: None,
        },
    }
}

fn build_http_client(api_key: Option<&str>, timeout: Duration) -> McpResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder().connect_timeout(timeout);

    if let Some(key) = api_key {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(key)
            .map_err(|e| McpError::ConnectionFailed(format!("invalid API key header: {}", e)))?;
        headers.insert(AUTHORIZATION, value);
        builder = builder.default_headers(headers);
    }

    builder
        .build()
        .map_err(|e| McpError::ConnectionFailed(format!("build HTTP client: {}", e)))
}

async fn with_timeout<T>(
    operation: &str,
    timeout: Duration,
    fut: impl Future<Output = McpResult<T>>,
) -> McpResult<T> {
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| McpError::Timeout {
            operation: operation.to_string(),
            seconds: timeout.as_secs(),
        })?
}

/// Convert an MCP tool description to a tool specification
pub fn from_mcp_tool(tool: &McpTool) -> Tool {
    let description = tool
        .description
        .as_ref()
        .map(|d| d.to_string())
        .unwrap_or_default();

    Tool::new(tool.name.to_string(), description)
        .with_schema(Value::Object(tool.input_schema.as_ref().clone()))
}

/// Text of a tool result: text contents joined by newlines, else the structured content
pub fn result_text(result: &CallToolResult) -> String {
    let text = result
        .content
        .iter()
        .filter_map(|c| c.raw.as_text().map(|t| t.text.as_str()))
        .collect::<Vec<_>>()
        .join("\n");

    if text.is_empty() {
        if let Some(structured) = &result.structured_content {
            return structured.to_string();
        }
    }
    text
}
