//! Chat orchestration with a bounded tool-calling loop
//!
//! One chat request runs as:
//! 1. assemble the messages (system message, history, new user message)
//! 2. build a model for the configuration's provider
//! 3. discover the configuration's tools into a per-request registry
//! 4. call the model, then execute requested tools and call it again, at
//!    most `mcp.max-iterations` times
//! 5. close the registry, whatever happened in 4

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;

use crate::config::DispatchConfig;
use crate::domain::Configuration;
use crate::logging::Logger;
use crate::mcp::ToolConnector;
use crate::providers::{ChatModel, ChatModelFactory, ModelResponse, ProviderResult};
use crate::retry::retry_async;
use crate::tools::{ToolDiscovery, ToolRegistry};
use crate::types::{ChatMessage, ChatReply, ChatRequest, Tool, ToolCall, ToolResult};

use super::error::{DispatchError, DispatchResult};

/// Serves chat requests for one provider type
#[async_trait]
pub trait ChatOrchestrator: Send + Sync {
    /// Answer `request` using the resolved `configuration`
    async fn chat(&self, configuration: &Configuration, request: &ChatRequest) -> DispatchResult<ChatReply>;
}

/// Orchestrator letting the model call remote tools between turns
pub struct AgenticOrchestrator {
    models: Arc<dyn ChatModelFactory>,
    discovery: ToolDiscovery,
    config: Arc<DispatchConfig>,
    logger: Arc<dyn Logger>,
}

impl AgenticOrchestrator {
    pub fn new(
        models: Arc<dyn ChatModelFactory>,
        connector: Arc<dyn ToolConnector>,
        config: Arc<DispatchConfig>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        let discovery = ToolDiscovery::new(connector, config.mcp.tool_retry_policy(), Arc::clone(&logger));
        Self {
            models,
            discovery,
            config,
            logger,
        }
    }

    /// Message sequence for the first model call
    pub fn assemble_messages(configuration: &Configuration, request: &ChatRequest) -> Vec<ChatMessage> {
        let history = request.history();
        let mut messages = Vec::with_capacity(history.len() + 2);

        if let Some(system) = configuration
            .llm_system_message
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            messages.push(ChatMessage::system(system));
        }
        messages.extend(history.iter().map(ChatMessage::from));
        messages.push(ChatMessage::user(request.chat_message.message.as_str()));

        messages
    }

    async fn converse(
        &self,
        model: &dyn ChatModel,
        registry: &ToolRegistry,
        mut messages: Vec<ChatMessage>,
    ) -> DispatchResult<ChatReply> {
        let tools = registry.tool_specifications();
        let max_iterations = self.config.mcp.max_iterations;

        let mut response = self
            .call_model(model, &messages, &tools)
            .await
            .map_err(|e| DispatchError::ModelCallFailed(e.to_string()))?;

        let mut iterations = 0;
        while response.has_tool_calls() && iterations < max_iterations {
            iterations += 1;
            self.logger.info(&format!(
                "[AgenticOrchestrator] Iteration {}/{}: model requested {} tool call(s)",
                iterations,
                max_iterations,
                response.tool_calls.len()
            ));

            messages.push(ChatMessage::assistant_tool_calls(
                response.text.as_deref(),
                &response.tool_calls,
            ));
            for call in &response.tool_calls {
                let result = self.execute_tool_call(registry, call).await;
                messages.push(ChatMessage::tool_result(result));
            }

            response = self
                .call_model(model, &messages, &tools)
                .await
                .map_err(|e| DispatchError::FollowUpFailed {
                    iteration: iterations,
                    message: e.to_string(),
                })?;
        }

        let cap_reached = response.has_tool_calls();
        if cap_reached {
            self.logger.warn(&format!(
                "[AgenticOrchestrator] Reached max iterations ({}) with {} tool call(s) pending; returning last answer",
                max_iterations,
                response.tool_calls.len()
            ));
        }

        let mut reply = ChatReply::assistant(response.text.unwrap_or_default());
        reply.iteration_cap_reached = cap_reached;
        Ok(reply)
    }

    /// Model call with the provider retry policy
    async fn call_model(
        &self,
        model: &dyn ChatModel,
        messages: &[ChatMessage],
        tools: &[Tool],
    ) -> ProviderResult<ModelResponse> {
        let policy = self.config.provider.retry_policy();
        let result = retry_async(
            &policy,
            |_| model.chat(messages, tools),
            |attempt, e| {
                self.logger.warn(&format!(
                    "[AgenticOrchestrator] Model call failed (attempt {}/{}): {}",
                    attempt,
                    policy.max_attempts(),
                    e
                ));
            },
        )
        .await;

        if result.is_err() {
            self.logger.error("[AgenticOrchestrator] Model call failed after retries, no response from the model");
        }
        result
    }

    /// Run one requested tool call; failures become error results
    async fn execute_tool_call(&self, registry: &ToolRegistry, call: &ToolCall) -> ToolResult {
        self.logger.info(&format!(
            "[AgenticOrchestrator] Model requested tool '{}' with arguments {}",
            call.name, call.input
        ));

        let Some(tool) = registry.find_by_name(&call.name) else {
            self.logger.error(&format!(
                "[AgenticOrchestrator] Tool '{}' not found in registry",
                call.name
            ));
            return ToolResult::not_found(call);
        };

        let policy = self.config.mcp.tool_retry_policy();
        let execution = retry_async(
            &policy,
            |_| tool.execute(call.input.clone()),
            |attempt, e| {
                self.logger.warn(&format!(
                    "[AgenticOrchestrator] Tool '{}' failed (attempt {}/{}): {}",
                    call.name,
                    attempt,
                    policy.max_attempts(),
                    e
                ));
            },
        );

        match AssertUnwindSafe(execution).catch_unwind().await {
            Ok(Ok(content)) => {
                self.logger.info(&format!(
                    "[AgenticOrchestrator] Tool '{}' executed successfully",
                    call.name
                ));
                ToolResult::success(&call.id, content)
            }
            Ok(Err(_)) => {
                self.logger.error(&format!(
                    "[AgenticOrchestrator] Tool execution failed after {} retries for tool: {}",
                    policy.max_retries, call.name
                ));
                ToolResult::execution_failed(call)
            }
            Err(panic) => {
                self.logger.error(&format!(
                    "[AgenticOrchestrator] Tool '{}' panicked: {}",
                    call.name,
                    panic_message(panic.as_ref())
                ));
                ToolResult::execution_failed(call)
            }
        }
    }
}

#[async_trait]
impl ChatOrchestrator for AgenticOrchestrator {
    async fn chat(&self, configuration: &Configuration, request: &ChatRequest) -> DispatchResult<ChatReply> {
        self.logger.info(&format!(
            "[AgenticOrchestrator] Chat with configuration '{}' (provider '{}', model '{}')",
            configuration.id, configuration.provider.id, configuration.provider.model_name
        ));

        let messages = Self::assemble_messages(configuration, request);
        let model = self
            .models
            .create(&configuration.provider)
            .map_err(|e| DispatchError::Unexpected(e.to_string()))?;

        let registry = self.discovery.create_tool_registry(configuration).await;
        self.logger.debug(&format!(
            "[AgenticOrchestrator] {} tool(s) available",
            registry.len()
        ));

        let outcome = AssertUnwindSafe(self.converse(model.as_ref(), &registry, messages))
            .catch_unwind()
            .await;

        registry.close().await;

        match outcome {
            Ok(result) => result,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                self.logger.error(&format!(
                    "[AgenticOrchestrator] Conversation aborted: {}",
                    message
                ));
                Err(DispatchError::Unexpected(message))
            }
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic during chat".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Provider, ProviderType, ToolServer};
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::mcp::{MockToolClient, MockToolConnector};
    use crate::providers::{MockChatModel, MockModelFactory};
    use crate::types::{ContentPart, ConversationMessage, MessageRole};
    use serde_json::json;

    const SERVER_URL: &str = "http://tools.local/mcp";

    fn test_config(max_iterations: u32) -> Arc<DispatchConfig> {
        let mut config = DispatchConfig::default();
        config.mcp.max_iterations = max_iterations;
        config.mcp.max_tool_execution_retries = 2;
        config.mcp.tool_execution_retry_delay_ms = 0;
        config.provider.max_retries = 2;
        Arc::new(config)
    }

    fn configuration(with_tools: bool) -> Configuration {
        let provider = Arc::new(Provider::new("p1", ProviderType::Ollama, "http://localhost:11434", "llama3"));
        let config = Configuration::new("c1", provider);
        if with_tools {
            config.with_tool_server(Arc::new(ToolServer::new("s1", SERVER_URL)))
        } else {
            config
        }
    }

    fn tools_client() -> Arc<MockToolClient> {
        Arc::new(
            MockToolClient::new()
                .with_tool(Tool::new("echo", "Echo input"), "pong")
                .with_failing_tool(Tool::new("broken", "Always fails"), "boom"),
        )
    }

    fn orchestrator(
        model: Arc<MockChatModel>,
        client: Arc<MockToolClient>,
        config: Arc<DispatchConfig>,
        logger: Arc<dyn Logger>,
    ) -> AgenticOrchestrator {
        AgenticOrchestrator::new(
            Arc::new(MockModelFactory::new(model)),
            Arc::new(MockToolConnector::new().with_client(SERVER_URL, client)),
            config,
            logger,
        )
    }

    fn call(id: &str, name: &str) -> ToolCall {
        ToolCall::new(id, name, json!({ "value": id }))
    }

    fn tool_results(messages: &[ChatMessage]) -> Vec<String> {
        messages
            .iter()
            .filter(|m| m.role == MessageRole::Tool)
            .flat_map(|m| m.parts().iter())
            .filter_map(|p| match p {
                ContentPart::ToolResult { content, .. } => Some(content.clone()),
                _ => None,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_plain_answer_without_tools() {
        let model = Arc::new(MockChatModel::fixed("Hello there"));
        let connector = Arc::new(MockToolConnector::new());
        let orchestrator = AgenticOrchestrator::new(
            Arc::new(MockModelFactory::new(model.clone())),
            connector.clone(),
            test_config(3),
            Arc::new(NoOpLogger),
        );

        let reply = orchestrator
            .chat(&configuration(false), &ChatRequest::new("Hi"))
            .await
            .unwrap();

        assert_eq!(reply.text(), "Hello there");
        assert!(!reply.iteration_cap_reached);
        assert!(reply.message.creation_date.is_some());
        assert_eq!(connector.connects(), 0);

        let calls = model.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].tools.is_empty());
        assert_eq!(calls[0].messages.len(), 1);
        assert_eq!(calls[0].messages[0].text(), Some("Hi"));
    }

    #[test]
    fn test_message_assembly_order() {
        let configuration = configuration(false).with_system_message("Be brief");
        let request = ChatRequest::new("third").with_history(vec![
            ConversationMessage::user("first"),
            ConversationMessage::assistant("second"),
        ]);

        let messages = AgenticOrchestrator::assemble_messages(&configuration, &request);
        let roles: Vec<MessageRole> = messages.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![MessageRole::System, MessageRole::User, MessageRole::Assistant, MessageRole::User]
        );
        assert_eq!(messages[3].text(), Some("third"));
    }

    #[test]
    fn test_blank_system_message_is_skipped() {
        let configuration = configuration(false).with_system_message("  ");
        let messages = AgenticOrchestrator::assemble_messages(&configuration, &ChatRequest::new("hi"));
        assert_eq!(messages.len(), 1);
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let model = Arc::new(MockChatModel::scripted(vec![
            Ok(ModelResponse::with_tool_calls(vec![call("c1", "echo")])),
            Ok(ModelResponse::text("The tool said pong")),
        ]));
        let client = tools_client();
        let orchestrator = orchestrator(model.clone(), client.clone(), test_config(3), Arc::new(NoOpLogger));

        let reply = orchestrator
            .chat(&configuration(true), &ChatRequest::new("ping it"))
            .await
            .unwrap();

        assert_eq!(reply.text(), "The tool said pong");
        assert_eq!(client.calls(), vec![("echo".to_string(), json!({ "value": "c1" }))]);
        assert_eq!(client.close_calls(), 1);

        let calls = model.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls[0].tools.len(), 2);
        assert_eq!(calls[1].tools.len(), 2);

        let followup = &calls[1].messages;
        assert_eq!(followup.len(), 3);
        assert_eq!(followup[1].role, MessageRole::Assistant);
        assert_eq!(tool_results(followup), vec!["pong".to_string()]);
    }

    #[tokio::test]
    async fn test_failing_tool_yields_one_error_result() {
        let model = Arc::new(MockChatModel::scripted(vec![
            Ok(ModelResponse::with_tool_calls(vec![call("c1", "broken")])),
            Ok(ModelResponse::text("Sorry, the tool is down")),
        ]));
        let client = tools_client();
        let orchestrator = orchestrator(model.clone(), client.clone(), test_config(3), Arc::new(NoOpLogger));

        let reply = orchestrator
            .chat(&configuration(true), &ChatRequest::new("use broken"))
            .await
            .unwrap();

        assert_eq!(reply.text(), "Sorry, the tool is down");
        assert_eq!(client.call_count("broken"), 3);

        let results = tool_results(&model.calls()[1].messages);
        assert_eq!(results, vec!["Error: Tool execution failed for 'broken'".to_string()]);
        assert!(model.calls()[1]
            .messages
            .iter()
            .flat_map(|m| m.parts().iter())
            .any(|p| matches!(p, ContentPart::ToolResult { is_error: true, .. })));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_reported_not_invoked() {
        let model = Arc::new(MockChatModel::scripted(vec![
            Ok(ModelResponse::with_tool_calls(vec![call("c1", "ghost"), call("c2", "echo")])),
            Ok(ModelResponse::text("done")),
        ]));
        let client = tools_client();
        let orchestrator = orchestrator(model.clone(), client.clone(), test_config(3), Arc::new(NoOpLogger));

        orchestrator
            .chat(&configuration(true), &ChatRequest::new("go"))
            .await
            .unwrap();

        let results = tool_results(&model.calls()[1].messages);
        assert_eq!(
            results,
            vec!["Error: Tool 'ghost' not found".to_string(), "pong".to_string()]
        );
        assert_eq!(client.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_iteration_cap() {
        let model = Arc::new(MockChatModel::always(ModelResponse::with_tool_calls(vec![call(
            "c1", "echo",
        )])));
        let client = tools_client();
        let logger = Arc::new(MemoryLogger::new());
        let orchestrator = orchestrator(model.clone(), client.clone(), test_config(2), logger.clone());

        let reply = orchestrator
            .chat(&configuration(true), &ChatRequest::new("loop forever"))
            .await
            .unwrap();

        assert!(reply.iteration_cap_reached);
        assert_eq!(reply.text(), "");
        assert_eq!(model.call_count(), 3);
        assert_eq!(client.call_count("echo"), 2);
        assert_eq!(client.close_calls(), 1);
        assert!(logger.contains(LogLevel::Warn, "max iterations"));
    }

    #[tokio::test]
    async fn test_cap_returns_last_text() {
        let mut response = ModelResponse::with_tool_calls(vec![call("c1", "echo")]);
        response.text = Some("partial answer".to_string());
        let model = Arc::new(MockChatModel::always(response));
        let orchestrator = orchestrator(model, tools_client(), test_config(1), Arc::new(NoOpLogger));

        let reply = orchestrator
            .chat(&configuration(true), &ChatRequest::new("go"))
            .await
            .unwrap();

        assert!(reply.iteration_cap_reached);
        assert_eq!(reply.text(), "partial answer");
    }

    #[tokio::test]
    async fn test_model_failure_is_bad_request() {
        let model = Arc::new(MockChatModel::error("connection refused"));
        let client = tools_client();
        let orchestrator = orchestrator(model.clone(), client.clone(), test_config(3), Arc::new(NoOpLogger));

        let err = orchestrator
            .chat(&configuration(true), &ChatRequest::new("hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::ModelCallFailed(_)));
        assert_eq!(err.status(), 400);
        assert_eq!(model.call_count(), 3);
        assert_eq!(client.close_calls(), 1);
    }

    #[tokio::test]
    async fn test_follow_up_failure() {
        let model = Arc::new(MockChatModel::scripted(vec![Ok(ModelResponse::with_tool_calls(vec![
            call("c1", "echo"),
        ]))]));
        let client = tools_client();
        let orchestrator = orchestrator(model, client.clone(), test_config(3), Arc::new(NoOpLogger));

        let err = orchestrator
            .chat(&configuration(true), &ChatRequest::new("hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::FollowUpFailed { iteration: 1, .. }));
        assert_eq!(client.close_calls(), 1);
    }

    struct PanickingModel;

    #[async_trait]
    impl ChatModel for PanickingModel {
        async fn chat(&self, _messages: &[ChatMessage], _tools: &[Tool]) -> ProviderResult<ModelResponse> {
            panic!("model exploded");
        }
    }

    struct PanickingFactory;

    impl ChatModelFactory for PanickingFactory {
        fn create(&self, _provider: &Provider) -> ProviderResult<Arc<dyn ChatModel>> {
            Ok(Arc::new(PanickingModel))
        }
    }

    #[tokio::test]
    async fn test_unexpected_error_still_closes_registry() {
        let client = tools_client();
        let orchestrator = AgenticOrchestrator::new(
            Arc::new(PanickingFactory),
            Arc::new(MockToolConnector::new().with_client(SERVER_URL, client.clone())),
            test_config(3),
            Arc::new(NoOpLogger),
        );

        let err = orchestrator
            .chat(&configuration(true), &ChatRequest::new("hi"))
            .await
            .unwrap_err();

        assert!(matches!(err, DispatchError::Unexpected(ref m) if m.contains("model exploded")));
        assert_eq!(err.status(), 400);
        assert_eq!(client.close_calls(), 1);
    }
}
