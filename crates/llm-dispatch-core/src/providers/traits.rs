//! Chat model trait definitions

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::Provider;
use crate::types::{ChatMessage, Tool, ToolCall};
use super::error::ProviderResult;

/// One model reply: optional text plus the tool calls it requested
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    /// Text content, if the model produced any
    pub text: Option<String>,
    /// Tool invocations in the order the model emitted them
    pub tool_calls: Vec<ToolCall>,
}

impl ModelResponse {
    /// Plain text answer
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    /// Reply requesting tool calls
    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            text: None,
            tool_calls,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// A chat model bound to one provider endpoint and model
///
/// Implementations:
/// - `GenaiChatModel`: calls the provider through the genai client
/// - `MockChatModel`: replays scripted replies
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the message sequence, offering `tools` when non-empty
    async fn chat(&self, messages: &[ChatMessage], tools: &[Tool]) -> ProviderResult<ModelResponse>;
}

/// Builds a `ChatModel` for a provider record
pub trait ChatModelFactory: Send + Sync {
    fn create(&self, provider: &Provider) -> ProviderResult<Arc<dyn ChatModel>>;
}
