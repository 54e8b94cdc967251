//! Chat message types

use serde::{Deserialize, Serialize};

use super::tool::{ToolCall, ToolResult};

/// Message role in a conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
    /// Result of a tool invocation, fed back to the model
    Tool,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
            MessageRole::Tool => write!(f, "tool"),
        }
    }
}

/// A chat message for LLM requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The role of the message sender
    pub role: MessageRole,
    /// The content of the message (string or structured parts)
    pub content: MessageContent,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: MessageContent::Text(content.into()),
        }
    }

    /// Create the assistant turn that requested tool calls
    ///
    /// Text the model emitted alongside the calls (if any) is kept as the first part.
    pub fn assistant_tool_calls(text: Option<&str>, calls: &[ToolCall]) -> Self {
        let mut parts = Vec::with_capacity(calls.len() + 1);
        if let Some(text) = text.filter(|t| !t.is_empty()) {
            parts.push(ContentPart::text(text));
        }
        parts.extend(
            calls
                .iter()
                .map(|call| ContentPart::tool_use(&call.id, &call.name, call.input.clone())),
        );
        Self::with_parts(MessageRole::Assistant, parts)
    }

    /// Create a tool-result message answering one tool call
    pub fn tool_result(result: ToolResult) -> Self {
        Self::with_parts(
            MessageRole::Tool,
            vec![ContentPart::ToolResult {
                tool_use_id: result.call_id,
                content: result.content,
                is_error: result.is_error,
            }],
        )
    }

    /// Create a message with structured content parts
    pub fn with_parts(role: MessageRole, parts: Vec<ContentPart>) -> Self {
        Self {
            role,
            content: MessageContent::Parts(parts),
        }
    }

    /// Get the text content if this is a simple text message
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(s) => Some(s),
            MessageContent::Parts(_) => None,
        }
    }

    /// Content parts of a structured message (empty for plain text)
    pub fn parts(&self) -> &[ContentPart] {
        match &self.content {
            MessageContent::Text(_) => &[],
            MessageContent::Parts(parts) => parts,
        }
    }
}

/// Message content - either simple text or structured parts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Structured content with multiple parts
    Parts(Vec<ContentPart>),
}

/// Content part for tool-calling messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Text content
    Text {
        text: String,
    },
    /// Tool use (assistant calling a tool)
    ToolUse {
        id: String,
        name: String,
        input: serde_json::Value,
    },
    /// Tool result (returning tool output)
    ToolResult {
        tool_use_id: String,
        content: String,
        #[serde(default, skip_serializing_if = "std::ops::Not::not")]
        is_error: bool,
    },
}

impl ContentPart {
    /// Create a text content part
    pub fn text(text: impl Into<String>) -> Self {
        ContentPart::Text { text: text.into() }
    }

    /// Create a tool use content part
    pub fn tool_use(id: impl Into<String>, name: impl Into<String>, input: serde_json::Value) -> Self {
        ContentPart::ToolUse {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}
