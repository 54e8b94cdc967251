//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Tool call specification sent to the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (function name)
    pub name: String,
    /// Description of what the tool does
    #[serde(default)]
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema", skip_serializing_if = "Option::is_none")]
    pub input_schema: Option<Value>,
}

impl Tool {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema: None,
        }
    }

    /// Set the input schema
    pub fn with_schema(mut self, schema: Value) -> Self {
        self.input_schema = Some(schema);
        self
    }
}

/// Tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Unique identifier for this tool call
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Input arguments for the tool
    pub input: Value,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, input: Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            input,
        }
    }
}

/// Outcome of one requested tool call, fed back to the model
///
/// Every call the model makes gets exactly one result; failures carry an
/// error text naming the tool instead of aborting the conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResult {
    /// ID of the tool call this is responding to
    pub call_id: String,
    pub content: String,
    pub is_error: bool,
}

impl ToolResult {
    /// Result returned by the tool
    pub fn success(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            call_id: call_id.into(),
            content: content.into(),
            is_error: false,
        }
    }

    /// The model asked for a tool no server provides
    pub fn not_found(call: &ToolCall) -> Self {
        Self::failure(call, format!("Error: Tool '{}' not found", call.name))
    }

    /// The tool kept failing (or panicked) until retries ran out
    pub fn execution_failed(call: &ToolCall) -> Self {
        Self::failure(call, format!("Error: Tool execution failed for '{}'", call.name))
    }

    fn failure(call: &ToolCall, content: String) -> Self {
        Self {
            call_id: call.id.clone(),
            content,
            is_error: true,
        }
    }
}
