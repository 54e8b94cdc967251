//! Adapter between dispatch types and genai types
//!
//! The provider record fully determines the target: its URL is the base of
//! the OpenAI-compatible endpoint, its model name the model and its API key
//! the raw `Authorization` header. Nothing is looked up from the environment.

use genai::adapter::AdapterKind;
use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions, ChatResponse as GenaiResponse,
    Tool as GenaiTool, ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
};
use genai::resolver::{Endpoint, ServiceTargetResolver};
use genai::{Client, ModelIden, ServiceTarget};
use serde_json::json;

use crate::domain::{Provider, ProviderType};
use crate::types::{ChatMessage, ContentPart, MessageContent, MessageRole, Tool, ToolCall};

use super::error::ProviderResult;
use super::traits::ModelResponse;

// ============================================================================
// Message Conversion: dispatch -> genai
// ============================================================================

/// Text of a message, joining text parts of structured content
fn message_text(msg: &ChatMessage) -> String {
    match &msg.content {
        MessageContent::Text(text) => text.clone(),
        MessageContent::Parts(parts) => parts
            .iter()
            .filter_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Convert a dispatch tool call to a genai tool call
pub fn to_genai_tool_call(call: &ToolCall) -> ProviderResult<GenaiToolCall> {
    // Built through serde so optional fields added by genai stay defaulted
    let tool_call = serde_json::from_value(json!({
        "call_id": call.id,
        "fn_name": call.name,
        "fn_arguments": call.input,
    }))?;
    Ok(tool_call)
}

/// Convert the message sequence to genai messages
///
/// An assistant turn carrying both text and tool calls becomes two genai
/// messages; a tool turn becomes one tool response per result part.
pub fn to_genai_messages(messages: &[ChatMessage]) -> ProviderResult<Vec<GenaiMessage>> {
    let mut converted = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg.role {
            MessageRole::System => converted.push(GenaiMessage::system(message_text(msg))),
            MessageRole::User => converted.push(GenaiMessage::user(message_text(msg))),
            MessageRole::Assistant => {
                let calls = msg
                    .parts()
                    .iter()
                    .filter_map(|p| match p {
                        ContentPart::ToolUse { id, name, input } => {
                            Some(ToolCall::new(id, name, input.clone()))
                        }
                        _ => None,
                    })
                    .map(|call| to_genai_tool_call(&call))
                    .collect::<ProviderResult<Vec<_>>>()?;

                let text = message_text(msg);
                if !text.is_empty() || calls.is_empty() {
                    converted.push(GenaiMessage::assistant(text));
                }
                if !calls.is_empty() {
                    converted.push(GenaiMessage::from(calls));
                }
            }
            MessageRole::Tool => {
                for part in msg.parts() {
                    if let ContentPart::ToolResult { tool_use_id, content, .. } = part {
                        converted.push(GenaiMessage::from(GenaiToolResponse::new(
                            tool_use_id.clone(),
                            content.clone(),
                        )));
                    }
                }
            }
        }
    }

    Ok(converted)
}

// ============================================================================
// Tool Conversion: dispatch -> genai
// ============================================================================

/// Convert a tool specification to a genai tool
pub fn to_genai_tool(tool: &Tool) -> GenaiTool {
    let mut genai_tool = GenaiTool::new(&tool.name).with_description(&tool.description);

    if let Some(schema) = &tool.input_schema {
        genai_tool = genai_tool.with_schema(schema.clone());
    }

    genai_tool
}

/// Convert tool specifications to genai tools
pub fn to_genai_tools(tools: &[Tool]) -> Vec<GenaiTool> {
    tools.iter().map(to_genai_tool).collect()
}

// ============================================================================
// Response Conversion: genai -> dispatch
// ============================================================================

/// Convert a genai tool call to a dispatch tool call
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    ToolCall::new(tc.call_id.clone(), tc.fn_name.clone(), tc.fn_arguments.clone())
}

/// Extract text and tool calls from a genai response
pub fn from_genai_response(response: &GenaiResponse) -> ModelResponse {
    ModelResponse {
        text: response.first_text().map(str::to_string),
        tool_calls: response
            .tool_calls()
            .into_iter()
            .map(from_genai_tool_call)
            .collect(),
    }
}

// ============================================================================
// Client Creation
// ============================================================================

/// OpenAI-compatible base URL served by an Ollama host, always ending with `/v1/`
///
/// Accepts both the bare host URL and one already pointing at `/v1`.
pub fn endpoint_url(llm_url: &str) -> String {
    let base = llm_url.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{}/", base)
    } else {
        format!("{}/v1/", base)
    }
}

/// genai adapter serving a provider type
pub fn adapter_kind(provider_type: ProviderType) -> AdapterKind {
    match provider_type {
        ProviderType::Ollama => AdapterKind::Ollama,
    }
}

/// Per-request options carrying the provider's API key verbatim
///
/// The key replaces the adapter's `Bearer` authorization header; a blank key
/// leaves genai's default in place.
pub fn chat_options(provider: &Provider) -> Option<ChatOptions> {
    provider
        .api_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .map(|key| ChatOptions::default().with_extra_headers(("Authorization", key)))
}

/// Create a genai client bound to one provider record
pub fn create_client(provider: &Provider) -> Client {
    let endpoint = endpoint_url(&provider.llm_url);
    let kind = adapter_kind(provider.provider_type);

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            let ServiceTarget { model, auth, .. } = target;

            Ok(ServiceTarget {
                endpoint: Endpoint::from_owned(endpoint.clone()),
                auth,
                model: ModelIden::new(kind, model.model_name.clone()),
            })
        },
    );

    Client::builder()
        .with_service_target_resolver(target_resolver)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use genai::chat::ChatRole as GenaiRole;
    use crate::types::ToolResult;

    #[test]
    fn test_plain_messages() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::user("Hello"),
            ChatMessage::assistant("Hi"),
        ];
        let converted = to_genai_messages(&messages).unwrap();

        assert_eq!(converted.len(), 3);
        assert!(matches!(converted[0].role, GenaiRole::System));
        assert!(matches!(converted[1].role, GenaiRole::User));
        assert!(matches!(converted[2].role, GenaiRole::Assistant));
    }

    #[test]
    fn test_tool_turns() {
        let call = ToolCall::new("call-1", "get_weather", json!({ "city": "Oslo" }));
        let messages = vec![
            ChatMessage::assistant_tool_calls(None, &[call]),
            ChatMessage::tool_result(ToolResult::success("call-1", "sunny")),
        ];
        let converted = to_genai_messages(&messages).unwrap();

        assert_eq!(converted.len(), 2);
        assert!(matches!(converted[0].role, GenaiRole::Assistant));
        assert!(matches!(converted[1].role, GenaiRole::Tool));
    }

    #[test]
    fn test_assistant_text_with_tool_calls() {
        let call = ToolCall::new("call-1", "lookup", json!({}));
        let messages = vec![ChatMessage::assistant_tool_calls(Some("checking"), &[call])];

        assert_eq!(to_genai_messages(&messages).unwrap().len(), 2);
    }

    #[test]
    fn test_tool_call_round_trip() {
        let call = ToolCall::new("call-7", "search", json!({ "q": "rust" }));
        let genai_call = to_genai_tool_call(&call).unwrap();

        assert_eq!(genai_call.call_id, "call-7");
        assert_eq!(from_genai_tool_call(&genai_call), call);
    }

    #[test]
    fn test_tool_conversion() {
        let tool = Tool::new("get_weather", "Get weather for a location").with_schema(json!({
            "type": "object",
            "properties": {
                "location": { "type": "string" }
            }
        }));

        let genai_tool = to_genai_tool(&tool);
        assert_eq!(genai_tool.name, "get_weather");
    }

    #[test]
    fn test_endpoint_url() {
        assert_eq!(endpoint_url("http://localhost:11434"), "http://localhost:11434/v1/");
        assert_eq!(endpoint_url("http://localhost:11434/"), "http://localhost:11434/v1/");
        assert_eq!(endpoint_url("http://localhost:11434/v1"), "http://localhost:11434/v1/");
        assert_eq!(endpoint_url("http://gateway/ollama/v1/"), "http://gateway/ollama/v1/");
    }

    #[test]
    fn test_chat_options_only_for_non_blank_key() {
        let provider = Provider::new("p1", ProviderType::Ollama, "http://localhost:11434", "llama3");
        assert!(chat_options(&provider).is_none());
        assert!(chat_options(&provider.clone().with_api_key("  ")).is_none());

        let options = chat_options(&provider.with_api_key("secret-key")).unwrap();
        let headers = options.extra_headers.unwrap();
        let auth: Vec<_> = headers.iter().collect();
        assert_eq!(auth, vec![(&"Authorization".to_string(), &"secret-key".to_string())]);
    }

    #[test]
    fn test_adapter_kind() {
        assert_eq!(adapter_kind(ProviderType::Ollama), AdapterKind::Ollama);
    }
}
