//! Inbound chat request and outbound reply shapes

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::domain::FilterKey;
use super::message::ChatMessage;

/// Role of a caller-supplied conversation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConversationRole {
    User,
    Assistant,
    System,
}

/// A message as exchanged with the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationMessage {
    #[serde(rename = "type")]
    pub role: ConversationRole,
    pub message: String,
    /// Milliseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation_date: Option<i64>,
}

impl ConversationMessage {
    pub fn new(role: ConversationRole, message: impl Into<String>) -> Self {
        Self {
            role,
            message: message.into(),
            creation_date: None,
        }
    }

    pub fn user(message: impl Into<String>) -> Self {
        Self::new(ConversationRole::User, message)
    }

    pub fn assistant(message: impl Into<String>) -> Self {
        Self::new(ConversationRole::Assistant, message)
    }

    pub fn system(message: impl Into<String>) -> Self {
        Self::new(ConversationRole::System, message)
    }
}

impl From<&ConversationMessage> for ChatMessage {
    fn from(msg: &ConversationMessage) -> Self {
        match msg.role {
            ConversationRole::User => ChatMessage::user(msg.message.clone()),
            ConversationRole::Assistant => ChatMessage::assistant(msg.message.clone()),
            ConversationRole::System => ChatMessage::system(msg.message.clone()),
        }
    }
}

/// Key/value pair used to pick a configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<FilterKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

/// Routing context of a chat request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<RequestFilter>,
}

impl RequestContext {
    /// Context selecting configurations by key and value pattern
    pub fn with_filter(key: FilterKey, value: impl Into<String>) -> Self {
        Self {
            filter: Some(RequestFilter {
                key: Some(key),
                value: Some(value.into()),
            }),
        }
    }

    /// Context selecting the catch-all configuration of a key
    pub fn with_key(key: FilterKey) -> Self {
        Self {
            filter: Some(RequestFilter {
                key: Some(key),
                value: None,
            }),
        }
    }

    pub fn filter_key(&self) -> Option<FilterKey> {
        self.filter.as_ref().and_then(|f| f.key)
    }

    pub fn filter_value(&self) -> Option<&str> {
        self.filter.as_ref().and_then(|f| f.value.as_deref())
    }
}

/// Caller-supplied conversation history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    #[serde(default)]
    pub history: Vec<ConversationMessage>,
}

/// An inbound chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_context: Option<RequestContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation: Option<Conversation>,
    pub chat_message: ConversationMessage,
}

impl ChatRequest {
    /// Create a request carrying only a user message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            request_context: None,
            conversation: None,
            chat_message: ConversationMessage::user(message),
        }
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.request_context = Some(context);
        self
    }

    pub fn with_history(mut self, history: Vec<ConversationMessage>) -> Self {
        self.conversation = Some(Conversation { history });
        self
    }

    /// History messages in caller order (empty when absent)
    pub fn history(&self) -> &[ConversationMessage] {
        self.conversation
            .as_ref()
            .map(|c| c.history.as_slice())
            .unwrap_or(&[])
    }
}

/// Successful outcome of a chat request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    #[serde(flatten)]
    pub message: ConversationMessage,
    /// Set when the tool loop stopped at its iteration bound with calls still pending
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub iteration_cap_reached: bool,
}

impl ChatReply {
    /// Wrap the final answer as an assistant message stamped with the current time
    pub fn assistant(text: impl Into<String>) -> Self {
        let mut message = ConversationMessage::assistant(text);
        message.creation_date = Some(Utc::now().timestamp_millis());
        Self {
            message,
            iteration_cap_reached: false,
        }
    }

    pub fn text(&self) -> &str {
        &self.message.message
    }
}
