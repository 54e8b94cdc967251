//! Core types for chat dispatch
//!
//! This module contains the message, tool and request types shared across
//! the resolver, providers and the tool loop.

mod message;
mod request;
mod tool;

pub use message::{ChatMessage, ContentPart, MessageRole, MessageContent};
pub use request::{
    ChatReply, ChatRequest, Conversation, ConversationMessage, ConversationRole, RequestContext,
    RequestFilter,
};
pub use tool::{Tool, ToolCall, ToolResult};
