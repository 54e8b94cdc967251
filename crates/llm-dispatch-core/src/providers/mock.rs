//! Mock chat model for testing
//!
//! Replays configured replies without network access and records every call,
//! so tests can assert on what the tool loop sent to the model.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::{ProviderError, ProviderResult};
use super::traits::{ChatModel, ChatModelFactory, ModelResponse};
use crate::domain::Provider;
use crate::types::{ChatMessage, Tool};

/// Mock reply mode
#[derive(Debug, Clone)]
pub enum MockMode {
    /// Return these replies in order, then fail
    Script(VecDeque<Result<ModelResponse, String>>),
    /// Return the same reply on every call
    Always(ModelResponse),
    /// Fail every call
    Error(String),
}

/// One recorded model call
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<Tool>,
}

/// Mock chat model for testing
#[derive(Debug)]
pub struct MockChatModel {
    mode: Mutex<MockMode>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockChatModel {
    pub fn new(mode: MockMode) -> Self {
        Self {
            mode: Mutex::new(mode),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replay `replies` in order
    pub fn scripted(replies: Vec<Result<ModelResponse, String>>) -> Self {
        Self::new(MockMode::Script(replies.into()))
    }

    /// Answer every call with `text`
    pub fn fixed(text: impl Into<String>) -> Self {
        Self::new(MockMode::Always(ModelResponse::text(text)))
    }

    /// Answer every call with the same reply
    pub fn always(response: ModelResponse) -> Self {
        Self::new(MockMode::Always(response))
    }

    /// Fail every call
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(MockMode::Error(message.into()))
    }

    /// Calls received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn chat(&self, messages: &[ChatMessage], tools: &[Tool]) -> ProviderResult<ModelResponse> {
        self.calls.lock().push(RecordedCall {
            messages: messages.to_vec(),
            tools: tools.to_vec(),
        });

        let reply = match &mut *self.mode.lock() {
            MockMode::Script(replies) => replies
                .pop_front()
                .unwrap_or_else(|| Err("mock script exhausted".to_string())),
            MockMode::Always(response) => Ok(response.clone()),
            MockMode::Error(message) => Err(message.clone()),
        };

        reply.map_err(|message| ProviderError::api_error("mock", message))
    }
}

/// Factory handing out one shared mock model
#[derive(Debug)]
pub struct MockModelFactory {
    model: Arc<MockChatModel>,
    created: AtomicUsize,
}

impl MockModelFactory {
    pub fn new(model: Arc<MockChatModel>) -> Self {
        Self {
            model,
            created: AtomicUsize::new(0),
        }
    }

    /// Number of models handed out
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

impl ChatModelFactory for MockModelFactory {
    fn create(&self, _provider: &Provider) -> ProviderResult<Arc<dyn ChatModel>> {
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(self.model.clone())
    }
}
