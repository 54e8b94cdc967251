//! GenaiChatModel - chat model backed by the genai crate

use std::sync::Arc;

use async_trait::async_trait;
use genai::chat::{ChatOptions, ChatRequest as GenaiRequest};
use genai::Client;

use crate::config::ProviderSettings;
use crate::domain::Provider;
use crate::logging::Logger;
use crate::types::{ChatMessage, Tool};

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    chat_options, create_client, from_genai_response, to_genai_messages, to_genai_tools,
};
use super::traits::{ChatModel, ChatModelFactory, ModelResponse};

/// Chat model bound to one provider record
pub struct GenaiChatModel {
    provider: Provider,
    client: Client,
    options: Option<ChatOptions>,
    settings: ProviderSettings,
    logger: Arc<dyn Logger>,
}

impl GenaiChatModel {
    pub fn new(provider: &Provider, settings: ProviderSettings, logger: Arc<dyn Logger>) -> Self {
        Self {
            client: create_client(provider),
            options: chat_options(provider),
            provider: provider.clone(),
            settings,
            logger,
        }
    }

    fn log_request(&self, messages: &[ChatMessage], tools: &[Tool]) {
        let tool_names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        self.logger.debug(&format!(
            "[GenaiChatModel] Request to {}: {} message(s), tools {:?}: {}",
            self.provider.model_name,
            messages.len(),
            tool_names,
            serde_json::to_string(messages).unwrap_or_default()
        ));
    }

    fn log_response(&self, response: &ModelResponse) {
        self.logger.debug(&format!(
            "[GenaiChatModel] Response from {}: text {:?}, tool calls {}",
            self.provider.model_name,
            response.text,
            serde_json::to_string(&response.tool_calls).unwrap_or_default()
        ));
    }
}

#[async_trait]
impl ChatModel for GenaiChatModel {
    async fn chat(&self, messages: &[ChatMessage], tools: &[Tool]) -> ProviderResult<ModelResponse> {
        self.logger.info(&format!(
            "[GenaiChatModel] chat called: provider={}, model={}, tools={}",
            self.provider.id,
            self.provider.model_name,
            tools.len()
        ));

        let mut request = GenaiRequest::new(to_genai_messages(messages)?);
        if !tools.is_empty() {
            request = request.with_tools(to_genai_tools(tools));
        }

        if self.settings.log_requests {
            self.log_request(messages, tools);
        }

        let call = self
            .client
            .exec_chat(self.provider.model_name.as_str(), request, self.options.as_ref());

        let response = tokio::time::timeout(self.settings.timeout(), call)
            .await
            .map_err(|_| ProviderError::Timeout {
                provider: self.provider.id.clone(),
                seconds: self.settings.timeout_secs,
            })?
            .map_err(|e| ProviderError::api_error(&self.provider.id, e.to_string()))?;

        let response = from_genai_response(&response);

        if self.settings.log_responses {
            self.log_response(&response);
        }

        Ok(response)
    }
}

/// Builds `GenaiChatModel`s sharing the same provider settings
pub struct GenaiModelFactory {
    settings: ProviderSettings,
    logger: Arc<dyn Logger>,
}

impl GenaiModelFactory {
    pub fn new(settings: ProviderSettings, logger: Arc<dyn Logger>) -> Self {
        Self { settings, logger }
    }
}

impl ChatModelFactory for GenaiModelFactory {
    fn create(&self, provider: &Provider) -> ProviderResult<Arc<dyn ChatModel>> {
        self.logger.debug(&format!(
            "[GenaiModelFactory] Creating model for provider '{}' at {}",
            provider.id, provider.llm_url
        ));
        Ok(Arc::new(GenaiChatModel::new(
            provider,
            self.settings.clone(),
            Arc::clone(&self.logger),
        )))
    }
}
