//! Provider routing
//!
//! Resolves the configuration for a request and hands the request to the
//! orchestrator registered for the configuration's provider type.

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::DispatchConfig;
use crate::domain::ProviderType;
use crate::logging::Logger;
use crate::mcp::McpConnector;
use crate::providers::GenaiModelFactory;
use crate::resolver::ConfigurationResolver;
use crate::store::ConfigurationStore;
use crate::types::{ChatReply, ChatRequest};

use super::error::{DispatchError, DispatchResult};
use super::orchestrator::{AgenticOrchestrator, ChatOrchestrator};

/// Entry point for chat requests
pub struct ProviderRouter {
    resolver: ConfigurationResolver,
    orchestrators: HashMap<ProviderType, Arc<dyn ChatOrchestrator>>,
    logger: Arc<dyn Logger>,
}

impl ProviderRouter {
    pub fn builder(resolver: ConfigurationResolver, logger: Arc<dyn Logger>) -> ProviderRouterBuilder {
        ProviderRouterBuilder {
            resolver,
            orchestrators: HashMap::new(),
            logger,
        }
    }

    /// Router backed by genai models and rmcp tool clients
    pub fn with_defaults(
        store: Arc<dyn ConfigurationStore>,
        config: Arc<DispatchConfig>,
        logger: Arc<dyn Logger>,
    ) -> DispatchResult<Self> {
        let resolver = ConfigurationResolver::new(store, Arc::clone(&logger));
        let orchestrator: Arc<dyn ChatOrchestrator> = Arc::new(AgenticOrchestrator::new(
            Arc::new(GenaiModelFactory::new(config.provider.clone(), Arc::clone(&logger))),
            Arc::new(McpConnector::new(config.mcp.clone(), Arc::clone(&logger))),
            config,
            Arc::clone(&logger),
        ));

        ProviderType::ALL
            .iter()
            .fold(Self::builder(resolver, logger), |builder, provider_type| {
                builder.orchestrator(*provider_type, Arc::clone(&orchestrator))
            })
            .build()
    }

    /// Resolve the configuration for `request` and let its orchestrator answer
    ///
    /// Fails with `ConfigurationNotFound` before any model or tool call when
    /// no configuration matches.
    pub async fn dispatch(&self, request: &ChatRequest) -> DispatchResult<ChatReply> {
        let configuration = self
            .resolver
            .resolve(request.request_context.as_ref())
            .await?
            .ok_or(DispatchError::ConfigurationNotFound)?;

        let provider_type = configuration.provider.provider_type;
        let orchestrator = self
            .orchestrators
            .get(&provider_type)
            .ok_or(DispatchError::MissingOrchestrator(provider_type))?;

        self.logger.info(&format!(
            "[ProviderRouter] Dispatching to {} orchestrator with configuration '{}'",
            provider_type, configuration.id
        ));

        orchestrator.chat(&configuration, request).await
    }
}

/// Builder requiring an orchestrator for every provider type
pub struct ProviderRouterBuilder {
    resolver: ConfigurationResolver,
    orchestrators: HashMap<ProviderType, Arc<dyn ChatOrchestrator>>,
    logger: Arc<dyn Logger>,
}

impl ProviderRouterBuilder {
    /// Register the orchestrator serving `provider_type`
    pub fn orchestrator(mut self, provider_type: ProviderType, orchestrator: Arc<dyn ChatOrchestrator>) -> Self {
        self.orchestrators.insert(provider_type, orchestrator);
        self
    }

    pub fn build(self) -> DispatchResult<ProviderRouter> {
        if let Some(missing) = ProviderType::ALL
            .iter()
            .find(|provider_type| !self.orchestrators.contains_key(*provider_type))
        {
            return Err(DispatchError::MissingOrchestrator(*missing));
        }

        Ok(ProviderRouter {
            resolver: self.resolver,
            orchestrators: self.orchestrators,
            logger: self.logger,
        })
    }
}
