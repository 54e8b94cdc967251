//! Caller-facing dispatch failures

use thiserror::Error;

use crate::domain::ProviderType;
use crate::store::StoreError;

/// Typed failure of a chat request
///
/// Tool lookup and tool execution failures never show up here; they are
/// turned into tool-result messages so the model can react to them.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// No configuration matches the request context
    #[error("No configuration found for the request context")]
    ConfigurationNotFound,

    /// The initial model call failed on every attempt
    #[error("Model call failed: {0}")]
    ModelCallFailed(String),

    /// A follow-up model call inside the tool loop failed on every attempt
    #[error("Follow-up model call failed in iteration {iteration}: {message}")]
    FollowUpFailed { iteration: u32, message: String },

    #[error("Configuration store error: {0}")]
    Store(#[from] StoreError),

    /// Anything else that aborted the conversation
    #[error("Unexpected error: {0}")]
    Unexpected(String),

    /// Raised while building a router, never while dispatching
    #[error("No chat orchestrator registered for provider type {0}")]
    MissingOrchestrator(ProviderType),
}

impl DispatchError {
    /// HTTP-equivalent status code
    pub fn status(&self) -> u16 {
        match self {
            DispatchError::ConfigurationNotFound => 404,
            DispatchError::ModelCallFailed(_)
            | DispatchError::FollowUpFailed { .. }
            | DispatchError::Unexpected(_) => 400,
            DispatchError::Store(_) | DispatchError::MissingOrchestrator(_) => 500,
        }
    }
}

pub type DispatchResult<T> = Result<T, DispatchError>;
