//! Provider error types

use thiserror::Error;

/// Errors that can occur during a model call
#[derive(Error, Debug)]
pub enum ProviderError {
    /// API request failed
    #[error("{provider} API error: {message}")]
    ApiError { provider: String, message: String },

    /// The call did not complete within the configured timeout
    #[error("{provider} call timed out after {seconds}s")]
    Timeout { provider: String, seconds: u64 },

    /// JSON conversion error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ProviderError {
    /// Create an API error
    pub fn api_error(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ApiError {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
