//! Chat model implementations
//!
//! ## Architecture
//!
//! The tool loop talks to a `ChatModel`, created per request by a
//! `ChatModelFactory` from the resolved provider record. Provider protocols are
//! handled by the `genai` crate; a provider record is mapped onto a genai
//! `ServiceTarget` (endpoint, adapter) plus per-request options carrying the
//! API key, so nothing is read from the environment.
//!
//! `MockChatModel` replays scripted replies for tests.

mod error;
mod genai_adapter;
mod genai_model;
mod mock;
mod traits;

pub use error::{ProviderError, ProviderResult};
pub use genai_adapter::{endpoint_url, to_genai_messages, to_genai_tools};
pub use genai_model::{GenaiChatModel, GenaiModelFactory};
pub use mock::{MockChatModel, MockMode, MockModelFactory, RecordedCall};
pub use traits::{ChatModel, ChatModelFactory, ModelResponse};
