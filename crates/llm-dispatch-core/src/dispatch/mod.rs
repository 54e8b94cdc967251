//! Chat dispatch
//!
//! `ProviderRouter` resolves the configuration for a request and delegates
//! to the `ChatOrchestrator` of its provider type. `AgenticOrchestrator`
//! runs the bounded tool-calling conversation.

mod error;
mod orchestrator;
mod router;

pub use error::{DispatchError, DispatchResult};
pub use orchestrator::{AgenticOrchestrator, ChatOrchestrator};
pub use router::{ProviderRouter, ProviderRouterBuilder};
