//! Tool management
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  ToolDiscovery                              │
//! │    for each tool server of a configuration: │
//! │      connect -> health check -> list tools  │
//! └─────────────────────────────────────────────┘
//!           │
//!           ▼
//! ┌─────────────────────────────────────────────┐
//! │  ToolRegistry (one per chat request)        │
//! │    name -> RemoteTool (spec + live client)  │
//! │    close(): each distinct client once       │
//! └─────────────────────────────────────────────┘
//! ```

mod discovery;
mod registry;

pub use discovery::ToolDiscovery;
pub use registry::{RemoteTool, ToolRegistry};
