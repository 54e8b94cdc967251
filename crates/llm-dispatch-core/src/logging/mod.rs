//! Logging abstractions
//!
//! Components take a `SharedLogger`; production code uses `TracingLogger`.

mod memory;
mod tracing_logger;
mod traits;

pub use memory::{LogLevel, MemoryLogger, NoOpLogger};
pub use tracing_logger::{init_tracing, TracingLogger};
pub use traits::{Logger, SharedLogger};
