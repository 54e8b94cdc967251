//! `tracing` backed logger

use tracing_subscriber::EnvFilter;

use super::traits::Logger;

/// Logger forwarding every message to `tracing` under the `llm_dispatch` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "llm_dispatch", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "llm_dispatch", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "llm_dispatch", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "llm_dispatch", "{}", message);
    }
}

/// Install a global fmt subscriber
///
/// `RUST_LOG` wins over `default_filter`. Returns `false` if a global
/// subscriber was already installed.
pub fn init_tracing(default_filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init()
        .is_ok()
}
