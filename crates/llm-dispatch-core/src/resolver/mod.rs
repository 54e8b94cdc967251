//! Configuration resolution
//!
//! Maps a request's filter key and value onto the single stored
//! configuration that should serve it.

mod config_resolver;

pub use config_resolver::{pattern_matches, specificity, ConfigurationResolver};
