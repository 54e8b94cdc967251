//! Configuration resolution by filter key and value pattern
//!
//! Resolution rules:
//! - Candidates are the stored configurations whose filter key equals the
//!   request key (or that carry no filter when the request has no key).
//! - Without a request value, the first candidate whose filter has no value
//!   (the catch-all) wins. Patterns never match an absent value, not even `*`.
//! - With a request value, candidates whose pattern matches the whole value
//!   survive; the pattern with the most literal (non-`*`) characters wins and
//!   ties go to the first one found.

use std::sync::Arc;

use glob::{MatchOptions, Pattern};

use crate::domain::Configuration;
use crate::logging::Logger;
use crate::store::{ConfigurationStore, StoreResult};
use crate::types::RequestContext;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

/// Picks the single best configuration for a request context
#[derive(Clone)]
pub struct ConfigurationResolver {
    store: Arc<dyn ConfigurationStore>,
    logger: Arc<dyn Logger>,
}

impl ConfigurationResolver {
    pub fn new(store: Arc<dyn ConfigurationStore>, logger: Arc<dyn Logger>) -> Self {
        Self { store, logger }
    }

    /// Resolve the configuration for `context`
    ///
    /// Returns `Ok(None)` when nothing matches.
    pub async fn resolve(&self, context: Option<&RequestContext>) -> StoreResult<Option<Configuration>> {
        let filter_key = context.and_then(RequestContext::filter_key);
        let filter_value = context.and_then(RequestContext::filter_value);

        let candidates = self.store.find_by_filter_key(filter_key).await?;
        self.logger.debug(&format!(
            "[ConfigurationResolver] {} candidate(s) for key {:?}",
            candidates.len(),
            filter_key
        ));

        let selected = match filter_value {
            None => select_catch_all(candidates),
            Some(value) => self.select_most_specific(candidates, value),
        };

        match &selected {
            Some(configuration) => self.logger.info(&format!(
                "[ConfigurationResolver] Resolved configuration '{}' for key {:?}",
                configuration.id, filter_key
            )),
            None => self.logger.warn(&format!(
                "[ConfigurationResolver] No configuration for key {:?} and value {:?}",
                filter_key, filter_value
            )),
        }

        Ok(selected)
    }

    fn select_most_specific(&self, candidates: Vec<Configuration>, value: &str) -> Option<Configuration> {
        let mut best: Option<(usize, Configuration)> = None;

        for configuration in candidates {
            let Some(pattern) = configuration.filter_value() else {
                continue;
            };
            match pattern_matches(pattern, value) {
                Ok(true) => {}
                Ok(false) => continue,
                Err(e) => {
                    self.logger.warn(&format!(
                        "[ConfigurationResolver] Skipping configuration '{}' with unusable pattern '{}': {}",
                        configuration.id, pattern, e
                    ));
                    continue;
                }
            }

            let score = specificity(pattern);
            // Strictly greater keeps the first of equally specific patterns
            if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
                best = Some((score, configuration));
            }
        }

        best.map(|(_, configuration)| configuration)
    }
}

fn select_catch_all(candidates: Vec<Configuration>) -> Option<Configuration> {
    candidates
        .into_iter()
        .find(|c| c.filter_value().is_none())
}

/// Number of literal characters in a value pattern
pub fn specificity(pattern: &str) -> usize {
    pattern.chars().filter(|c| *c != '*').count()
}

/// Whether `pattern` matches the whole of `value`
///
/// `*` matches any run of characters (including none); everything else is literal.
pub fn pattern_matches(pattern: &str, value: &str) -> Result<bool, glob::PatternError> {
    let compiled = Pattern::new(&to_glob(pattern))?;
    Ok(compiled.matches_with(value, MATCH_OPTIONS))
}

/// Escape every glob metacharacter except `*`, collapsing runs of `*`
fn to_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len());
    let mut last_was_star = false;

    for (i, segment) in pattern.split('*').enumerate() {
        if i > 0 && !last_was_star {
            glob.push('*');
            last_was_star = true;
        }
        if !segment.is_empty() {
            glob.push_str(&Pattern::escape(segment));
            last_was_star = false;
        }
    }

    glob
}
