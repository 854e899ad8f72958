use std::collections::HashSet;

use promodb_core::{RetailerScrapeConfig, DEFAULT_TOKEN_PATTERN};
use regex::Regex;

use crate::error::ScraperError;

/// Compiled token heuristics for one retailer: the candidate pattern, the
/// keywords that anchor proximity windows, and the uppercase stop-list.
#[derive(Debug, Clone)]
pub struct TokenRules {
    pattern: Regex,
    keywords: Vec<String>,
    stop: HashSet<String>,
}

impl TokenRules {
    /// # Errors
    ///
    /// Returns [`ScraperError::InvalidPattern`] if `pattern` does not compile.
    pub fn new(pattern: &str, keywords: &[String], stop: &[String]) -> Result<Self, ScraperError> {
        let pattern = Regex::new(pattern).map_err(|source| ScraperError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self::with_regex(pattern, keywords, stop))
    }

    fn with_regex(pattern: Regex, keywords: &[String], stop: &[String]) -> Self {
        Self {
            pattern,
            keywords: keywords
                .iter()
                .filter(|k| !k.trim().is_empty())
                .cloned()
                .collect(),
            stop: stop.iter().map(|s| s.trim().to_uppercase()).collect(),
        }
    }

    /// Build rules from a resolved retailer config. A pattern that fails to
    /// compile falls back to the default token pattern.
    #[must_use]
    pub fn from_config(config: &RetailerScrapeConfig) -> Self {
        match Self::new(&config.token_pattern, &config.keywords, &config.stop) {
            Ok(rules) => rules,
            Err(e) => {
                tracing::warn!(
                    platform = %config.platform,
                    error = %e,
                    "falling back to default token pattern"
                );
                Self::with_regex(default_pattern(), &config.keywords, &config.stop)
            }
        }
    }

    #[must_use]
    pub fn pattern(&self) -> &Regex {
        &self.pattern
    }

    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    #[must_use]
    pub fn is_stopped(&self, token: &str) -> bool {
        self.stop.contains(&token.to_uppercase())
    }

    /// Extract candidate tokens from `text` and drop stop-listed ones.
    #[must_use]
    pub fn extract(&self, text: &str) -> Vec<String> {
        self.filter(extract_tokens(text, &self.pattern))
    }

    /// Remove stop-listed tokens, keeping order.
    #[must_use]
    pub fn filter(&self, tokens: Vec<String>) -> Vec<String> {
        tokens.into_iter().filter(|t| !self.is_stopped(t)).collect()
    }
}

impl Default for TokenRules {
    fn default() -> Self {
        Self::with_regex(default_pattern(), &[], &[])
    }
}

fn default_pattern() -> Regex {
    Regex::new(DEFAULT_TOKEN_PATTERN).expect("valid default token regex")
}

/// Run `pattern` over the uppercased `text` and return the matches, trimmed
/// and deduplicated in first-seen order.
#[must_use]
pub fn extract_tokens(text: &str, pattern: &Regex) -> Vec<String> {
    let upper = text.to_uppercase();
    let mut seen = HashSet::new();
    let mut tokens = Vec::new();
    for m in pattern.find_iter(&upper) {
        let token = m.as_str().trim().to_uppercase();
        if !token.is_empty() && seen.insert(token.clone()) {
            tokens.push(token);
        }
    }
    tokens
}

/// Deduplicate `tokens` preserving first occurrence.
pub(crate) fn dedup(tokens: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = HashSet::new();
    tokens
        .into_iter()
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
