//! Parser configuration
//!
//! Defaults come from the environment (with hard-coded fallbacks), and a
//! full configuration can be loaded from YAML.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Tokenizer search aborts once this many states are queued
pub const DEFAULT_MAX_FRONTIER: usize = 1000;

/// Longest word window classified as a single token
pub const DEFAULT_MAX_SPAN_WORDS: usize = 3;

/// Questions older than this are not answered implicitly
pub const DEFAULT_QUESTION_WINDOW_SECS: u64 = 15;

/// Names per character-status request
pub const DEFAULT_CHARACTER_BATCH_SIZE: usize = 100;

/// Minimum Jaro-Winkler similarity accepted by the reference matchers
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.97;

/// Queries shorter than this only match exactly
pub const DEFAULT_FUZZY_MIN_LEN: usize = 5;

/// Chat parser configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParserConfig {
    pub max_frontier: usize,
    pub max_span_words: usize,
    pub question_window_secs: u64,
    pub character_batch_size: usize,
    pub fuzzy_threshold: f64,
    pub fuzzy_min_len: usize,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            max_frontier: env_or("INTEL_MAX_FRONTIER", DEFAULT_MAX_FRONTIER),
            max_span_words: DEFAULT_MAX_SPAN_WORDS,
            question_window_secs: env_or("INTEL_QUESTION_WINDOW_SECS", DEFAULT_QUESTION_WINDOW_SECS),
            character_batch_size: env_or(
                "INTEL_CHARACTER_BATCH_SIZE",
                DEFAULT_CHARACTER_BATCH_SIZE,
            ),
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            fuzzy_min_len: DEFAULT_FUZZY_MIN_LEN,
        }
    }
}

impl ParserConfig {
    /// Load a configuration from a YAML file. Missing fields take defaults.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ParserConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_frontier == 0 {
            return Err(invalid("max_frontier", "must be at least 1"));
        }
        if self.max_span_words == 0 {
            return Err(invalid("max_span_words", "must be at least 1"));
        }
        if self.character_batch_size == 0 {
            return Err(invalid("character_batch_size", "must be at least 1"));
        }
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(invalid(
                "fuzzy_threshold",
                format!("{} is outside 0.0..=1.0", self.fuzzy_threshold),
            ));
        }
        Ok(())
    }

    pub fn question_window(&self) -> Duration {
        Duration::from_secs(self.question_window_secs)
    }
}

fn invalid(field: &'static str, message: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        field,
        message: message.into(),
    }
}

fn env_or<T: std::str::FromStr>(key: &str, fallback: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(fallback)
}
