//! Error types for the chat intel crate
//!
//! Message parsing itself never fails: ambiguous or malformed chat text
//! degrades to untyped tokens, and lookup failures are treated as "unknown".
//! The errors here cover the surfaces that can genuinely fail, loading
//! configuration and reference data.

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum IntelError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Universe error: {0}")]
    Universe(#[from] UniverseError),
}

/// Parser configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

/// Errors loading the in-memory reference universe
#[derive(Error, Debug)]
pub enum UniverseError {
    #[error("Failed to read universe file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid universe YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Duplicate {kind} name '{name}'")]
    Duplicate { kind: &'static str, name: String },
}

pub type Result<T> = std::result::Result<T, IntelError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_errors_convert() {
        let err: IntelError = ConfigError::InvalidValue {
            field: "max_frontier",
            message: "must be positive".to_string(),
        }
        .into();
        assert!(matches!(err, IntelError::Config(_)));
        assert!(err.to_string().contains("max_frontier"));

        let err: IntelError = UniverseError::Duplicate {
            kind: "ship",
            name: "Loki".to_string(),
        }
        .into();
        assert!(matches!(err, IntelError::Universe(_)));
        assert_eq!(err.to_string(), "Universe error: Duplicate ship name 'Loki'");
    }
}
