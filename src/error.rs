//! Error types for the derived-query engine.

use thiserror::Error;

/// Errors surfaced by the derive engine and its configuration layer
#[derive(Debug, Error)]
pub enum DeriveError {
    #[error("Derive group not found: {0}")]
    GroupNotFound(String),

    #[error("Derive method not found: {group}.{method}")]
    MethodNotFound { group: String, method: String },

    #[error("Factory for {group}.{method} failed: {source}")]
    FactoryFailed {
        group: String,
        method: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("Invalid availability rule for group '{group}': {reason}")]
    InvalidRule { group: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to load chain context from {path}: {reason}")]
    ContextLoad { path: std::path::PathBuf, reason: String },
}

impl From<config::ConfigError> for DeriveError {
    fn from(err: config::ConfigError) -> Self {
        DeriveError::ConfigError(err.to_string())
    }
}
