//! Error hierarchy for Redraft.

use crate::provider::Provider;
use thiserror::Error;

/// Errors from configuration and credential validation.
///
/// Always surfaced before any network attempt is made.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file parse error at {path}: {message}")]
    Parse { path: String, message: String },

    #[error("Missing required configuration: {key}")]
    MissingKey { key: String },

    #[error("Invalid configuration value for '{key}': {message}")]
    InvalidValue { key: String, message: String },
}

/// Errors from talking to a provider.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Non-2xx response, with the best message the body yielded.
    #[error("{provider} API error {status}: {message}")]
    Http {
        provider: Provider,
        status: u16,
        message: String,
    },

    #[error("Network error: {0}")]
    Network(String),

    #[error("Stream parse error: {0}")]
    StreamParse(String),
}
