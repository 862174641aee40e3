//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    #[error("Endpoint URL must use ws:// or wss://")]
    UnsupportedScheme,

    #[error("Subprotocol must not be empty")]
    EmptyProtocol,

    #[error("Backoff initial delay exceeds maximum delay")]
    InvalidBackoffRange,

    #[error("Backoff multiplier must be at least 1.0")]
    InvalidBackoffMultiplier,

    #[error("Variables must be a JSON object: {0}")]
    InvalidVariables(String),
}
