//! Client configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `GQL_SUBSCRIBER` prefix and nested values use double underscores as separators.
//!
//! # Example
//!
//! ```no_run
//! use gql_subscriber::config::ClientConfig;
//!
//! let config = ClientConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Subscribing via {}", config.url);
//! ```

mod backoff;
mod error;
mod operation;

pub use backoff::BackoffConfig;
pub use error::{ConfigError, ValidationError};
pub use operation::OperationConfig;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::domain::protocol::GRAPHQL_WS_PROTOCOL;

const ENV_PREFIX: &str = "GQL_SUBSCRIBER";

/// Construction options for [`crate::application::SubscriptionClient`].
#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Endpoint address (`ws://` or `wss://`)
    pub url: String,

    /// Defer the first connection until `connect` or `subscribe`
    #[serde(default)]
    pub lazy: bool,

    /// Re-establish the connection and replay subscriptions after a close
    #[serde(default)]
    pub reconnect: bool,

    /// Subprotocol sent during transport negotiation
    #[serde(default = "default_protocol")]
    pub protocol: String,

    /// Payload of the `connection_init` message
    #[serde(skip, default = "default_init_payload")]
    pub init_payload: Value,

    /// Reconnect delay schedule
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Rust log filter directive
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl ClientConfig {
    /// Configuration for `url` with every other option at its default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            lazy: false,
            reconnect: false,
            protocol: default_protocol(),
            init_payload: default_init_payload(),
            backoff: BackoffConfig::default(),
            log_level: default_log_level(),
        }
    }

    pub fn lazy(mut self, lazy: bool) -> Self {
        self.lazy = lazy;
        self
    }

    pub fn reconnect(mut self, reconnect: bool) -> Self {
        self.reconnect = reconnect;
        self
    }

    pub fn init_payload(mut self, payload: Value) -> Self {
        self.init_payload = payload;
        self
    }

    pub fn backoff(mut self, backoff: BackoffConfig) -> Self {
        self.backoff = backoff;
        self
    }

    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `GQL_SUBSCRIBER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `GQL_SUBSCRIBER__URL=wss://...` -> `url = ...`
    /// - `GQL_SUBSCRIBER__RECONNECT=true` -> `reconnect = true`
    /// - `GQL_SUBSCRIBER__BACKOFF__MAX_DELAY_MS=5000` -> `backoff.max_delay_ms = 5000`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Required environment variables are missing
    /// - Values cannot be parsed into expected types
    pub fn load() -> Result<Self, ConfigError> {
        load_from_env()
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(ValidationError::MissingRequired("url"));
        }
        let uri: http::Uri = url
            .parse()
            .map_err(|e: http::uri::InvalidUri| ValidationError::InvalidUrl(e.to_string()))?;
        match uri.scheme_str() {
            Some("ws") | Some("wss") => {}
            _ => return Err(ValidationError::UnsupportedScheme),
        }
        if uri.host().is_none() {
            return Err(ValidationError::InvalidUrl(format!("missing host in '{}'", url)));
        }
        if self.protocol.trim().is_empty() {
            return Err(ValidationError::EmptyProtocol);
        }
        self.backoff.validate()?;
        Ok(())
    }
}

impl OperationConfig {
    /// Load the runner's operation from the same environment as the client.
    ///
    /// - `GQL_SUBSCRIBER__QUERY=subscription { ... }`
    /// - `GQL_SUBSCRIBER__VARIABLES={"room": "lobby"}`
    pub fn load() -> Result<Self, ConfigError> {
        load_from_env()
    }
}

fn load_from_env<T: DeserializeOwned>() -> Result<T, ConfigError> {
    // Load .env file if present (development)
    dotenvy::dotenv().ok();

    let config = config::Config::builder()
        .add_source(
            config::Environment::default()
                .prefix(ENV_PREFIX)
                .separator("__"),
        )
        .build()?
        .try_deserialize()?;

    Ok(config)
}

fn default_protocol() -> String {
    GRAPHQL_WS_PROTOCOL.to_string()
}

fn default_init_payload() -> Value {
    Value::Object(Default::default())
}

fn default_log_level() -> String {
    "info,gql_subscriber=debug".to_string()
}
