//! Subscription operation configuration for the command-line runner

use serde::Deserialize;
use serde_json::Value;

use super::error::ValidationError;

/// The query the runner subscribes to.
#[derive(Debug, Clone, Deserialize)]
pub struct OperationConfig {
    /// Subscription document sent in the `start` payload
    pub query: String,

    /// Variables as a JSON object literal
    pub variables: Option<String>,
}

impl OperationConfig {
    /// Parse variables into JSON, defaulting to an empty object
    pub fn variables_json(&self) -> Result<Value, ValidationError> {
        match self.variables.as_deref().map(str::trim) {
            None | Some("") => Ok(Value::Object(Default::default())),
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(value @ Value::Object(_)) => Ok(value),
                Ok(other) => Err(ValidationError::InvalidVariables(format!(
                    "expected object, got {}",
                    other
                ))),
                Err(e) => Err(ValidationError::InvalidVariables(e.to_string())),
            },
        }
    }

    /// Validate operation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.query.trim().is_empty() {
            return Err(ValidationError::MissingRequired("query"));
        }
        self.variables_json().map(|_| ())
    }
}
