//! Error types for the domain layer.

use thiserror::Error;

/// Errors raised while encoding or decoding protocol frames.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed inbound frame: {reason}")]
    Malformed { reason: String, frame: String },

    #[error("Failed to encode outbound message: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ProtocolError {
    /// Creates a malformed frame error, keeping the offending frame for logs.
    pub fn malformed(reason: impl Into<String>, frame: impl Into<String>) -> Self {
        ProtocolError::Malformed {
            reason: reason.into(),
            frame: frame.into(),
        }
    }
}

/// Raised when a state machine is asked for a transition it does not allow.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot transition from {from} to {to}")]
pub struct TransitionError {
    pub from: String,
    pub to: String,
}
