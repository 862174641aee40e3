//! Errors surfaced by the subscription client.

use thiserror::Error;

use crate::config::ValidationError;
use crate::domain::foundation::{ProtocolError, TransitionError};
use crate::ports::TransportError;

/// Errors returned from client construction, `connect`, and event handling.
///
/// `subscribe` and `unsubscribe` never return errors; their failures are
/// logged and observable through [`crate::application::SubscriptionClient::state`].
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transition(#[from] TransitionError),
}

impl ClientError {
    /// True for inbound frames the client could not understand.
    pub fn is_protocol(&self) -> bool {
        matches!(self, ClientError::Protocol(_))
    }
}
