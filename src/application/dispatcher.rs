//! Inbound dispatcher: decodes frames and routes them.
//!
//! `data` messages are delivered straight to the owning subscription's
//! callback. Handshake acknowledgements are reported back to the caller,
//! which owns the connection lifecycle.

use crate::domain::foundation::{ProtocolError, SubscriptionId};
use crate::domain::protocol::{decode, DataMessage, ServerMessage};
use crate::domain::subscription::SubscriptionRegistry;

/// Outcome of dispatching one inbound frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// `connection_ack` received; the connection may move to connected.
    Acknowledged,

    /// Payload handed to this subscription's callback.
    Delivered(SubscriptionId),

    /// `data` for an id nobody is subscribed to (usually a race with
    /// unsubscribe).
    Dropped,

    /// A message with no effect on the client.
    Ignored,
}

/// Decodes `frame` and routes it.
///
/// # Errors
///
/// Returns [`ProtocolError::Malformed`] if the frame cannot be decoded.
/// Unknown message types are not errors.
pub fn dispatch(
    frame: &str,
    registry: &mut SubscriptionRegistry,
) -> Result<Dispatch, ProtocolError> {
    let outcome = match decode(frame)? {
        ServerMessage::ConnectionAck => Dispatch::Acknowledged,
        ServerMessage::Data(DataMessage { id, payload }) => {
            match id.and_then(|id| registry.find(id)) {
                Some(subscription) => {
                    subscription.deliver(payload);
                    Dispatch::Delivered(subscription.id())
                }
                None => {
                    tracing::debug!(
                        subscription_id = ?id,
                        "Dropping data for unknown subscription"
                    );
                    Dispatch::Dropped
                }
            }
        }
        ServerMessage::Ka => {
            tracing::trace!("Keep-alive received");
            Dispatch::Ignored
        }
        ServerMessage::Complete { id } => {
            tracing::debug!(subscription_id = ?id, "Server completed subscription");
            Dispatch::Ignored
        }
        ServerMessage::Error { id, payload } => {
            tracing::warn!(subscription_id = ?id, %payload, "Server reported subscription error");
            Dispatch::Ignored
        }
        ServerMessage::ConnectionError { payload } => {
            tracing::warn!(%payload, "Server rejected connection");
            Dispatch::Ignored
        }
        ServerMessage::Unknown => {
            tracing::debug!("Ignoring message of unknown type");
            Dispatch::Ignored
        }
    };

    Ok(outcome)
}
