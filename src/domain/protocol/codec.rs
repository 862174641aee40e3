//! Symmetric text encoding of protocol messages, one message per frame.

use super::messages::{ClientMessage, ServerMessage};
use crate::domain::foundation::ProtocolError;

/// Serializes an outbound message into a single text frame.
pub fn encode(message: &ClientMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

/// Parses one inbound text frame.
///
/// Unknown message types are not an error; they decode to
/// [`ServerMessage::Unknown`]. Invalid JSON or a frame without a `type`
/// field is reported as [`ProtocolError::Malformed`].
pub fn decode(frame: &str) -> Result<ServerMessage, ProtocolError> {
    serde_json::from_str(frame).map_err(|e| ProtocolError::malformed(e.to_string(), frame))
}
