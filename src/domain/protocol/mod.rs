//! Wire protocol spoken over the transport.
//!
//! - [`messages`] - typed client and server messages
//! - [`codec`] - JSON text encoding, one message per transport frame

pub mod codec;
pub mod messages;

pub use codec::{decode, encode};
pub use messages::{ClientMessage, DataMessage, ServerMessage, StartPayload, GRAPHQL_WS_PROTOCOL};
