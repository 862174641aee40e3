//! Message types for the `graphql-ws` subscription protocol.
//!
//! Defines the protocol between client and server:
//! - Client → Server: connection init, subscription start/stop
//! - Server → Client: connection ack, subscription data, keep-alives, errors

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::domain::foundation::SubscriptionId;

/// Subprotocol identifier negotiated with the server at transport open.
pub const GRAPHQL_WS_PROTOCOL: &str = "graphql-ws";

// ============================================
// Client → Server Messages
// ============================================

/// All message types that can be sent from client to server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Opens the handshake on a freshly opened transport.
    ConnectionInit { payload: Value },

    /// Starts (or replays) a subscription.
    Start {
        id: SubscriptionId,
        payload: StartPayload,
    },

    /// Stops a subscription on the server.
    Stop { id: SubscriptionId },
}

impl ClientMessage {
    /// Builds a `connection_init` carrying the given payload.
    pub fn connection_init(payload: Value) -> Self {
        ClientMessage::ConnectionInit { payload }
    }

    /// Builds a `start` for a subscription.
    pub fn start(id: SubscriptionId, query: impl Into<String>, variables: Value) -> Self {
        ClientMessage::Start {
            id,
            payload: StartPayload {
                query: query.into(),
                variables,
            },
        }
    }

    /// Builds a `stop` for a subscription.
    pub fn stop(id: SubscriptionId) -> Self {
        ClientMessage::Stop { id }
    }

    /// Wire name of the message type, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientMessage::ConnectionInit { .. } => "connection_init",
            ClientMessage::Start { .. } => "start",
            ClientMessage::Stop { .. } => "stop",
        }
    }

    /// Returns the subscription id this message targets, if any.
    pub fn subscription_id(&self) -> Option<SubscriptionId> {
        match self {
            ClientMessage::ConnectionInit { .. } => None,
            ClientMessage::Start { id, .. } | ClientMessage::Stop { id } => Some(*id),
        }
    }
}

/// Payload of a `start` message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StartPayload {
    pub query: String,
    pub variables: Value,
}

// ============================================
// Server → Client Messages
// ============================================

/// All message types that can be received from the server.
///
/// Types the client does not know decode to [`ServerMessage::Unknown`]
/// so newer servers never break older clients.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Handshake accepted.
    ConnectionAck,

    /// Handshake rejected.
    ConnectionError {
        #[serde(default)]
        payload: Value,
    },

    /// Keep-alive.
    Ka,

    /// Result event for a subscription.
    Data(DataMessage),

    /// Operation-level error for a subscription.
    Error {
        #[serde(default, deserialize_with = "lenient_id")]
        id: Option<SubscriptionId>,
        #[serde(default)]
        payload: Value,
    },

    /// Server finished a subscription.
    Complete {
        #[serde(default, deserialize_with = "lenient_id")]
        id: Option<SubscriptionId>,
    },

    #[serde(other)]
    Unknown,
}

/// A `data` message routed to one subscription's callback.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataMessage {
    /// `None` when the id was missing or not numeric; such messages match
    /// no subscription.
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<SubscriptionId>,

    #[serde(default)]
    pub payload: Value,
}

/// Accepts a number or numeric text; anything else becomes `None`.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<SubscriptionId>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Number(n) => n.as_u64().map(SubscriptionId::new),
        Value::String(s) => s.parse().ok(),
        _ => None,
    })
}
