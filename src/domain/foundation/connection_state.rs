//! Connection lifecycle states.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::StateMachine;

/// Lifecycle of the client's single transport.
///
/// ```text
/// Disconnected --connect--> Connecting --ack--> Connected
///      ^                        |                   |
///      +--------close-----------+-------close-------+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    /// No transport handle exists.
    #[default]
    Disconnected,

    /// A transport has been requested; waiting for open and handshake ack.
    Connecting,

    /// Handshake acknowledged; messages are sent immediately.
    Connected,
}

impl ConnectionState {
    /// Returns true once the handshake has been acknowledged.
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Returns true while a transport handle is live (connecting or connected).
    pub fn has_transport(&self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }
}

impl StateMachine for ConnectionState {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConnectionState::*;
        matches!(
            (self, target),
            (Disconnected, Connecting)
                | (Connecting, Connected)
                | (Connecting, Disconnected)
                | (Connected, Disconnected)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConnectionState::*;
        match self {
            Disconnected => vec![Connecting],
            Connecting => vec![Connected, Disconnected],
            Connected => vec![Disconnected],
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        };
        write!(f, "{}", s)
    }
}
