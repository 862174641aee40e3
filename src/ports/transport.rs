//! Transport port - Interface for the duplex connection collaborator.
//!
//! The client never touches sockets directly. A [`TransportConnector`] opens
//! one [`Transport`] handle per connection attempt and reports that handle's
//! lifecycle through an [`EventSink`]. Events flow over a single channel to
//! the client, which consumes them one at a time in emission order.
//!
//! ```text
//! client ──open(request, sink)──▶ connector ──▶ Box<dyn Transport>
//!   ▲                                              │
//!   └──────── TransportEvent { connection_id, kind } ◀┘
//! ```

use std::fmt;

use tokio::sync::mpsc;

use crate::domain::foundation::ConnectionId;

/// What happened on a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEventKind {
    /// The transport is open and can carry frames.
    Opened,

    /// One inbound text frame.
    Message(String),

    /// The transport is gone; no further events follow for this handle.
    Closed(CloseReason),
}

/// A lifecycle event tagged with the handle it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportEvent {
    pub connection_id: ConnectionId,
    pub kind: TransportEventKind,
}

/// Why a transport closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// The attempt never reached the open state.
    ConnectFailed(String),

    /// The peer closed the connection, optionally with a close code.
    Remote { code: Option<u16>, reason: String },

    /// A read or write failed.
    Error(String),

    /// The local side dropped the handle.
    Local,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::ConnectFailed(e) => write!(f, "connect failed: {}", e),
            CloseReason::Remote { code: Some(code), reason } => {
                write!(f, "closed by peer ({}): {}", code, reason)
            }
            CloseReason::Remote { code: None, reason } => write!(f, "closed by peer: {}", reason),
            CloseReason::Error(e) => write!(f, "transport error: {}", e),
            CloseReason::Local => write!(f, "closed locally"),
        }
    }
}

/// Sending half of the client's event channel.
pub type TransportEventSender = mpsc::UnboundedSender<TransportEvent>;

/// Receiving half of the client's event channel.
pub type TransportEventReceiver = mpsc::UnboundedReceiver<TransportEvent>;

/// Reports the lifecycle of exactly one transport handle.
///
/// Bound to the handle's [`ConnectionId`] so adapters cannot attribute
/// events to the wrong connection. Sends are fire-and-forget: once the
/// client is dropped there is nobody left to tell.
#[derive(Debug, Clone)]
pub struct EventSink {
    connection_id: ConnectionId,
    tx: TransportEventSender,
}

impl EventSink {
    pub fn new(connection_id: ConnectionId, tx: TransportEventSender) -> Self {
        Self { connection_id, tx }
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    pub fn opened(&self) {
        self.emit(TransportEventKind::Opened);
    }

    pub fn message(&self, frame: impl Into<String>) {
        self.emit(TransportEventKind::Message(frame.into()));
    }

    pub fn closed(&self, reason: CloseReason) {
        self.emit(TransportEventKind::Closed(reason));
    }

    fn emit(&self, kind: TransportEventKind) {
        let _ = self.tx.send(TransportEvent {
            connection_id: self.connection_id,
            kind,
        });
    }
}

/// Parameters for one connection attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    pub connection_id: ConnectionId,

    /// Endpoint address, e.g. `wss://example.com/graphql`.
    pub url: String,

    /// Subprotocol negotiated with the server.
    pub protocol: String,

    /// 0 for a first connection, incremented for each consecutive
    /// reconnect that has not yet been acknowledged.
    pub attempt: u32,
}

/// Errors raised by transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("Invalid endpoint URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Transport is closed")]
    Closed,

    #[error("Transport I/O error: {0}")]
    Io(String),
}

/// A live transport handle. Owned exclusively by the client.
pub trait Transport: Send {
    /// Queues one text frame for delivery. Must not block.
    fn send(&mut self, frame: String) -> Result<(), TransportError>;

    /// Shuts the transport down. Further sends fail with
    /// [`TransportError::Closed`].
    fn close(&mut self);
}

/// Opens transport handles.
///
/// `open` must return without waiting on the network; the outcome of the
/// attempt arrives later through `events` (`Opened` or `Closed`).
pub trait TransportConnector: Send {
    fn open(
        &self,
        request: ConnectRequest,
        events: EventSink,
    ) -> Result<Box<dyn Transport>, TransportError>;
}
