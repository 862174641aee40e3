//! Scripted in-memory connector.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::domain::protocol::ClientMessage;
use crate::ports::{
    CloseReason, ConnectRequest, EventSink, Transport, TransportConnector, TransportError,
};

/// In-memory connector for tests and embedding.
///
/// Features:
/// - Records every connection attempt and every frame sent on it
/// - Lets the caller play the server: open, deliver frames, close
/// - Can refuse connection attempts outright
///
/// Clones share the same state, so a test keeps one clone and hands the
/// other to the client.
///
/// # Example
///
/// ```ignore
/// let connector = MemoryConnector::new();
/// let mut client = SubscriptionClient::new(config, connector.clone())?;
///
/// connector.accept(0);
/// connector.acknowledge(0);
/// client.process_pending()?;
///
/// assert_eq!(connector.sent_messages(0).len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryConnector {
    network: Arc<Mutex<Network>>,
}

#[derive(Debug, Default)]
struct Network {
    connections: Vec<Connection>,
    refusal: Option<String>,
}

#[derive(Debug)]
struct Connection {
    request: ConnectRequest,
    events: EventSink,
    sent: Vec<String>,
    closed_locally: bool,
}

impl MemoryConnector {
    /// Creates a connector with no connections.
    pub fn new() -> Self {
        Self::default()
    }

    // === Server side ===

    /// Reports connection `index` as open.
    pub fn accept(&self, index: usize) {
        self.with_events(index, |events| events.opened());
    }

    /// Delivers one inbound frame on connection `index`.
    pub fn deliver(&self, index: usize, frame: impl Into<String>) {
        let frame = frame.into();
        self.with_events(index, move |events| events.message(frame));
    }

    /// Delivers a `connection_ack` on connection `index`.
    pub fn acknowledge(&self, index: usize) {
        self.deliver(index, r#"{"type":"connection_ack"}"#);
    }

    /// Reports connection `index` as closed by the peer.
    pub fn hang_up(&self, index: usize) {
        self.with_events(index, |events| {
            events.closed(CloseReason::Remote {
                code: Some(1006),
                reason: "abnormal closure".to_string(),
            })
        });
    }

    /// Makes subsequent `open` calls fail with the given reason, or accept
    /// again with `None`.
    pub fn refuse_connections(&self, reason: Option<&str>) {
        self.lock().refusal = reason.map(str::to_string);
    }

    // === Assertions ===

    /// Number of connection attempts made so far.
    pub fn connection_count(&self) -> usize {
        self.lock().connections.len()
    }

    /// Request that created connection `index`.
    pub fn request(&self, index: usize) -> Option<ConnectRequest> {
        self.lock().connections.get(index).map(|c| c.request.clone())
    }

    /// Raw frames the client sent on connection `index`.
    pub fn sent_frames(&self, index: usize) -> Vec<String> {
        self.lock()
            .connections
            .get(index)
            .map(|c| c.sent.clone())
            .unwrap_or_default()
    }

    /// Frames the client sent on connection `index`, decoded. Frames that
    /// do not decode are skipped.
    pub fn sent_messages(&self, index: usize) -> Vec<ClientMessage> {
        self.sent_frames(index)
            .iter()
            .filter_map(|frame| serde_json::from_str(frame).ok())
            .collect()
    }

    /// True once the client closed connection `index` itself.
    pub fn is_closed_locally(&self, index: usize) -> bool {
        self.lock()
            .connections
            .get(index)
            .map(|c| c.closed_locally)
            .unwrap_or(false)
    }

    fn with_events(&self, index: usize, f: impl FnOnce(&EventSink)) {
        // Clone the sink so the lock is not held while the event is sent.
        let events = self.lock().connections.get(index).map(|c| c.events.clone());
        match events {
            Some(events) => f(&events),
            None => tracing::warn!(index, "No such in-memory connection"),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Network> {
        self.network.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TransportConnector for MemoryConnector {
    fn open(
        &self,
        request: ConnectRequest,
        events: EventSink,
    ) -> Result<Box<dyn Transport>, TransportError> {
        let mut network = self.lock();
        if let Some(reason) = &network.refusal {
            return Err(TransportError::Io(reason.clone()));
        }

        let index = network.connections.len();
        network.connections.push(Connection {
            request,
            events,
            sent: Vec::new(),
            closed_locally: false,
        });

        Ok(Box::new(MemoryTransport {
            network: self.network.clone(),
            index,
            closed: false,
        }))
    }
}

/// Client-side handle of one in-memory connection.
struct MemoryTransport {
    network: Arc<Mutex<Network>>,
    index: usize,
    closed: bool,
}

impl MemoryTransport {
    fn with_connection<R>(&self, f: impl FnOnce(&mut Connection) -> R) -> Option<R> {
        let mut network = self.network.lock().unwrap_or_else(PoisonError::into_inner);
        network.connections.get_mut(self.index).map(f)
    }
}

impl Transport for MemoryTransport {
    fn send(&mut self, frame: String) -> Result<(), TransportError> {
        if self.closed {
            return Err(TransportError::Closed);
        }
        self.with_connection(|c| c.sent.push(frame))
            .ok_or(TransportError::Closed)
    }

    fn close(&mut self) {
        self.closed = true;
        self.with_connection(|c| c.closed_locally = true);
    }
}
