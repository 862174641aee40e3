//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the client core and the outside world. Adapters implement these ports.
//!
//! - `TransportConnector` - Opens transport handles for connection attempts
//! - `Transport` - A live duplex handle carrying text frames
//! - `EventSink` - Reports open/message/close events back to the client

mod transport;

pub use transport::{
    CloseReason, ConnectRequest, EventSink, Transport, TransportConnector, TransportError,
    TransportEvent, TransportEventKind, TransportEventReceiver, TransportEventSender,
};
