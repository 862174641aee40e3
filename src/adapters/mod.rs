//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the client to external systems:
//! - `websocket` - tokio-tungstenite transport for real servers
//! - `memory` - Scripted transport for tests

pub mod memory;
pub mod websocket;

pub use memory::MemoryConnector;
pub use websocket::{WebSocketConnector, WebSocketTransport};
