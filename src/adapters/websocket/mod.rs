//! WebSocket transport adapter built on `tokio-tungstenite`.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐  frames   ┌──────────────────────────────────┐
//! │  SubscriptionClient  │──────────▶│  WebSocketTransport (handle)     │
//! │                      │           │   unbounded mpsc → socket task   │
//! │                      │◀──────────│  socket task                     │
//! └──────────────────────┘  events   │   backoff → connect → pump loop  │
//!                                    └──────────────────────────────────┘
//! ```
//!
//! Each connection attempt gets its own task. The task owns the socket and
//! talks to the client only through the event channel, so the client never
//! blocks on the network.

mod connector;

pub use connector::{WebSocketConnector, WebSocketTransport};
