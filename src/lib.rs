//! gql-subscriber - Client-side GraphQL subscription manager
//!
//! Multiplexes many GraphQL subscriptions over one WebSocket speaking the
//! legacy `graphql-ws` subprotocol. Subscriptions survive reconnects: when
//! the socket drops, every registered subscription is started again on the
//! next connection.
//!
//! # Layout
//!
//! - `domain` - Ids, wire messages, subscription registry, outbound queue
//! - `ports` - The transport boundary
//! - `adapters` - WebSocket and in-memory transports
//! - `application` - [`application::SubscriptionClient`] and the dispatcher
//! - `config` - Environment-driven configuration

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
