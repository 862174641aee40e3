//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, the connection lifecycle enum, and error types
//! that form the vocabulary of the subscription client.

mod connection_state;
mod errors;
mod ids;
mod state_machine;

pub use connection_state::ConnectionState;
pub use errors::{ProtocolError, TransitionError};
pub use ids::{ConnectionId, SubscriptionId};
pub use state_machine::StateMachine;
