//! Application layer - The subscription client and inbound dispatch.
//!
//! This layer drives the domain types through the transport port. Caller
//! operations mutate client state synchronously; transport events are
//! applied when the caller pumps the event loop.

mod client;
pub mod dispatcher;
mod error;

pub use client::SubscriptionClient;
pub use dispatcher::{dispatch, Dispatch};
pub use error::ClientError;
