//! Subscription bookkeeping: the registry (with id allocation) and the
//! outbound queue of messages awaiting an acknowledged connection.

mod outbound_queue;
mod registry;
#[allow(clippy::module_inception)]
mod subscription;

pub use outbound_queue::OutboundQueue;
pub use registry::SubscriptionRegistry;
pub use subscription::{DataCallback, Subscription};
