//! Domain layer containing the client's core types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, connection state, errors)
//! - `protocol` - Wire messages and their codec
//! - `subscription` - Subscription registry and outbound queue

pub mod foundation;
pub mod protocol;
pub mod subscription;
