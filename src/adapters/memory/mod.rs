//! In-memory transport implementation for testing.
//!
//! Provides deterministic, fully scripted connections: nothing happens on a
//! connection until the test drives it with [`MemoryConnector::accept`],
//! [`MemoryConnector::deliver`] or [`MemoryConnector::hang_up`].

mod connector;

pub use connector::MemoryConnector;
