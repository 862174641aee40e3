//! A registered subscription and its result callback.

use serde_json::Value;
use std::fmt;

use crate::domain::foundation::SubscriptionId;
use crate::domain::protocol::ClientMessage;

/// Callback receiving the payload of every `data` message for a subscription.
pub type DataCallback = Box<dyn FnMut(Value) + Send>;

/// A persistent query plus the callback its results are delivered to.
///
/// Survives reconnection: the client re-sends its `start` message rather
/// than re-creating it.
pub struct Subscription {
    id: SubscriptionId,
    query: String,
    variables: Value,
    callback: DataCallback,
}

impl Subscription {
    pub fn new(
        id: SubscriptionId,
        query: impl Into<String>,
        variables: Value,
        callback: DataCallback,
    ) -> Self {
        Self {
            id,
            query: query.into(),
            variables,
            callback,
        }
    }

    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn variables(&self) -> &Value {
        &self.variables
    }

    /// Builds the `start` message that (re-)establishes this subscription.
    pub fn start_message(&self) -> ClientMessage {
        ClientMessage::start(self.id, self.query.clone(), self.variables.clone())
    }

    /// Hands a result payload to the callback.
    pub fn deliver(&mut self, payload: Value) {
        (self.callback)(payload);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.id)
            .field("query", &self.query)
            .field("variables", &self.variables)
            .finish_non_exhaustive()
    }
}
