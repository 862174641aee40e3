//! FIFO buffer for messages that cannot be sent yet.

use std::collections::VecDeque;

use crate::domain::foundation::SubscriptionId;
use crate::domain::protocol::ClientMessage;

/// Messages waiting for an acknowledged connection, oldest first.
///
/// Draining preserves enqueue order: a `stop` must never overtake the
/// `start` it targets.
#[derive(Debug, Default)]
pub struct OutboundQueue {
    pending: VecDeque<ClientMessage>,
}

impl OutboundQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, message: ClientMessage) {
        self.pending.push_back(message);
    }

    /// Empties the queue, returning its messages oldest first.
    pub fn drain_in_order(&mut self) -> Vec<ClientMessage> {
        self.pending.drain(..).collect()
    }

    /// Withdraws every queued `start` for `id`. Returns true if one was found.
    pub fn remove_start(&mut self, id: SubscriptionId) -> bool {
        let before = self.pending.len();
        self.pending
            .retain(|m| !matches!(m, ClientMessage::Start { id: queued, .. } if *queued == id));
        self.pending.len() != before
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
