//! Registry of active subscriptions.
//!
//! Also the id allocator: ids are derived from what is currently
//! registered, so they are unique among live subscriptions but a freed id
//! may be handed out again later.

use crate::domain::foundation::SubscriptionId;

use super::Subscription;

/// Active subscriptions in registration order.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    entries: Vec<Subscription>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// One greater than the highest registered id, or 1 when empty.
    pub fn next_id(&self) -> SubscriptionId {
        self.entries
            .iter()
            .map(Subscription::id)
            .max()
            .map(|id| id.next())
            .unwrap_or(SubscriptionId::FIRST)
    }

    /// Inserts a subscription. Ids come from [`Self::next_id`].
    pub fn add(&mut self, subscription: Subscription) {
        debug_assert!(!self.contains(subscription.id()), "duplicate subscription id");
        self.entries.push(subscription);
    }

    /// Removes and returns the subscription with `id`.
    ///
    /// An absent id leaves every other entry untouched.
    pub fn remove(&mut self, id: SubscriptionId) -> Option<Subscription> {
        let index = self.entries.iter().position(|s| s.id() == id)?;
        Some(self.entries.remove(index))
    }

    pub fn find(&mut self, id: SubscriptionId) -> Option<&mut Subscription> {
        self.entries.iter_mut().find(|s| s.id() == id)
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.entries.iter().any(|s| s.id() == id)
    }

    /// All subscriptions in the order they were registered.
    pub fn all(&self) -> impl Iterator<Item = &Subscription> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<SubscriptionId> {
        self.entries.iter().map(Subscription::id).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
