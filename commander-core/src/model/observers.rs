//! `observers.rs`
//!
//! Handle-based subscriber lists. Subscribers are owned boxes keyed by a
//! `SubscriptionId`; dropping a subscription is an explicit `unsubscribe`,
//! so no list ever holds a reference to a destroyed subscriber.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SubscriptionId(u64);

impl std::fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sub#{}", self.0)
    }
}

pub struct ObserverRegistry<T: ?Sized> {
    next_id: u64,
    observers: Vec<(SubscriptionId, Box<T>)>,
}

impl<T: ?Sized> ObserverRegistry<T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next_id: 1,
            observers: Vec::new(),
        }
    }

    pub fn subscribe(&mut self, observer: Box<T>) -> SubscriptionId {
        let id: SubscriptionId = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));

        id
    }

    /// Returns the removed observer. Unknown ids indicate a caller bug.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> Option<Box<T>> {
        let position: Option<usize> = self
            .observers
            .iter()
            .position(|(sub, _)| *sub == id);

        debug_assert!(position.is_some(), "unsubscribing unknown {id}");

        position.map(|idx: usize| self.observers.remove(idx).1)
    }

    /// Visit every observer in subscription order.
    pub fn notify(&mut self, mut f: impl FnMut(&mut T)) {
        for (_, observer) in &mut self.observers {
            f(observer.as_mut());
        }
    }

    /// Visit only `id`. Returns `false` if it is not subscribed.
    pub fn notify_one(&mut self, id: SubscriptionId, f: impl FnOnce(&mut T)) -> bool {
        match self.observers.iter_mut().find(|(sub, _)| *sub == id) {
            Some((_, observer)) => {
                f(observer.as_mut());
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl<T: ?Sized> Default for ObserverRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> std::fmt::Debug for ObserverRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("subscribers", &self.observers.len())
            .finish()
    }
}
