#![forbid(unsafe_code)]

//! Subscriber bookkeeping shared by cells, signals, and step stores.

use std::any::Any;
use std::rc::{Rc, Weak};

/// Strong callback handle, owned by a [`Subscription`].
type CallbackRc<T> = Rc<dyn Fn(&T)>;

/// Weak callback handle, held by the notifying side.
pub(crate) type CallbackWeak<T> = Weak<dyn Fn(&T)>;

/// RAII guard for a registered callback.
///
/// The notifying primitive only holds a weak reference to the callback;
/// this guard holds the strong one. Dropping the guard (or calling
/// [`cancel`](Subscription::cancel)) unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    guard: Option<Box<dyn Any>>,
}

impl Subscription {
    pub(crate) fn new(guard: Box<dyn Any>) -> Self {
        Self { guard: Some(guard) }
    }

    /// Unsubscribe explicitly. Equivalent to dropping the guard.
    pub fn cancel(mut self) {
        self.guard = None;
    }

    /// Whether this guard still keeps its callback alive.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.guard.is_some()
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Ordered list of weak subscriber callbacks.
pub(crate) struct SubscriberList<T: 'static> {
    entries: Vec<CallbackWeak<T>>,
}

impl<T: 'static> SubscriberList<T> {
    pub(crate) fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a callback at the end of the list.
    pub(crate) fn register(&mut self, callback: impl Fn(&T) + 'static) -> Subscription {
        let strong: CallbackRc<T> = Rc::new(callback);
        self.entries.push(Rc::downgrade(&strong));
        Subscription::new(Box::new(strong))
    }

    /// Prune dead entries and return the live ones in registration order.
    ///
    /// Callers invoke the returned handles after releasing their own borrow,
    /// upgrading each one immediately before the call so a subscription
    /// dropped mid-broadcast is skipped.
    pub(crate) fn snapshot(&mut self) -> Vec<CallbackWeak<T>> {
        self.entries.retain(|weak| weak.strong_count() > 0);
        self.entries.clone()
    }

    pub(crate) fn live_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }
}

/// Invoke each snapshotted callback that is still alive.
pub(crate) fn deliver<T: 'static>(callbacks: &[CallbackWeak<T>], value: &T) -> usize {
    let mut delivered = 0;
    for weak in callbacks {
        if let Some(callback) = weak.upgrade() {
            callback(value);
            delivered += 1;
        }
    }
    delivered
}
