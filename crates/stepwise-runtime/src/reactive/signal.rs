#![forbid(unsafe_code)]

//! Edge-triggered, replay-free event channels.
//!
//! A [`PassableSignal<T>`] has no current value. `send` hands the value to
//! whoever is subscribed at that moment and then discards it. It is the
//! channel for imperative presentation effects that may or may not have a
//! listener, such as flashing a transient bezel.

use std::cell::RefCell;
use std::rc::Rc;

use super::subscription::{SubscriberList, Subscription, deliver};

struct SignalInner<T: 'static> {
    subscribers: SubscriberList<T>,
    sent: u64,
}

/// A replay-free broadcast channel.
///
/// Cloning a `PassableSignal` creates a new handle to the **same** channel.
pub struct PassableSignal<T: 'static> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T: 'static> Clone for PassableSignal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for PassableSignal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> std::fmt::Debug for PassableSignal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("PassableSignal")
            .field("subscribers", &inner.subscribers.live_count())
            .field("sent", &inner.sent)
            .finish()
    }
}

impl<T: 'static> PassableSignal<T> {
    /// Create a channel with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                subscribers: SubscriberList::new(),
                sent: 0,
            })),
        }
    }

    /// Deliver `value` to every current subscriber, then drop it.
    ///
    /// With no subscribers this is a no-op. Returns the number of callbacks
    /// that received the value.
    pub fn send(&self, value: T) -> usize {
        let callbacks = {
            let mut inner = self.inner.borrow_mut();
            inner.sent += 1;
            inner.subscribers.snapshot()
        };
        deliver(&callbacks, &value)
    }

    /// Register a callback for future sends only.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.borrow_mut().subscribers.register(callback)
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.live_count()
    }

    /// Total number of sends, including sends nobody heard.
    #[must_use]
    pub fn sent_count(&self) -> u64 {
        self.inner.borrow().sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn send_without_subscribers_is_noop() {
        let signal = PassableSignal::<String>::new();
        assert_eq!(signal.send("bezel".into()), 0);
        assert_eq!(signal.sent_count(), 1);
    }

    #[test]
    fn no_replay_for_late_subscriber() {
        let signal = PassableSignal::new();
        signal.send(1);

        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = signal.subscribe(move |v: &i32| seen_clone.borrow_mut().push(*v));
        assert!(seen.borrow().is_empty());

        signal.send(2);
        assert_eq!(*seen.borrow(), vec![2]);
    }

    #[test]
    fn unit_signal() {
        let signal = PassableSignal::<()>::new();
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        let _sub = signal.subscribe(move |_| hits_clone.set(hits_clone.get() + 1));

        signal.send(());
        signal.send(());
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn equal_values_are_all_delivered() {
        let signal = PassableSignal::new();
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        let _sub = signal.subscribe(move |_: &u8| hits_clone.set(hits_clone.get() + 1));

        signal.send(7);
        signal.send(7);
        assert_eq!(hits.get(), 2);
    }

    #[test]
    fn dropped_subscriber_not_called() {
        let signal = PassableSignal::new();
        let hits = Rc::new(Cell::new(0));
        let hits_clone = Rc::clone(&hits);
        let sub = signal.subscribe(move |_: &u8| hits_clone.set(hits_clone.get() + 1));
        drop(sub);

        assert_eq!(signal.send(1), 0);
        assert_eq!(hits.get(), 0);
        assert_eq!(signal.subscriber_count(), 0);
    }
}
