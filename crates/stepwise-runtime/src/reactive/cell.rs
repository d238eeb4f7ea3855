#![forbid(unsafe_code)]

//! Observable display cells.
//!
//! [`ObservableCell<T>`] holds one value and notifies subscribers when it
//! changes. Translators own cells and write them; presentation code reads
//! and observes them.
//!
//! # Invariants
//!
//! 1. `set` notifies every live subscriber synchronously, in registration
//!    order, before it returns (unless a transition scope is open, in which
//!    case notification happens when the outermost scope exits).
//! 2. Writing a value equal to the current one is suppressed: no version
//!    bump, no notification.
//! 3. `version()` increments exactly once per effective write.
//!
//! # Failure Modes
//!
//! - **Subscriber writes the same cell**: the nested write broadcasts
//!   synchronously from inside the outer broadcast. Subscribers that run
//!   after the nested write in the outer pass still receive the outer value.
//!   Translators avoid this by writing each cell once per step.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use super::subscription::{SubscriberList, Subscription, deliver};
use super::transition;

struct CellInner<T: 'static> {
    value: T,
    version: u64,
    subscribers: SubscriberList<T>,
    /// A notification for this cell is queued in the open transition.
    pending: bool,
}

/// A shared, version-tracked value with change notification.
///
/// Cloning an `ObservableCell` creates a new handle to the **same** value.
pub struct ObservableCell<T: 'static> {
    inner: Rc<RefCell<CellInner<T>>>,
}

impl<T: 'static> Clone for ObservableCell<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug + 'static> std::fmt::Debug for ObservableCell<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("ObservableCell")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .field("subscribers", &inner.subscribers.live_count())
            .finish()
    }
}

impl<T: Default + Clone + PartialEq + 'static> Default for ObservableCell<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + PartialEq + 'static> ObservableCell<T> {
    /// Create a cell holding `value` at version 0.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CellInner {
                value,
                version: 0,
                subscribers: SubscriberList::new(),
                pending: false,
            })),
        }
    }

    /// Read a clone of the current value.
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference.
    ///
    /// # Panics
    ///
    /// Panics if the closure writes to this same cell (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Number of effective writes so far.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.live_count()
    }

    /// Overwrite the value and notify subscribers.
    ///
    /// No-op when `value` equals the current value.
    pub fn set(&self, value: T) {
        {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value;
            inner.version += 1;
        }
        self.notify();
    }

    /// Overwrite the value and return the previous one.
    pub fn replace(&self, value: T) -> T {
        let previous = self.get();
        self.set(value);
        previous
    }

    /// Mutate a copy of the value in place and store it back.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let mut next = self.get();
        f(&mut next);
        self.set(next);
    }

    /// Register a callback for future changes.
    pub fn subscribe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        self.inner.borrow_mut().subscribers.register(callback)
    }

    /// Call `callback` with the current value now, then on every change.
    pub fn observe(&self, callback: impl Fn(&T) + 'static) -> Subscription {
        let current = self.get();
        callback(&current);
        self.subscribe(callback)
    }

    fn notify(&self) {
        if transition::is_open() {
            let already_pending = std::mem::replace(&mut self.inner.borrow_mut().pending, true);
            if !already_pending {
                let weak: Weak<RefCell<CellInner<T>>> = Rc::downgrade(&self.inner);
                transition::defer(Box::new(move || {
                    if let Some(inner) = weak.upgrade() {
                        inner.borrow_mut().pending = false;
                        ObservableCell { inner }.broadcast();
                    }
                }));
            }
            return;
        }
        self.broadcast();
    }

    fn broadcast(&self) {
        let (value, callbacks) = {
            let mut inner = self.inner.borrow_mut();
            (inner.value.clone(), inner.subscribers.snapshot())
        };
        deliver(&callbacks, &value);
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
