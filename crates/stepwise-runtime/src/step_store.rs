#![forbid(unsafe_code)]

//! The step store: sole owner of a screen's current business state.
//!
//! A [`StepStore<S>`] holds exactly one value of a closed step union `S`.
//! [`set`](StepStore::set) commits a new step and broadcasts it to every
//! subscriber; the store is both a current-value cell and an edge-triggered
//! event source.
//!
//! # Invariants
//!
//! 1. `current()` always returns the last committed step.
//! 2. While a subscriber runs for step `s`, `current()` returns `s`.
//! 3. For one store, every subscriber observes steps in exactly the order
//!    `set` was called.
//! 4. A `set` issued while a broadcast is in flight (from inside a
//!    subscriber) is queued and committed after the outer broadcast
//!    finishes, in FIFO order. Broadcasts never nest.
//! 5. Unlike [`ObservableCell`](crate::reactive::ObservableCell), equal
//!    steps are not deduplicated: every `set` is an event.
//! 6. [`commit`](StepStore::commit) returns the generation a step holds once
//!    committed, even when the step is queued. No two steps share one.
//!
//! # Failure Modes
//!
//! - **Subscriber panics**: the in-flight flag is reset on unwind so later
//!   `set` calls broadcast normally; queued steps from the aborted
//!   broadcast are discarded and their generations are skipped.
//! - **Subscriber sets forever**: a subscriber that unconditionally sets on
//!   every step turns the drain into an endless loop. Screens avoid this by
//!   only setting from evaluators, never from translators.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::{Rc, Weak};

use crate::reactive::Subscription;
use crate::reactive::subscription::{SubscriberList, deliver};

struct StoreInner<S: 'static> {
    current: S,
    generation: u64,
    subscribers: SubscriberList<S>,
    broadcasting: bool,
    queued: VecDeque<S>,
}

/// Owner of exactly one current step.
///
/// Cloning a `StepStore` creates a new handle to the **same** store.
pub struct StepStore<S: 'static> {
    inner: Rc<RefCell<StoreInner<S>>>,
}

/// Non-owning handle to a [`StepStore`], used by deferred callbacks.
pub struct WeakStepStore<S: 'static> {
    inner: Weak<RefCell<StoreInner<S>>>,
}

impl<S: 'static> Clone for StepStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: 'static> Clone for WeakStepStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Weak::clone(&self.inner),
        }
    }
}

impl<S: std::fmt::Debug + 'static> std::fmt::Debug for StepStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("StepStore")
            .field("current", &inner.current)
            .field("generation", &inner.generation)
            .field("queued", &inner.queued.len())
            .finish()
    }
}

impl<S: 'static> std::fmt::Debug for WeakStepStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeakStepStore")
            .field("alive", &(self.inner.strong_count() > 0))
            .finish()
    }
}

/// Resets the in-flight flag even if a subscriber unwinds.
struct BroadcastGuard<'a, S: 'static> {
    inner: &'a RefCell<StoreInner<S>>,
}

impl<S: 'static> Drop for BroadcastGuard<'_, S> {
    fn drop(&mut self) {
        if let Ok(mut inner) = self.inner.try_borrow_mut() {
            inner.broadcasting = false;
            if std::thread::panicking() {
                let discarded = inner.queued.len() as u64;
                inner.generation += discarded;
                inner.queued.clear();
            }
        }
    }
}

impl<S: Clone + 'static> StepStore<S> {
    /// Create a store holding `initial`, at generation 0.
    #[must_use]
    pub fn new(initial: S) -> Self {
        Self {
            inner: Rc::new(RefCell::new(StoreInner {
                current: initial,
                generation: 0,
                subscribers: SubscriberList::new(),
                broadcasting: false,
                queued: VecDeque::new(),
            })),
        }
    }

    /// A clone of the current step.
    #[must_use]
    pub fn current(&self) -> S {
        self.inner.borrow().current.clone()
    }

    /// Access the current step by reference.
    ///
    /// # Panics
    ///
    /// Panics if the closure calls [`set`](Self::set) on this store.
    pub fn with_current<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.inner.borrow().current)
    }

    /// Number of steps committed since construction, plus any discarded by
    /// a panicking broadcast.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.borrow().generation
    }

    /// The generation the store reaches once every queued step commits.
    /// Equal to [`generation`](Self::generation) outside a broadcast.
    #[must_use]
    pub fn settled_generation(&self) -> u64 {
        let inner = self.inner.borrow();
        inner.generation + inner.queued.len() as u64
    }

    /// Whether a broadcast is in flight.
    #[must_use]
    pub fn is_broadcasting(&self) -> bool {
        self.inner.borrow().broadcasting
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner.borrow().subscribers.live_count()
    }

    /// Register a callback for every future step.
    pub fn subscribe(&self, callback: impl Fn(&S) + 'static) -> Subscription {
        self.inner.borrow_mut().subscribers.register(callback)
    }

    /// Non-owning handle for deferred callbacks.
    #[must_use]
    pub fn downgrade(&self) -> WeakStepStore<S> {
        WeakStepStore {
            inner: Rc::downgrade(&self.inner),
        }
    }

    /// Commit `step` and broadcast it.
    ///
    /// Called from inside a subscriber, the step is queued and committed
    /// once the in-flight broadcast completes.
    pub fn set(&self, step: S) {
        self.commit(step);
    }

    /// [`set`](Self::set), returning the generation `step` commits at.
    ///
    /// Callers that later need to know whether their step is still the
    /// current one compare this against [`generation`](Self::generation).
    pub fn commit(&self, step: S) -> u64 {
        let ticket = {
            let mut inner = self.inner.borrow_mut();
            if inner.broadcasting {
                inner.queued.push_back(step);
                let ticket = inner.generation + inner.queued.len() as u64;
                tracing::debug!(queued = inner.queued.len(), ticket, "re-entrant step set queued");
                return ticket;
            }
            inner.broadcasting = true;
            inner.generation + 1
        };
        let _guard = BroadcastGuard { inner: &self.inner };

        let mut next = Some(step);
        while let Some(step) = next {
            let callbacks = {
                let mut inner = self.inner.borrow_mut();
                inner.current = step.clone();
                inner.generation += 1;
                tracing::trace!(generation = inner.generation, "step committed");
                inner.subscribers.snapshot()
            };
            deliver(&callbacks, &step);
            next = self.inner.borrow_mut().queued.pop_front();
        }
        ticket
    }
}

impl<S: Clone + 'static> WeakStepStore<S> {
    /// Recover the store if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<StepStore<S>> {
        self.inner.upgrade().map(|inner| StepStore { inner })
    }

    /// Set `step` if the store is still alive. Returns whether it was.
    pub fn set(&self, step: S) -> bool {
        match self.upgrade() {
            Some(store) => {
                store.set(step);
                true
            }
            None => {
                tracing::debug!("step set on torn-down store ignored");
                false
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Step log
// ---------------------------------------------------------------------------

/// Records every step a store broadcasts, in order.
///
/// Useful for timed sequences and tests that must assert the exact series
/// of steps with no intermediate states.
pub struct StepLog<S: 'static> {
    steps: Rc<RefCell<Vec<S>>>,
    _subscription: Subscription,
}

impl<S: Clone + 'static> StepLog<S> {
    /// Start recording broadcasts from `store`. The current step is not
    /// recorded.
    #[must_use]
    pub fn attach(store: &StepStore<S>) -> Self {
        let steps = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&steps);
        let subscription = store.subscribe(move |step| sink.borrow_mut().push(step.clone()));
        Self {
            steps,
            _subscription: subscription,
        }
    }

    /// Steps recorded so far.
    #[must_use]
    pub fn steps(&self) -> Vec<S> {
        self.steps.borrow().clone()
    }

    /// Number of steps recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.borrow().len()
    }

    /// Whether nothing has been recorded yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.borrow().is_empty()
    }

    /// Drain and return the recorded steps.
    pub fn take(&self) -> Vec<S> {
        std::mem::take(&mut *self.steps.borrow_mut())
    }
}

impl<S: std::fmt::Debug + 'static> std::fmt::Debug for StepLog<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepLog")
            .field("steps", &self.steps.borrow())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
