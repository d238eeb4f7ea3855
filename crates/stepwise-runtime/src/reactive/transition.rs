#![forbid(unsafe_code)]

//! Transition scopes: grouping cell writes so a renderer sees them together.
//!
//! A [`TransitionScope`] is a batch marker. While one is open on the current
//! thread, [`ObservableCell`](super::ObservableCell) writes update the stored
//! value immediately but defer subscriber notification. When the outermost
//! scope drops, each touched cell notifies once with its final value, in the
//! order the cells were first written.
//!
//! A scope may carry a [`TransitionHint`] (a label and a duration) that is
//! sent on a [`PassableSignal`] after the deferred notifications flush. The
//! hint is advisory: nothing in a cell's contract depends on it.
//!
//! # Invariants
//!
//! 1. Nested scopes flush only when the outermost scope exits.
//! 2. A cell written several times inside one transition notifies once.
//! 3. Hints are sent after every deferred cell notification, outermost
//!    scope first, then nested scopes in the order they were opened.
//! 4. With no open scope, writes notify synchronously.
//! 5. The open-scope state is per thread, not per screen. A cell write made
//!    while any scope is open on the thread, including one opened by an
//!    unrelated screen, is deferred and flushed with that scope, before its
//!    hint. Values are never lost or reordered; only hint attribution is
//!    shared.

use std::cell::RefCell;
use std::time::Duration;

use super::signal::PassableSignal;

type Deferred = Box<dyn FnOnce()>;

/// Advisory animation metadata for one transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionHint {
    /// Free-form label, e.g. `"page-forward"`.
    pub label: String,
    /// Suggested duration for the visual transition.
    pub duration: Duration,
}

impl TransitionHint {
    /// Create a hint with the given label and duration.
    #[must_use]
    pub fn new(label: impl Into<String>, duration: Duration) -> Self {
        Self {
            label: label.into(),
            duration,
        }
    }

    /// Create a hint for an instantaneous transition.
    #[must_use]
    pub fn instant(label: impl Into<String>) -> Self {
        Self::new(label, Duration::ZERO)
    }
}

#[derive(Default)]
struct TransitionState {
    depth: usize,
    deferred: Vec<Deferred>,
    hints: Vec<Deferred>,
}

thread_local! {
    static TRANSITION: RefCell<TransitionState> = RefCell::new(TransitionState::default());
}

/// Whether a transition scope is open on this thread.
pub(crate) fn is_open() -> bool {
    TRANSITION.with(|state| state.borrow().depth > 0)
}

/// Queue a notification to run when the outermost scope exits.
pub(crate) fn defer(notify: Deferred) {
    TRANSITION.with(|state| state.borrow_mut().deferred.push(notify));
}

/// RAII batch marker. See the [module docs](self).
#[must_use = "a TransitionScope flushes when dropped"]
pub struct TransitionScope {
    _not_send: std::marker::PhantomData<*const ()>,
}

impl TransitionScope {
    /// Open a transition with no hint.
    pub fn begin() -> Self {
        TRANSITION.with(|state| state.borrow_mut().depth += 1);
        Self {
            _not_send: std::marker::PhantomData,
        }
    }

    /// Open a transition that sends `hint` on `channel` once it flushes.
    pub fn with_hint(hint: TransitionHint, channel: &PassableSignal<TransitionHint>) -> Self {
        let scope = Self::begin();
        let channel = channel.clone();
        TRANSITION.with(|state| {
            state
                .borrow_mut()
                .hints
                .push(Box::new(move || {
                    channel.send(hint);
                }));
        });
        scope
    }

    /// Run `f` inside a transition and return its result.
    pub fn run<R>(f: impl FnOnce() -> R) -> R {
        let _scope = Self::begin();
        f()
    }

    /// Current nesting depth on this thread.
    #[must_use]
    pub fn depth() -> usize {
        TRANSITION.with(|state| state.borrow().depth)
    }
}

impl Drop for TransitionScope {
    fn drop(&mut self) {
        let flush = TRANSITION.with(|state| {
            let mut state = state.borrow_mut();
            state.depth = state.depth.saturating_sub(1);
            if state.depth == 0 {
                let deferred = std::mem::take(&mut state.deferred);
                let hints = std::mem::take(&mut state.hints);
                Some((deferred, hints))
            } else {
                None
            }
        });

        if let Some((deferred, hints)) = flush {
            tracing::trace!(
                notifications = deferred.len(),
                hints = hints.len(),
                "transition flushed"
            );
            for notify in deferred {
                notify();
            }
            for hint in hints {
                hint();
            }
        }
    }
}

impl std::fmt::Debug for TransitionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionScope")
            .field("depth", &Self::depth())
            .finish()
    }
}
