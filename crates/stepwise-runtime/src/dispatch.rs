#![forbid(unsafe_code)]

//! Typed action dispatch from presentation to an evaluator.
//!
//! [`ActionDispatcher<A>`] is parameterized by the screen's concrete action
//! union, so presentation code can only send actions the evaluator
//! understands. The dispatcher holds the evaluator weakly: once the screen
//! is torn down, dispatching is a no-op reported as
//! [`DispatchOutcome::Detached`].
//!
//! # Invariants
//!
//! 1. Actions reach the evaluator in the order they were dispatched.
//! 2. An action dispatched while another is being evaluated (for example
//!    from a translator-driven subscriber) is queued and evaluated after the
//!    current one returns. Evaluations never nest.
//! 3. The dispatcher never keeps the evaluator alive.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::evaluator::{Evaluator, Handled};

/// Object-safe view of an evaluator, erased down to its action type.
pub trait ActionHandler<A> {
    /// Evaluate one action.
    fn handle(&self, action: A) -> Handled;
}

impl<E: Evaluator> ActionHandler<E::Action> for E {
    fn handle(&self, action: E::Action) -> Handled {
        self.evaluate(action)
    }
}

/// Result of one [`ActionDispatcher::dispatch`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The evaluator set a new step.
    Applied,
    /// The evaluator rejected the action for the current step.
    Ignored,
    /// Another action is being evaluated; this one will run after it.
    Queued,
    /// The evaluator is gone.
    Detached,
}

impl DispatchOutcome {
    /// Whether the action produced a new step.
    #[must_use]
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

impl From<Handled> for DispatchOutcome {
    fn from(handled: Handled) -> Self {
        match handled {
            Handled::Applied => Self::Applied,
            Handled::Ignored => Self::Ignored,
        }
    }
}

struct DispatchQueue<A> {
    pending: VecDeque<A>,
    draining: bool,
}

/// Resets the draining flag even if an evaluator unwinds.
struct DrainGuard<'a, A> {
    queue: &'a RefCell<DispatchQueue<A>>,
}

impl<A> Drop for DrainGuard<'_, A> {
    fn drop(&mut self) {
        if let Ok(mut queue) = self.queue.try_borrow_mut() {
            queue.draining = false;
            if std::thread::panicking() {
                queue.pending.clear();
            }
        }
    }
}

/// Routes typed actions to one evaluator.
///
/// Cloning shares the target and the pending queue.
pub struct ActionDispatcher<A: 'static> {
    target: Weak<dyn ActionHandler<A>>,
    queue: Rc<RefCell<DispatchQueue<A>>>,
}

impl<A: 'static> Clone for ActionDispatcher<A> {
    fn clone(&self) -> Self {
        Self {
            target: Weak::clone(&self.target),
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<A: 'static> fmt::Debug for ActionDispatcher<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let queue = self.queue.borrow();
        f.debug_struct("ActionDispatcher")
            .field("attached", &(self.target.strong_count() > 0))
            .field("pending", &queue.pending.len())
            .field("draining", &queue.draining)
            .finish()
    }
}

impl<A: fmt::Debug + 'static> ActionDispatcher<A> {
    /// Create a dispatcher targeting `evaluator` without owning it.
    #[must_use]
    pub fn new<E>(evaluator: &Rc<E>) -> Self
    where
        E: Evaluator<Action = A>,
    {
        let weak: Weak<E> = Rc::downgrade(evaluator);
        let target: Weak<dyn ActionHandler<A>> = weak;
        Self {
            target,
            queue: Rc::new(RefCell::new(DispatchQueue {
                pending: VecDeque::new(),
                draining: false,
            })),
        }
    }

    /// Whether the target evaluator is still alive.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.target.strong_count() > 0
    }

    /// Number of actions waiting behind the one being evaluated.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().pending.len()
    }

    /// Send `action` to the evaluator.
    pub fn dispatch(&self, action: A) -> DispatchOutcome {
        if !self.is_attached() {
            tracing::debug!(?action, "dispatch after teardown ignored");
            return DispatchOutcome::Detached;
        }
        {
            let mut queue = self.queue.borrow_mut();
            if queue.draining {
                tracing::debug!(?action, "re-entrant dispatch queued");
                queue.pending.push_back(action);
                return DispatchOutcome::Queued;
            }
            queue.draining = true;
        }
        let _guard = DrainGuard { queue: &self.queue };

        let outcome = self.deliver(action);
        loop {
            let next = self.queue.borrow_mut().pending.pop_front();
            match next {
                Some(action) => {
                    self.deliver(action);
                }
                None => break,
            }
        }
        outcome
    }

    fn deliver(&self, action: A) -> DispatchOutcome {
        let Some(target) = self.target.upgrade() else {
            return DispatchOutcome::Detached;
        };
        tracing::trace!(?action, "dispatching action");
        let handled = target.handle(action);
        if handled == Handled::Ignored {
            tracing::debug!("action ignored for current step");
        }
        handled.into()
    }
}
