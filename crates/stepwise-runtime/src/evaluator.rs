#![forbid(unsafe_code)]

//! The evaluator contract: the one place business state changes.
//!
//! An [`Evaluator`] owns a [`StepStore`] and turns actions into new steps.
//! Its handler reads the current step, matches on `(step, action)`, and
//! either ignores the action (a guard, not an error) or builds a fresh
//! configuration and calls [`StepStore::set`].
//!
//! ```ignore
//! fn evaluate(&self, action: PagerAction) -> Handled {
//!     match (self.store.current(), action) {
//!         (PagerStep::Loading, PagerAction::ViewAppeared) => {
//!             self.store.set(PagerStep::Page(PageConfig::first(3)));
//!             Handled::Applied
//!         }
//!         _ => Handled::Ignored,
//!     }
//! }
//! ```
//!
//! # Invariants
//!
//! 1. The states are exactly the step variants; there is no hidden substate
//!    in evaluator fields.
//! 2. A configuration is never mutated in place; every change is a full
//!    `set` of a freshly built step.
//! 3. An ignored action leaves the store untouched.

use std::fmt;

use crate::step_store::StepStore;

/// Outcome of evaluating one action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handled {
    /// The action produced a new step.
    Applied,
    /// The action is not valid for the current step.
    Ignored,
}

impl Handled {
    /// Whether a new step was set.
    #[must_use]
    pub const fn is_applied(self) -> bool {
        matches!(self, Self::Applied)
    }
}

impl From<bool> for Handled {
    fn from(applied: bool) -> Self {
        if applied { Self::Applied } else { Self::Ignored }
    }
}

/// Business-logic owner of a screen.
pub trait Evaluator: 'static {
    /// Closed step union.
    type Step: Clone + 'static;
    /// Closed action union accepted from presentation.
    type Action: fmt::Debug + 'static;

    /// The store this evaluator writes.
    fn store(&self) -> &StepStore<Self::Step>;

    /// Apply `action` against the current step.
    fn evaluate(&self, action: Self::Action) -> Handled;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Step {
        Off,
        On { presses: u32 },
    }

    #[derive(Debug)]
    enum Action {
        Toggle,
        Press,
    }

    struct Switch {
        store: StepStore<Step>,
    }

    impl Evaluator for Switch {
        type Step = Step;
        type Action = Action;

        fn store(&self) -> &StepStore<Step> {
            &self.store
        }

        fn evaluate(&self, action: Action) -> Handled {
            match (self.store.current(), action) {
                (Step::Off, Action::Toggle) => {
                    self.store.set(Step::On { presses: 0 });
                    Handled::Applied
                }
                (Step::On { .. }, Action::Toggle) => {
                    self.store.set(Step::Off);
                    Handled::Applied
                }
                (Step::On { presses }, Action::Press) => {
                    self.store.set(Step::On {
                        presses: presses + 1,
                    });
                    Handled::Applied
                }
                (Step::Off, Action::Press) => Handled::Ignored,
            }
        }
    }

    #[test]
    fn guard_ignores_invalid_action() {
        let switch = Switch {
            store: StepStore::new(Step::Off),
        };
        assert_eq!(switch.evaluate(Action::Press), Handled::Ignored);
        assert_eq!(switch.store().generation(), 0);
    }

    #[test]
    fn transitions_replace_step() {
        let switch = Switch {
            store: StepStore::new(Step::Off),
        };
        assert!(switch.evaluate(Action::Toggle).is_applied());
        assert!(switch.evaluate(Action::Press).is_applied());
        assert_eq!(switch.store().current(), Step::On { presses: 1 });
    }

    #[test]
    fn handled_from_bool() {
        assert_eq!(Handled::from(true), Handled::Applied);
        assert_eq!(Handled::from(false), Handled::Ignored);
    }
}
