#![forbid(unsafe_code)]

//! Translators: pure mappings from steps to display state.
//!
//! A [`Translator`] owns a fixed set of
//! [`ObservableCell`](crate::reactive::ObservableCell)s and
//! [`PassableSignal`](crate::reactive::PassableSignal)s. Its
//! [`translate`](Translator::translate) method matches exhaustively on the
//! step union and hands each variant's configuration to a dedicated
//! `show_<variant>` method, which assigns **every** cell the translator owns.
//!
//! ```ignore
//! impl Translator for PagerTranslator {
//!     type Step = PagerStep;
//!
//!     fn translate(&self, step: &PagerStep) {
//!         match step {
//!             PagerStep::Loading => self.show_loading(),
//!             PagerStep::Page(config) => self.show_page(config),
//!         }
//!     }
//! }
//! ```
//!
//! No wildcard arm: adding a step variant without a branch is a compile
//! error, not a runtime fallback.
//!
//! # Invariants
//!
//! 1. Display state is a pure function of the current step: translating the
//!    same step twice leaves every cell with identical values.
//! 2. No cell keeps a stale value from an unrelated earlier step.
//! 3. Translation never fails and never sets the step store.

use std::rc::Rc;

use crate::reactive::Subscription;
use crate::step_store::StepStore;

/// Maps every variant of a step union to cell and signal writes.
pub trait Translator: 'static {
    /// The closed step union this translator understands.
    type Step: Clone + 'static;

    /// Write display state for `step`.
    fn translate(&self, step: &Self::Step);
}

/// Attach `translator` to `store`.
///
/// The current step is translated immediately, then every broadcast is
/// forwarded. The store holds the translator weakly: dropping the last
/// `Rc<T>` or the returned [`Subscription`] stops translation.
pub fn bind_translator<T: Translator>(
    store: &StepStore<T::Step>,
    translator: &Rc<T>,
) -> Subscription {
    store.with_current(|step| translator.translate(step));
    let weak = Rc::downgrade(translator);
    store.subscribe(move |step| {
        if let Some(translator) = weak.upgrade() {
            translator.translate(step);
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::ObservableCell;

    #[derive(Debug, Clone, PartialEq)]
    enum Step {
        Idle,
        Counting { value: u32, limit: u32 },
    }

    struct CounterTranslator {
        label: ObservableCell<String>,
        can_increment: ObservableCell<bool>,
    }

    impl CounterTranslator {
        fn new() -> Self {
            Self {
                label: ObservableCell::new(String::new()),
                can_increment: ObservableCell::new(false),
            }
        }

        fn show_idle(&self) {
            self.label.set("idle".into());
            self.can_increment.set(false);
        }

        fn show_counting(&self, value: u32, limit: u32) {
            self.label.set(format!("{value}/{limit}"));
            self.can_increment.set(value < limit);
        }
    }

    impl Translator for CounterTranslator {
        type Step = Step;

        fn translate(&self, step: &Step) {
            match step {
                Step::Idle => self.show_idle(),
                Step::Counting { value, limit } => self.show_counting(*value, *limit),
            }
        }
    }

    #[test]
    fn bind_translates_current_immediately() {
        let store = StepStore::new(Step::Counting { value: 1, limit: 2 });
        let translator = Rc::new(CounterTranslator::new());
        let _binding = bind_translator(&store, &translator);

        assert_eq!(translator.label.get(), "1/2");
        assert!(translator.can_increment.get());
    }

    #[test]
    fn follows_store() {
        let store = StepStore::new(Step::Idle);
        let translator = Rc::new(CounterTranslator::new());
        let _binding = bind_translator(&store, &translator);

        store.set(Step::Counting { value: 2, limit: 2 });
        assert_eq!(translator.label.get(), "2/2");
        assert!(!translator.can_increment.get());

        store.set(Step::Idle);
        assert_eq!(translator.label.get(), "idle");
        assert!(!translator.can_increment.get());
    }

    #[test]
    fn dropped_binding_stops_translation() {
        let store = StepStore::new(Step::Idle);
        let translator = Rc::new(CounterTranslator::new());
        let binding = bind_translator(&store, &translator);
        drop(binding);

        store.set(Step::Counting { value: 0, limit: 1 });
        assert_eq!(translator.label.get(), "idle");
    }

    #[test]
    fn dropped_translator_is_inert() {
        let store = StepStore::new(Step::Idle);
        let translator = Rc::new(CounterTranslator::new());
        let label = translator.label.clone();
        let _binding = bind_translator(&store, &translator);
        drop(translator);

        store.set(Step::Counting { value: 0, limit: 1 });
        assert_eq!(label.get(), "idle");
    }
}
