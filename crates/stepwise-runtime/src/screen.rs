#![forbid(unsafe_code)]

//! Per-screen ownership of the evaluator/translator pair.
//!
//! A [`Screen`] is what the presentation layer owns for a screen's
//! lifetime. It keeps the evaluator and translator alive, binds the
//! translator to the evaluator's store, and hands out a typed
//! [`ActionDispatcher`]. Dropping the screen tears the whole graph down:
//!
//! 1. the translator binding is unsubscribed,
//! 2. the pending callbacks in the screen's sequencer scope are cleared,
//!    leaving other screens on the same queue running,
//! 3. the evaluator and translator are released, so outstanding
//!    dispatchers report [`DispatchOutcome::Detached`] and weak store
//!    handles stop resolving.
//!
//! The evaluator never holds the screen or the presentation layer.

use std::rc::Rc;

use crate::dispatch::{ActionDispatcher, DispatchOutcome};
use crate::evaluator::Evaluator;
use crate::reactive::Subscription;
use crate::sequencer::DeferredSequencer;
use crate::translator::{Translator, bind_translator};

/// Owner of one screen's evaluator, translator, and sequencer.
pub struct Screen<E, T>
where
    E: Evaluator,
    T: Translator<Step = E::Step>,
{
    evaluator: Rc<E>,
    translator: Rc<T>,
    dispatcher: ActionDispatcher<E::Action>,
    sequencer: DeferredSequencer,
    binding: Option<Subscription>,
}

impl<E, T> Screen<E, T>
where
    E: Evaluator,
    T: Translator<Step = E::Step>,
{
    /// Assemble a screen.
    ///
    /// `sequencer` should be the handle (or a clone of it) the evaluator
    /// schedules on, so [`tick`](Self::tick) drives its timers. When several
    /// screens share one queue, give each its own
    /// [`scoped`](DeferredSequencer::scoped) handle: dropping the screen
    /// clears that scope only. The translator is bound immediately and
    /// reflects the current step.
    #[must_use]
    pub fn new(evaluator: E, translator: T, sequencer: DeferredSequencer) -> Self {
        let evaluator = Rc::new(evaluator);
        let translator = Rc::new(translator);
        let binding = bind_translator(evaluator.store(), &translator);
        let dispatcher = ActionDispatcher::new(&evaluator);
        tracing::debug!(
            evaluator = std::any::type_name::<E>(),
            "screen assembled"
        );
        Self {
            evaluator,
            translator,
            dispatcher,
            sequencer,
            binding: Some(binding),
        }
    }

    /// Dispatch one action to the evaluator.
    pub fn dispatch(&self, action: E::Action) -> DispatchOutcome {
        self.dispatcher.dispatch(action)
    }

    /// A dispatcher handle for presentation code. It does not keep the
    /// screen alive.
    #[must_use]
    pub fn dispatcher(&self) -> ActionDispatcher<E::Action> {
        self.dispatcher.clone()
    }

    /// Run every deferred callback that is due. Returns how many ran.
    pub fn tick(&self) -> usize {
        self.sequencer.run_due()
    }

    /// The current step.
    #[must_use]
    pub fn current_step(&self) -> E::Step {
        self.evaluator.store().current()
    }

    /// The evaluator.
    #[must_use]
    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// The translator, for observing its cells and signals.
    #[must_use]
    pub fn translator(&self) -> &T {
        &self.translator
    }

    /// The sequencer driving this screen's timed transitions.
    #[must_use]
    pub fn sequencer(&self) -> &DeferredSequencer {
        &self.sequencer
    }
}

impl<E, T> Drop for Screen<E, T>
where
    E: Evaluator,
    T: Translator<Step = E::Step>,
{
    fn drop(&mut self) {
        self.binding.take();
        self.sequencer.clear();
        tracing::debug!(
            evaluator = std::any::type_name::<E>(),
            "screen torn down"
        );
    }
}

impl<E, T> std::fmt::Debug for Screen<E, T>
where
    E: Evaluator,
    T: Translator<Step = E::Step>,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Screen")
            .field("evaluator", &std::any::type_name::<E>())
            .field("translator", &std::any::type_name::<T>())
            .field("generation", &self.evaluator.store().generation())
            .field("pending_timers", &self.sequencer.pending())
            .finish()
    }
}
