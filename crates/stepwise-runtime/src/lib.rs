#![forbid(unsafe_code)]

//! Stepwise runtime: state ownership and propagation for step-driven screens.
//!
//! Every screen follows one pattern. An [`Evaluator`] owns a [`StepStore`]
//! holding exactly one step of a closed union; a [`Translator`] derives
//! fine-grained [`ObservableCell`]s and [`PassableSignal`]s from each step;
//! presentation code renders those values and reports intent back through
//! an [`ActionDispatcher`]. Timed transitions run on a
//! [`DeferredSequencer`].
//!
//! ```text
//! presentation ──dispatch──▶ ActionDispatcher ──▶ Evaluator
//!      ▲                                              │ set(step)
//!      │ observe                                      ▼
//! ObservableCell / PassableSignal ◀── Translator ◀── StepStore
//! ```
//!
//! Everything here is single-threaded and `!Send`; all callbacks run on the
//! caller's execution context.

pub mod clock;
pub mod dispatch;
pub mod evaluator;
pub mod reactive;
pub mod screen;
pub mod sequencer;
pub mod step_store;
pub mod translator;

pub use clock::{Clock, LabClock, SystemClock};
pub use dispatch::{ActionDispatcher, ActionHandler, DispatchOutcome};
pub use evaluator::{Evaluator, Handled};
pub use reactive::{ObservableCell, PassableSignal, Subscription, TransitionHint, TransitionScope};
pub use screen::Screen;
pub use sequencer::{DeferredSequencer, Sequence};
pub use step_store::{StepLog, StepStore, WeakStepStore};
pub use translator::{Translator, bind_translator};
