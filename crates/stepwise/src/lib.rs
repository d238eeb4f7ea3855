#![forbid(unsafe_code)]

//! Stepwise public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users. Screen
//! authors usually only need the prelude:
//!
//! ```
//! use stepwise::prelude::*;
//!
//! let store = StepStore::new(0u8);
//! let cell = ObservableCell::new(String::new());
//! let sink = cell.clone();
//! let _binding = store.subscribe(move |step| sink.set(format!("step {step}")));
//! store.set(1);
//! assert_eq!(cell.get(), "step 1");
//! ```

pub use stepwise_runtime as runtime;

#[cfg(feature = "demo")]
pub use stepwise_demo as demo;

pub mod prelude {
    pub use stepwise_runtime::{
        ActionDispatcher, Clock, DeferredSequencer, DispatchOutcome, Evaluator, Handled,
        LabClock, ObservableCell, PassableSignal, Screen, Sequence, StepLog, StepStore,
        Subscription, SystemClock, TransitionHint, TransitionScope, Translator, WeakStepStore,
        bind_translator,
    };

    pub use stepwise_runtime as runtime;
}
