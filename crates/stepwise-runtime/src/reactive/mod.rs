#![forbid(unsafe_code)]

//! Fine-grained observable values for screen display state.
//!
//! This module provides the change-propagation primitives a translator
//! writes into and a presentation layer reads from:
//!
//! - [`ObservableCell`]: A shared, version-tracked value with change
//!   notification via subscriber callbacks.
//! - [`PassableSignal`]: An edge-triggered channel with no stored value and
//!   no replay.
//! - [`Subscription`]: RAII guard that unsubscribes on drop.
//! - [`TransitionScope`]: RAII guard that defers cell notifications until
//!   the scope exits, grouping writes into one transition.
//!
//! # Architecture
//!
//! Every primitive uses `Rc<RefCell<..>>` for single-threaded shared
//! ownership. Subscribers are stored as `Weak` callbacks and cleaned up
//! lazily during notification. The strong side lives in the
//! [`Subscription`] returned to the caller.
//!
//! # Invariants
//!
//! 1. Subscribers are notified in registration order.
//! 2. Every subscriber registered before a write observes that write.
//! 3. Writing a value equal to the current value is a no-op (no version
//!    bump, no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    callback invocation, even mid-broadcast.
//! 5. A signal subscriber added after a send never observes that send.
//! 6. Within a [`TransitionScope`], cell values update immediately but
//!    notifications are deferred until the outermost scope exits.

pub mod cell;
pub mod signal;
pub mod subscription;
pub mod transition;

pub use cell::ObservableCell;
pub use signal::PassableSignal;
pub use subscription::Subscription;
pub use transition::{TransitionHint, TransitionScope};
