#![forbid(unsafe_code)]

//! Example screens for the Stepwise runtime and a scripted trace runner.
//!
//! Each screen under [`screens`] is one evaluator/translator pair:
//!
//! - [`screens::pager`]: paged reader with edge-disabled navigation.
//! - [`screens::intro`]: interlude, title and content on a timed sequence.
//! - [`screens::login`]: form validation and a delayed credential check.
//!
//! [`script::run_script`] drives any of them on a lab clock and records
//! every step, cell change and signal into a [`trace::TraceRecorder`].

pub mod cli;
pub mod content;
pub mod error;
pub mod screens;
pub mod script;
pub mod trace;

pub use cli::{run, run_from_env};
pub use error::{DemoError, Result};
