#![forbid(unsafe_code)]

//! JSONL trace of everything a screen shows.
//!
//! A [`TraceRecorder`] subscribes to a screen's store, cells and signals and
//! appends one [`TraceEvent`] per observed emission, stamped with lab-clock
//! time. The runner prints the result as JSON lines:
//!
//! ```text
//! {"seq":0,"at_ms":0,"kind":"step","name":"step","value":"loading"}
//! {"seq":1,"at_ms":0,"kind":"cell","name":"page_label","value":""}
//! ```
//!
//! # Invariants
//!
//! - `seq` is dense and strictly increasing in recording order.
//! - Cells are recorded through `observe`, so their value at attach time is
//!   the first event for each cell.
//! - Callbacks hold the recorder weakly; dropping the recorder stops
//!   recording without unsubscribing anything by hand.

use std::cell::RefCell;
use std::io::Write;
use std::rc::{Rc, Weak};

use serde::Serialize;
use serde_json::Value;
use stepwise_runtime::{
    LabClock, ObservableCell, PassableSignal, StepStore, Subscription, TransitionHint,
};

use crate::error::Result;

/// Category of a trace record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceKind {
    Dispatch,
    Step,
    Cell,
    Signal,
}

/// One observed emission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TraceEvent {
    pub seq: u64,
    pub at_ms: u64,
    pub kind: TraceKind,
    pub name: String,
    pub value: Value,
}

/// Something that can register its observable surface with a recorder.
pub trait Traceable {
    fn trace(&self, recorder: &TraceRecorder);
}

struct RecorderInner {
    clock: LabClock,
    events: RefCell<Vec<TraceEvent>>,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl RecorderInner {
    fn push(&self, kind: TraceKind, name: &str, value: Value) {
        let mut events = self.events.borrow_mut();
        let seq = events.len() as u64;
        events.push(TraceEvent {
            seq,
            at_ms: u64::try_from(self.clock.elapsed().as_millis()).unwrap_or(u64::MAX),
            kind,
            name: name.to_string(),
            value,
        });
    }
}

/// Collects [`TraceEvent`]s from a screen.
#[derive(Clone)]
pub struct TraceRecorder {
    inner: Rc<RecorderInner>,
}

impl std::fmt::Debug for TraceRecorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TraceRecorder")
            .field("events", &self.inner.events.borrow().len())
            .field("subscriptions", &self.inner.subscriptions.borrow().len())
            .finish()
    }
}

fn to_value<T: Serialize>(name: &str, value: &T) -> Value {
    match serde_json::to_value(value) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(name, %error, "trace value not serializable");
            Value::Null
        }
    }
}

impl TraceRecorder {
    /// A recorder stamping events with `clock`.
    #[must_use]
    pub fn new(clock: LabClock) -> Self {
        Self {
            inner: Rc::new(RecorderInner {
                clock,
                events: RefCell::new(Vec::new()),
                subscriptions: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Append an event directly.
    pub fn record(&self, kind: TraceKind, name: &str, value: Value) {
        self.inner.push(kind, name, value);
    }

    fn listen(&self, subscription: Subscription) {
        self.inner.subscriptions.borrow_mut().push(subscription);
    }

    fn weak(&self) -> Weak<RecorderInner> {
        Rc::downgrade(&self.inner)
    }

    /// Record every step the store broadcasts, labelled by `label`.
    pub fn store<S: Clone + 'static>(
        &self,
        store: &StepStore<S>,
        label: impl Fn(&S) -> &'static str + 'static,
    ) {
        let weak = self.weak();
        self.listen(store.subscribe(move |step| {
            if let Some(inner) = weak.upgrade() {
                inner.push(TraceKind::Step, "step", Value::from(label(step)));
            }
        }));
    }

    /// Record a cell's current value and every later change.
    pub fn cell<T>(&self, name: &'static str, cell: &ObservableCell<T>)
    where
        T: Serialize + Clone + PartialEq + 'static,
    {
        let weak = self.weak();
        self.listen(cell.observe(move |value| {
            if let Some(inner) = weak.upgrade() {
                inner.push(TraceKind::Cell, name, to_value(name, value));
            }
        }));
    }

    /// Record every send on a signal.
    pub fn signal<T: Serialize + 'static>(&self, name: &'static str, signal: &PassableSignal<T>) {
        self.signal_with(name, signal, move |value| to_value(name, value));
    }

    /// Record every transition hint.
    pub fn transitions(&self, signal: &PassableSignal<TransitionHint>) {
        self.signal_with("transition", signal, |hint| {
            serde_json::json!({
                "label": hint.label,
                "duration_ms": u64::try_from(hint.duration.as_millis()).unwrap_or(u64::MAX),
            })
        });
    }

    /// Record every send on a signal, converting payloads with `encode`.
    pub fn signal_with<T: 'static>(
        &self,
        name: &'static str,
        signal: &PassableSignal<T>,
        encode: impl Fn(&T) -> Value + 'static,
    ) {
        let weak = self.weak();
        self.listen(signal.subscribe(move |value| {
            if let Some(inner) = weak.upgrade() {
                inner.push(TraceKind::Signal, name, encode(value));
            }
        }));
    }

    /// Register everything `target` exposes.
    pub fn attach(&self, target: &impl Traceable) {
        target.trace(self);
    }

    /// Snapshot of the events recorded so far.
    #[must_use]
    pub fn events(&self) -> Vec<TraceEvent> {
        self.inner.events.borrow().clone()
    }

    /// Number of events recorded so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.events.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Write the recorded events as JSON lines.
    pub fn write_jsonl(&self, out: &mut impl Write) -> Result<()> {
        for event in self.inner.events.borrow().iter() {
            serde_json::to_writer(&mut *out, event)?;
            out.write_all(b"\n")?;
        }
        Ok(())
    }
}
