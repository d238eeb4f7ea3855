#![forbid(unsafe_code)]

//! Deferred, single-context callback scheduling for timed transitions.
//!
//! [`DeferredSequencer`] is a cooperative timer queue. [`after`] schedules a
//! closure to run no earlier than a delay from now; the host loop calls
//! [`run_due`] on the same execution context that owns the screen, so
//! callbacks never race with dispatch or translation.
//!
//! [`Sequence`] builds the common "title, then interlude, then content"
//! chain against a [`StepStore`]: every stage is scheduled up front at its
//! cumulative offset.
//!
//! # Invariants
//!
//! 1. A callback never runs before its deadline.
//! 2. Callbacks run in deadline order; equal deadlines run in scheduling
//!    order.
//! 3. `run_due` also runs callbacks scheduled by earlier callbacks in the
//!    same pass when their deadlines have already passed.
//! 4. There is no per-callback cancellation. A callback that captured a
//!    [`WeakStepStore`] becomes a no-op once the store is gone, and
//!    [`clear`](DeferredSequencer::clear) drops everything pending in the
//!    handle's scope.
//! 5. Scopes share one queue and one clock. Clearing a scope never touches
//!    callbacks scheduled through another scope.
//! 6. A running [`Sequence`] is abandoned as soon as any other step lands on
//!    its store between two of its stages.
//!
//! [`after`]: DeferredSequencer::after
//! [`run_due`]: DeferredSequencer::run_due

use std::cell::{Cell, RefCell};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::rc::Rc;

use web_time::{Duration, Instant};

use crate::clock::{Clock, SystemClock};
use crate::step_store::{StepStore, WeakStepStore};

struct Scheduled {
    deadline: Instant,
    seq: u64,
    scope: u64,
    callback: Box<dyn FnOnce()>,
}

// Min-heap ordering on (deadline, seq); the callback does not participate.
impl PartialEq for Scheduled {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Scheduled {}

impl PartialOrd for Scheduled {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Scheduled {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

#[derive(Default)]
struct SequencerInner {
    queue: BinaryHeap<Scheduled>,
    next_seq: u64,
    next_scope: u64,
    fired: u64,
}

/// Cooperative timer queue. See the [module docs](self).
///
/// Cloning shares the queue, the clock, and the scope. Use
/// [`scoped`](Self::scoped) for a handle whose callbacks can be cleared
/// independently, one per screen.
#[derive(Clone)]
pub struct DeferredSequencer {
    inner: Rc<RefCell<SequencerInner>>,
    clock: Rc<dyn Clock>,
    scope: u64,
}

impl std::fmt::Debug for DeferredSequencer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("DeferredSequencer")
            .field("scope", &self.scope)
            .field("pending", &inner.queue.len())
            .field("fired", &inner.fired)
            .finish()
    }
}

impl Default for DeferredSequencer {
    fn default() -> Self {
        Self::new()
    }
}

impl DeferredSequencer {
    /// Create a sequencer on the wall clock.
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }

    /// Create a sequencer on an explicit clock (e.g. a
    /// [`LabClock`](crate::clock::LabClock)).
    #[must_use]
    pub fn with_clock(clock: impl Clock + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SequencerInner::default())),
            clock: Rc::new(clock),
            scope: 0,
        }
    }

    /// A handle on the same queue and clock with a fresh scope.
    #[must_use]
    pub fn scoped(&self) -> Self {
        let scope = {
            let mut inner = self.inner.borrow_mut();
            inner.next_scope += 1;
            inner.next_scope
        };
        Self {
            inner: Rc::clone(&self.inner),
            clock: Rc::clone(&self.clock),
            scope,
        }
    }

    /// This handle's scope id. Root handles are scope 0.
    #[must_use]
    pub fn scope(&self) -> u64 {
        self.scope
    }

    /// Current time on this sequencer's clock.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.clock.now()
    }

    /// Schedule `callback` to run no earlier than `delay` from now.
    pub fn after(&self, delay: Duration, callback: impl FnOnce() + 'static) {
        let deadline = self.clock.now() + delay;
        let mut inner = self.inner.borrow_mut();
        let seq = inner.next_seq;
        inner.next_seq += 1;
        inner.queue.push(Scheduled {
            deadline,
            seq,
            scope: self.scope,
            callback: Box::new(callback),
        });
        tracing::trace!(
            seq,
            scope = self.scope,
            delay_ms = delay.as_millis() as u64,
            pending = inner.queue.len(),
            "deferred callback scheduled"
        );
    }

    /// Schedule `callback` after `ms` milliseconds.
    pub fn after_ms(&self, ms: u64, callback: impl FnOnce() + 'static) {
        self.after(Duration::from_millis(ms), callback);
    }

    /// Run every callback whose deadline has passed. Returns how many ran.
    pub fn run_due(&self) -> usize {
        let mut ran = 0;
        loop {
            let now = self.clock.now();
            let due = {
                let mut inner = self.inner.borrow_mut();
                match inner.queue.peek() {
                    Some(next) if next.deadline <= now => {
                        inner.fired += 1;
                        inner.queue.pop()
                    }
                    _ => None,
                }
            };
            let Some(scheduled) = due else {
                break;
            };
            tracing::debug!(seq = scheduled.seq, "deferred callback fired");
            (scheduled.callback)();
            ran += 1;
        }
        ran
    }

    /// Advance `clock` by `by`, stopping at every intermediate deadline so
    /// callbacks scheduled along the way see the time they would in
    /// production. Returns how many callbacks ran.
    ///
    /// For hosts driving this sequencer with a [`LabClock`]; `clock` must be
    /// the clock the sequencer was built with.
    ///
    /// [`LabClock`]: crate::clock::LabClock
    pub fn advance(&self, clock: &crate::clock::LabClock, by: Duration) -> usize {
        let mut remaining = by;
        let mut ran = self.run_due();
        while let Some(until) = self.time_until_next() {
            if until > remaining {
                break;
            }
            clock.advance(until);
            remaining -= until;
            ran += self.run_due();
        }
        clock.advance(remaining);
        ran + self.run_due()
    }

    /// Deadline of the earliest pending callback.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner.borrow().queue.peek().map(|next| next.deadline)
    }

    /// How long the host may sleep before the next callback is due.
    #[must_use]
    pub fn time_until_next(&self) -> Option<Duration> {
        let deadline = self.next_deadline()?;
        Some(deadline.saturating_duration_since(self.clock.now()))
    }

    /// Number of pending callbacks across every scope.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().queue.len()
    }

    /// Number of pending callbacks scheduled through this handle's scope.
    #[must_use]
    pub fn pending_in_scope(&self) -> usize {
        let inner = self.inner.borrow();
        inner.queue.iter().filter(|s| s.scope == self.scope).count()
    }

    /// Total callbacks run so far.
    #[must_use]
    pub fn fired(&self) -> u64 {
        self.inner.borrow().fired
    }

    /// Drop every pending callback in this handle's scope without running
    /// it.
    pub fn clear(&self) {
        let dropped = {
            let mut inner = self.inner.borrow_mut();
            let (dropped, kept): (Vec<Scheduled>, Vec<Scheduled>) = std::mem::take(&mut inner.queue)
                .into_vec()
                .into_iter()
                .partition(|s| s.scope == self.scope);
            inner.queue = BinaryHeap::from(kept);
            dropped
        };
        if !dropped.is_empty() {
            tracing::debug!(
                scope = self.scope,
                dropped = dropped.len(),
                "deferred callbacks cleared"
            );
        }
    }
}

// ---------------------------------------------------------------------------
// Sequence
// ---------------------------------------------------------------------------

/// A chain of steps separated by fixed delays.
///
/// ```ignore
/// Sequence::starting_with(IntroStep::Interlude)
///     .then(Duration::from_millis(500), IntroStep::Title(title))
///     .then(Duration::from_millis(1000), IntroStep::Content(content))
///     .start(&sequencer, &store);
/// ```
#[derive(Debug, Clone)]
pub struct Sequence<S> {
    stages: Vec<(Duration, S)>,
}

impl<S> Default for Sequence<S> {
    fn default() -> Self {
        Self { stages: Vec::new() }
    }
}

impl<S: Clone + 'static> Sequence<S> {
    /// An empty sequence.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A sequence whose first stage is set synchronously on start.
    #[must_use]
    pub fn starting_with(step: S) -> Self {
        Self::new().then(Duration::ZERO, step)
    }

    /// Append a stage `delay` after the previous one.
    #[must_use]
    pub fn then(mut self, delay: Duration, step: S) -> Self {
        self.stages.push((delay, step));
        self
    }

    /// Append a stage `ms` milliseconds after the previous one.
    #[must_use]
    pub fn then_ms(self, ms: u64, step: S) -> Self {
        self.then(Duration::from_millis(ms), step)
    }

    /// Number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Whether the sequence has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Total time from start to the last stage.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.stages.iter().map(|(delay, _)| *delay).sum()
    }

    /// Run the sequence against `store`.
    ///
    /// Leading stages with zero cumulative offset are set immediately; the
    /// rest are scheduled on `sequencer` at their cumulative offsets, holding
    /// the store weakly. Returns the number of stages scheduled for later.
    ///
    /// Started from inside a store subscriber, the immediate stages queue
    /// behind the in-flight broadcast like any other `set`, and the sequence
    /// continues from the generation they commit at.
    pub fn start(self, sequencer: &DeferredSequencer, store: &StepStore<S>) -> usize {
        let mut offset = Duration::ZERO;
        let mut scheduled = 0;
        let expected = Rc::new(Cell::new(store.settled_generation()));

        for (delay, step) in self.stages {
            offset += delay;
            if offset.is_zero() {
                expected.set(store.commit(step));
                continue;
            }
            let stage = SequenceStage {
                store: store.downgrade(),
                expected: Rc::clone(&expected),
                step,
            };
            sequencer.after(offset, move || stage.fire());
            scheduled += 1;
        }
        scheduled
    }
}

struct SequenceStage<S: 'static> {
    store: WeakStepStore<S>,
    expected: Rc<Cell<u64>>,
    step: S,
}

impl<S: Clone + 'static> SequenceStage<S> {
    fn fire(self) {
        let Some(store) = self.store.upgrade() else {
            tracing::debug!("sequence stage skipped: store torn down");
            return;
        };
        if store.generation() != self.expected.get() {
            tracing::debug!(
                expected = self.expected.get(),
                actual = store.generation(),
                "sequence stage skipped: superseded"
            );
            return;
        }
        self.expected.set(store.commit(self.step));
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
