//! Property-based invariant tests for the step store, cells, and sequencer.
//!
//! Verifies:
//!
//! 1. Every subscriber observes every `set`, in call order
//! 2. Re-entrant sets drain FIFO after the outer broadcast
//! 3. Subscribers always see `current()` equal to the step they receive
//! 4. Cell notifications happen exactly on value changes
//! 5. Signal subscribers never see sends that happened before they joined
//! 6. Sequencer fires callbacks in (deadline, schedule order)
//! 7. Sequencer never fires a callback before its deadline
//! 8. A sequence started from inside a broadcast plays every stage
//! 9. Clearing one sequencer scope leaves other scopes' callbacks intact

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use proptest::prelude::*;
use stepwise_runtime::{
    DeferredSequencer, LabClock, ObservableCell, PassableSignal, Sequence, StepLog, StepStore,
};

// ═════════════════════════════════════════════════════════════════════════
// 1. Ordering
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn all_subscribers_see_all_sets_in_order(
        steps in proptest::collection::vec(any::<u16>(), 0..=64),
        subscribers in 1usize..=5,
    ) {
        let store = StepStore::new(0u16);
        let logs: Vec<Rc<RefCell<Vec<u16>>>> =
            (0..subscribers).map(|_| Rc::new(RefCell::new(Vec::new()))).collect();
        let _subs: Vec<_> = logs
            .iter()
            .map(|log| {
                let log = Rc::clone(log);
                store.subscribe(move |s| log.borrow_mut().push(*s))
            })
            .collect();

        for step in &steps {
            store.set(*step);
        }

        for log in &logs {
            prop_assert_eq!(&*log.borrow(), &steps);
        }
        prop_assert_eq!(store.generation(), steps.len() as u64);
        if let Some(last) = steps.last() {
            prop_assert_eq!(store.current(), *last);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 2. Re-entrant FIFO
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn reentrant_sets_follow_fifo(
        fanout in proptest::collection::vec(0u8..=3, 1..=8),
    ) {
        // Step n (for n < fanout.len()) triggers `fanout[n]` follow-up sets
        // tagged with (n, k); tagged steps trigger nothing.
        #[derive(Debug, Clone, PartialEq)]
        enum Step {
            Root(usize),
            Child(usize, u8),
        }

        let store = StepStore::new(Step::Root(usize::MAX));
        let writer = store.clone();
        let fanout_for_sub = fanout.clone();
        let _driver = store.subscribe(move |step| {
            if let Step::Root(n) = step {
                if let Some(count) = fanout_for_sub.get(*n) {
                    for k in 0..*count {
                        writer.set(Step::Child(*n, k));
                    }
                    if *n + 1 < fanout_for_sub.len() {
                        writer.set(Step::Root(*n + 1));
                    }
                }
            }
        });

        let log = StepLog::attach(&store);

        store.set(Step::Root(0));

        let mut expected = Vec::new();
        for (n, count) in fanout.iter().enumerate() {
            expected.push(Step::Root(n));
            for k in 0..*count {
                expected.push(Step::Child(n, k));
            }
        }
        prop_assert_eq!(log.steps(), expected);
        prop_assert!(!store.is_broadcasting());
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Current matches the delivered step
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn subscribers_see_committed_step(
        follow_ups in proptest::collection::vec(proptest::collection::vec(any::<u8>(), 0..=3), 1..=8),
    ) {
        // Root step n re-enters with follow_ups[n] as tagged children.
        let store = StepStore::new((usize::MAX, 0u8));
        let writer = store.clone();
        let plan = follow_ups.clone();
        let _driver = store.subscribe(move |&(n, _)| {
            if let Some(children) = plan.get(n) {
                for child in children {
                    writer.set((usize::MAX - 1, *child));
                }
                if n + 1 < plan.len() {
                    writer.set((n + 1, 0));
                }
            }
        });

        let reader = store.clone();
        let last_generation = Rc::new(Cell::new(0u64));
        let mismatches = Rc::new(Cell::new(0u32));
        let (generation_sink, mismatch_sink) = (Rc::clone(&last_generation), Rc::clone(&mismatches));
        let _watch = store.subscribe(move |step| {
            let generation = reader.generation();
            if reader.current() != *step || generation != generation_sink.get() + 1 {
                mismatch_sink.set(mismatch_sink.get() + 1);
            }
            generation_sink.set(generation);
        });

        store.set((0, 0));
        let total: usize = follow_ups.len() + follow_ups.iter().map(Vec::len).sum::<usize>();
        prop_assert_eq!(mismatches.get(), 0);
        prop_assert_eq!(store.generation(), total as u64);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 4. Cell dedupe
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn cell_notifies_exactly_on_change(
        writes in proptest::collection::vec(0u8..4, 0..=64),
    ) {
        let cell = ObservableCell::new(0u8);
        let hits = Rc::new(Cell::new(0u64));
        let hits_clone = Rc::clone(&hits);
        let _sub = cell.subscribe(move |_| hits_clone.set(hits_clone.get() + 1));

        let mut expected = 0u64;
        let mut previous = 0u8;
        for value in &writes {
            if *value != previous {
                expected += 1;
                previous = *value;
            }
            cell.set(*value);
        }
        prop_assert_eq!(hits.get(), expected);
        prop_assert_eq!(cell.version(), expected);
        prop_assert_eq!(cell.get(), previous);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 5. Signal replay absence
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn late_signal_subscriber_sees_only_later_sends(
        before in proptest::collection::vec(any::<i32>(), 0..=16),
        after in proptest::collection::vec(any::<i32>(), 0..=16),
    ) {
        let signal = PassableSignal::new();
        for value in &before {
            signal.send(*value);
        }
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = signal.subscribe(move |v: &i32| seen_clone.borrow_mut().push(*v));
        for value in &after {
            signal.send(*value);
        }
        prop_assert_eq!(&*seen.borrow(), &after);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 6-7. Sequencer ordering and deadlines
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sequencer_orders_by_deadline_then_schedule(
        delays in proptest::collection::vec(0u64..=2_000, 1..=32),
        step_ms in 1u64..=250,
    ) {
        let clock = LabClock::new();
        let sequencer = DeferredSequencer::with_clock(clock.clone());
        let fired: Rc<RefCell<Vec<(usize, u64)>>> = Rc::new(RefCell::new(Vec::new()));

        for (index, delay) in delays.iter().enumerate() {
            let fired = Rc::clone(&fired);
            let clock = clock.clone();
            sequencer.after_ms(*delay, move || {
                fired.borrow_mut().push((index, clock.elapsed().as_millis() as u64));
            });
        }

        let horizon = delays.iter().copied().max().unwrap_or(0);
        while clock.elapsed().as_millis() as u64 <= horizon {
            sequencer.run_due();
            clock.advance_ms(step_ms);
        }
        sequencer.run_due();

        let fired = fired.borrow();
        prop_assert_eq!(fired.len(), delays.len());
        for (index, at) in fired.iter() {
            prop_assert!(*at >= delays[*index], "fired early: {} < {}", at, delays[*index]);
        }

        let mut expected: Vec<usize> = (0..delays.len()).collect();
        expected.sort_by_key(|i| (delays[*i], *i));
        // Firing order may coarsen by tick granularity, but never inverts
        // two callbacks whose deadlines are ordered.
        let order: Vec<usize> = fired.iter().map(|(i, _)| *i).collect();
        for window in order.windows(2) {
            let (a, b) = (window[0], window[1]);
            prop_assert!(
                (delays[a], a) < (delays[b], b),
                "out of order: {:?} then {:?}",
                (delays[a], a),
                (delays[b], b)
            );
        }
        prop_assert_eq!(order, expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 8. Sequences started mid-broadcast
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn sequence_started_in_subscriber_plays_every_stage(
        delays in proptest::collection::vec(1u64..=500, 1..=6),
        queued_ahead in 0usize..=3,
    ) {
        let clock = LabClock::new();
        let sequencer = DeferredSequencer::with_clock(clock.clone());
        let store = StepStore::new(0u32);
        let log = StepLog::attach(&store);

        let handle = store.clone();
        let inner_sequencer = sequencer.clone();
        let stage_delays = delays.clone();
        let _starter = store.subscribe(move |step| {
            if *step != 1 {
                return;
            }
            for k in 0..queued_ahead {
                handle.set(500 + k as u32);
            }
            let mut sequence = Sequence::starting_with(100);
            for (i, delay) in stage_delays.iter().enumerate() {
                sequence = sequence.then_ms(*delay, 101 + i as u32);
            }
            sequence.start(&inner_sequencer, &handle);
        });

        store.set(1);
        let total: u64 = delays.iter().sum();
        sequencer.advance(&clock, std::time::Duration::from_millis(total));

        let mut expected = vec![1];
        expected.extend((0..queued_ahead).map(|k| 500 + k as u32));
        expected.push(100);
        expected.extend((0..delays.len()).map(|i| 101 + i as u32));
        prop_assert_eq!(log.steps(), expected);
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 9. Scoped clearing
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn clearing_a_scope_spares_the_rest(
        plan in proptest::collection::vec((0usize..3, 1u64..=1_000), 1..=24),
        cleared in 0usize..3,
    ) {
        let clock = LabClock::new();
        let root = DeferredSequencer::with_clock(clock.clone());
        let scopes: Vec<_> = (0..3).map(|_| root.scoped()).collect();
        let fired = Rc::new(RefCell::new(Vec::new()));

        for (index, (scope, delay)) in plan.iter().enumerate() {
            let fired = Rc::clone(&fired);
            scopes[*scope].after_ms(*delay, move || fired.borrow_mut().push(index));
        }
        scopes[cleared].clear();
        prop_assert_eq!(scopes[cleared].pending_in_scope(), 0);

        root.advance(&clock, std::time::Duration::from_millis(1_000));
        let mut survivors: Vec<usize> = (0..plan.len()).filter(|i| plan[*i].0 != cleared).collect();
        survivors.sort_by_key(|i| (plan[*i].1, *i));
        prop_assert_eq!(&*fired.borrow(), &survivors);
    }
}
