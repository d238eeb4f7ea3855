//! A minimal screen written against the facade prelude only.

use std::time::Duration;

use stepwise::prelude::*;

#[derive(Debug, Clone, PartialEq)]
enum Step {
    Idle,
    Counting(u32),
    Done,
}

#[derive(Debug)]
enum Action {
    Start,
    Bump,
    Finish,
}

struct Counter {
    store: StepStore<Step>,
    sequencer: DeferredSequencer,
}

impl Evaluator for Counter {
    type Step = Step;
    type Action = Action;

    fn store(&self) -> &StepStore<Step> {
        &self.store
    }

    fn evaluate(&self, action: Action) -> Handled {
        match (self.store.current(), action) {
            (Step::Idle, Action::Start) => {
                Sequence::starting_with(Step::Counting(0))
                    .then(Duration::from_secs(1), Step::Done)
                    .start(&self.sequencer, &self.store);
                Handled::Applied
            }
            (Step::Counting(n), Action::Bump) => {
                self.store.set(Step::Counting(n + 1));
                Handled::Applied
            }
            (Step::Counting(_), Action::Finish) => {
                self.store.set(Step::Done);
                Handled::Applied
            }
            _ => Handled::Ignored,
        }
    }
}

#[derive(Default)]
struct CounterView {
    label: ObservableCell<String>,
    finished: PassableSignal<()>,
}

impl Translator for CounterView {
    type Step = Step;

    fn translate(&self, step: &Step) {
        match step {
            Step::Idle => self.label.set("ready".to_string()),
            Step::Counting(n) => self.label.set(n.to_string()),
            Step::Done => {
                self.label.set("done".to_string());
                self.finished.send(());
            }
        }
    }
}

fn screen(clock: &LabClock) -> Screen<Counter, CounterView> {
    let sequencer = DeferredSequencer::with_clock(clock.clone());
    Screen::new(
        Counter {
            store: StepStore::new(Step::Idle),
            sequencer: sequencer.clone(),
        },
        CounterView::default(),
        sequencer,
    )
}

#[test]
fn bumps_then_timer_is_superseded_by_bump() {
    let clock = LabClock::new();
    let screen = screen(&clock);
    assert_eq!(screen.translator().label.get(), "ready");

    screen.dispatch(Action::Start);
    screen.dispatch(Action::Bump);
    assert_eq!(screen.translator().label.get(), "1");

    // The bump moved the store on, so the scheduled `Done` is dropped.
    clock.advance_ms(1_000);
    screen.tick();
    assert_eq!(screen.current_step(), Step::Counting(1));
}

#[test]
fn timer_finishes_when_untouched() {
    let clock = LabClock::new();
    let screen = screen(&clock);
    let log = StepLog::attach(screen.evaluator().store());
    screen.dispatch(Action::Start);
    screen.sequencer().advance(&clock, Duration::from_secs(1));
    assert_eq!(log.steps(), [Step::Counting(0), Step::Done]);
    assert_eq!(screen.dispatch(Action::Finish), DispatchOutcome::Ignored);
}

#[cfg(feature = "demo")]
#[test]
fn demo_reexported() {
    use stepwise::demo::content::{ContentSource, StaticContent};

    let content = StaticContent::numbered(2);
    assert_eq!(content.pages().len(), 2);
}
