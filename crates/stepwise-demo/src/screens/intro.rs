#![forbid(unsafe_code)]

//! Timed intro: interlude, then title, then content.
//!
//! When the view appears the evaluator starts a [`Sequence`]: `Interlude`
//! immediately, `Title` after [`IntroTimings::interlude`], `Content` after a
//! further [`IntroTimings::title`]. `Skip` jumps straight to `Content` and
//! abandons the rest of the sequence; `Replay` restarts it from `Content`.

use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use stepwise_runtime::{
    DeferredSequencer, Evaluator, Handled, ObservableCell, PassableSignal, Screen, Sequence,
    StepStore, TransitionHint, TransitionScope, Translator,
};

use crate::content::{ContentSource, IntroCopy};
use crate::trace::{TraceRecorder, Traceable};

/// Delays between intro stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntroTimings {
    /// From `Interlude` to `Title`.
    pub interlude: Duration,
    /// From `Title` to `Content`.
    pub title: Duration,
}

impl Default for IntroTimings {
    fn default() -> Self {
        Self {
            interlude: Duration::from_millis(500),
            title: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleConfig {
    pub title: String,
    pub subtitle: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentConfig {
    pub title: String,
    pub body: String,
    /// Whether the reader got here by skipping.
    pub skipped: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntroStep {
    Initial,
    Interlude,
    Title(TitleConfig),
    Content(ContentConfig),
}

impl IntroStep {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Initial => "initial",
            Self::Interlude => "interlude",
            Self::Title(_) => "title",
            Self::Content(_) => "content",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntroAction {
    ViewAppeared,
    Skip,
    Replay,
}

impl IntroAction {
    /// Parse a script token: `appear`, `skip` or `replay`.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "appear" => Some(Self::ViewAppeared),
            "skip" => Some(Self::Skip),
            "replay" => Some(Self::Replay),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

pub struct IntroEvaluator {
    store: StepStore<IntroStep>,
    sequencer: DeferredSequencer,
    copy: IntroCopy,
    timings: IntroTimings,
}

impl IntroEvaluator {
    #[must_use]
    pub fn new(
        content: &dyn ContentSource,
        sequencer: DeferredSequencer,
        timings: IntroTimings,
    ) -> Self {
        Self {
            store: StepStore::new(IntroStep::Initial),
            sequencer,
            copy: content.intro(),
            timings,
        }
    }

    fn title(&self) -> IntroStep {
        IntroStep::Title(TitleConfig {
            title: self.copy.title.clone(),
            subtitle: self.copy.subtitle.clone(),
        })
    }

    fn content(&self, skipped: bool) -> IntroStep {
        IntroStep::Content(ContentConfig {
            title: self.copy.title.clone(),
            body: self.copy.body.clone(),
            skipped,
        })
    }

    fn play(&self) {
        Sequence::starting_with(IntroStep::Interlude)
            .then(self.timings.interlude, self.title())
            .then(self.timings.title, self.content(false))
            .start(&self.sequencer, &self.store);
    }
}

impl Evaluator for IntroEvaluator {
    type Step = IntroStep;
    type Action = IntroAction;

    fn store(&self) -> &StepStore<IntroStep> {
        &self.store
    }

    fn evaluate(&self, action: IntroAction) -> Handled {
        match (self.store.current(), action) {
            (IntroStep::Initial, IntroAction::ViewAppeared)
            | (IntroStep::Content(_), IntroAction::Replay) => {
                self.play();
                Handled::Applied
            }
            (IntroStep::Interlude | IntroStep::Title(_), IntroAction::Skip) => {
                self.store.set(self.content(true));
                Handled::Applied
            }
            (_, IntroAction::ViewAppeared | IntroAction::Skip | IntroAction::Replay) => {
                Handled::Ignored
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Translator
// ---------------------------------------------------------------------------

/// Everything the intro view draws.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntroDisplay {
    pub headline: String,
    pub subheadline: String,
    pub body: String,
    pub dimmed: bool,
    pub skip_visible: bool,
    pub replay_visible: bool,
}

#[derive(Debug, Default)]
pub struct IntroTranslator {
    pub headline: ObservableCell<String>,
    pub subheadline: ObservableCell<String>,
    pub body: ObservableCell<String>,
    pub dimmed: ObservableCell<bool>,
    pub skip_visible: ObservableCell<bool>,
    pub replay_visible: ObservableCell<bool>,
    pub transitions: PassableSignal<TransitionHint>,
}

impl IntroTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn display(&self) -> IntroDisplay {
        IntroDisplay {
            headline: self.headline.get(),
            subheadline: self.subheadline.get(),
            body: self.body.get(),
            dimmed: self.dimmed.get(),
            skip_visible: self.skip_visible.get(),
            replay_visible: self.replay_visible.get(),
        }
    }

    fn assign(&self, hint: TransitionHint, display: IntroDisplay) {
        let _scope = TransitionScope::with_hint(hint, &self.transitions);
        self.headline.set(display.headline);
        self.subheadline.set(display.subheadline);
        self.body.set(display.body);
        self.dimmed.set(display.dimmed);
        self.skip_visible.set(display.skip_visible);
        self.replay_visible.set(display.replay_visible);
    }

    fn show_initial(&self) {
        self.assign(
            TransitionHint::instant("initial"),
            IntroDisplay {
                headline: String::new(),
                subheadline: String::new(),
                body: String::new(),
                dimmed: false,
                skip_visible: false,
                replay_visible: false,
            },
        );
    }

    fn show_interlude(&self) {
        self.assign(
            TransitionHint::new("fade-in", Duration::from_millis(300)),
            IntroDisplay {
                headline: String::new(),
                subheadline: String::new(),
                body: String::new(),
                dimmed: true,
                skip_visible: true,
                replay_visible: false,
            },
        );
    }

    fn show_title(&self, config: &TitleConfig) {
        self.assign(
            TransitionHint::new("title-rise", Duration::from_millis(400)),
            IntroDisplay {
                headline: config.title.clone(),
                subheadline: config.subtitle.clone(),
                body: String::new(),
                dimmed: true,
                skip_visible: true,
                replay_visible: false,
            },
        );
    }

    fn show_content(&self, config: &ContentConfig) {
        let hint = if config.skipped {
            TransitionHint::instant("content")
        } else {
            TransitionHint::new("content-reveal", Duration::from_millis(400))
        };
        self.assign(
            hint,
            IntroDisplay {
                headline: config.title.clone(),
                subheadline: String::new(),
                body: config.body.clone(),
                dimmed: false,
                skip_visible: false,
                replay_visible: true,
            },
        );
    }
}

impl Translator for IntroTranslator {
    type Step = IntroStep;

    fn translate(&self, step: &IntroStep) {
        match step {
            IntroStep::Initial => self.show_initial(),
            IntroStep::Interlude => self.show_interlude(),
            IntroStep::Title(config) => self.show_title(config),
            IntroStep::Content(config) => self.show_content(config),
        }
    }
}

impl Traceable for IntroTranslator {
    fn trace(&self, recorder: &TraceRecorder) {
        recorder.cell("headline", &self.headline);
        recorder.cell("subheadline", &self.subheadline);
        recorder.cell("body", &self.body);
        recorder.cell("dimmed", &self.dimmed);
        recorder.cell("skip_visible", &self.skip_visible);
        recorder.cell("replay_visible", &self.replay_visible);
        recorder.transitions(&self.transitions);
    }
}

pub type IntroScreen = Screen<IntroEvaluator, IntroTranslator>;

/// Assemble an intro screen scheduling on its own scope of `sequencer`.
#[must_use]
pub fn intro_screen(
    content: Rc<dyn ContentSource>,
    sequencer: DeferredSequencer,
    timings: IntroTimings,
) -> IntroScreen {
    let sequencer = sequencer.scoped();
    Screen::new(
        IntroEvaluator::new(content.as_ref(), sequencer.clone(), timings),
        IntroTranslator::new(),
        sequencer,
    )
}
