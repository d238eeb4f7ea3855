#![forbid(unsafe_code)]

//! Paged reader.
//!
//! Steps: `Loading` until the view appears, then either `Empty` (no content)
//! or `Page` at some index. `Advance`/`Retreat` move one page and are ignored
//! at the edges; `JumpTo` moves anywhere in range.

use std::rc::Rc;
use std::time::Duration;

use serde::Serialize;
use stepwise_runtime::{
    DeferredSequencer, Evaluator, Handled, ObservableCell, PassableSignal, Screen, StepStore,
    TransitionHint, TransitionScope, Translator,
};

use crate::content::{ContentSource, Page};
use crate::trace::{TraceRecorder, Traceable};

const PAGE_TURN: Duration = Duration::from_millis(250);

/// How the reader arrived at the current page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PageMove {
    Forward,
    Back,
    Jump,
}

impl PageMove {
    fn hint_label(self) -> &'static str {
        match self {
            Self::Forward => "page-forward",
            Self::Back => "page-back",
            Self::Jump => "page-jump",
        }
    }
}

/// Configuration of the `Page` step.
#[derive(Debug, Clone, PartialEq)]
pub struct PageConfig {
    pages: Rc<[Page]>,
    index: usize,
    arrived_by: Option<PageMove>,
}

impl PageConfig {
    fn first(pages: Rc<[Page]>) -> Option<Self> {
        if pages.is_empty() {
            return None;
        }
        Some(Self {
            pages,
            index: 0,
            arrived_by: None,
        })
    }

    fn moved(&self, index: usize, how: PageMove) -> Self {
        Self {
            pages: Rc::clone(&self.pages),
            index,
            arrived_by: Some(how),
        }
    }

    /// Zero-based page index.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.pages.len()
    }

    #[must_use]
    pub fn page(&self) -> &Page {
        &self.pages[self.index]
    }

    #[must_use]
    pub fn arrived_by(&self) -> Option<PageMove> {
        self.arrived_by
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.index > 0
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.index + 1 < self.total()
    }

    /// "2 / 3" style position label.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{} / {}", self.index + 1, self.total())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PagerStep {
    Loading,
    Empty,
    Page(PageConfig),
}

impl PagerStep {
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Empty => "empty",
            Self::Page(_) => "page",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PagerAction {
    ViewAppeared,
    Advance,
    Retreat,
    JumpTo(usize),
}

impl PagerAction {
    /// Parse a script token: `appear`, `next`, `prev`, or `jump:<page>` with
    /// a one-based page number.
    #[must_use]
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "appear" => Some(Self::ViewAppeared),
            "next" => Some(Self::Advance),
            "prev" => Some(Self::Retreat),
            _ => {
                let page: usize = token.strip_prefix("jump:")?.parse().ok()?;
                page.checked_sub(1).map(Self::JumpTo)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Evaluator
// ---------------------------------------------------------------------------

pub struct PagerEvaluator {
    store: StepStore<PagerStep>,
    content: Rc<dyn ContentSource>,
}

impl PagerEvaluator {
    #[must_use]
    pub fn new(content: Rc<dyn ContentSource>) -> Self {
        Self {
            store: StepStore::new(PagerStep::Loading),
            content,
        }
    }

    fn next_step(&self, step: &PagerStep, action: PagerAction) -> Option<PagerStep> {
        match (step, action) {
            (PagerStep::Loading, PagerAction::ViewAppeared) => Some(
                PageConfig::first(self.content.pages()).map_or(PagerStep::Empty, PagerStep::Page),
            ),
            (PagerStep::Page(config), PagerAction::Advance) if config.has_next() => Some(
                PagerStep::Page(config.moved(config.index + 1, PageMove::Forward)),
            ),
            (PagerStep::Page(config), PagerAction::Retreat) if config.has_previous() => Some(
                PagerStep::Page(config.moved(config.index - 1, PageMove::Back)),
            ),
            (PagerStep::Page(config), PagerAction::JumpTo(index))
                if index < config.total() && index != config.index =>
            {
                Some(PagerStep::Page(config.moved(index, PageMove::Jump)))
            }
            _ => None,
        }
    }
}

impl Evaluator for PagerEvaluator {
    type Step = PagerStep;
    type Action = PagerAction;

    fn store(&self) -> &StepStore<PagerStep> {
        &self.store
    }

    fn evaluate(&self, action: PagerAction) -> Handled {
        let next = self
            .store
            .with_current(|step| self.next_step(step, action));
        match next {
            Some(step) => {
                self.store.set(step);
                Handled::Applied
            }
            None => Handled::Ignored,
        }
    }
}

// ---------------------------------------------------------------------------
// Translator
// ---------------------------------------------------------------------------

/// Everything the pager view draws, as one comparable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PagerDisplay {
    pub page_label: String,
    pub title: String,
    pub body: String,
    pub back_enabled: bool,
    pub forward_enabled: bool,
    pub loading: bool,
    pub empty_notice: bool,
}

#[derive(Debug, Default)]
pub struct PagerTranslator {
    pub page_label: ObservableCell<String>,
    pub title: ObservableCell<String>,
    pub body: ObservableCell<String>,
    pub back_enabled: ObservableCell<bool>,
    pub forward_enabled: ObservableCell<bool>,
    pub loading: ObservableCell<bool>,
    pub empty_notice: ObservableCell<bool>,
    /// Fires once per page change with the direction of travel.
    pub page_turned: PassableSignal<PageMove>,
    /// Fires when a forward move or jump lands on the last page.
    pub end_reached: PassableSignal<()>,
    pub transitions: PassableSignal<TransitionHint>,
}

impl PagerTranslator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn display(&self) -> PagerDisplay {
        PagerDisplay {
            page_label: self.page_label.get(),
            title: self.title.get(),
            body: self.body.get(),
            back_enabled: self.back_enabled.get(),
            forward_enabled: self.forward_enabled.get(),
            loading: self.loading.get(),
            empty_notice: self.empty_notice.get(),
        }
    }

    fn assign(&self, display: PagerDisplay) {
        self.page_label.set(display.page_label);
        self.title.set(display.title);
        self.body.set(display.body);
        self.back_enabled.set(display.back_enabled);
        self.forward_enabled.set(display.forward_enabled);
        self.loading.set(display.loading);
        self.empty_notice.set(display.empty_notice);
    }

    fn show_loading(&self) {
        TransitionScope::run(|| {
            self.assign(PagerDisplay {
                page_label: String::new(),
                title: String::new(),
                body: String::new(),
                back_enabled: false,
                forward_enabled: false,
                loading: true,
                empty_notice: false,
            });
        });
    }

    fn show_empty(&self) {
        TransitionScope::run(|| {
            self.assign(PagerDisplay {
                page_label: "0 / 0".to_string(),
                title: "Nothing to read yet".to_string(),
                body: String::new(),
                back_enabled: false,
                forward_enabled: false,
                loading: false,
                empty_notice: true,
            });
        });
    }

    fn show_page(&self, config: &PageConfig) {
        let scope = match config.arrived_by() {
            Some(how) => TransitionScope::with_hint(
                TransitionHint::new(how.hint_label(), PAGE_TURN),
                &self.transitions,
            ),
            None => TransitionScope::begin(),
        };
        let page = config.page();
        self.assign(PagerDisplay {
            page_label: config.label(),
            title: page.title.clone(),
            body: page.body.clone(),
            back_enabled: config.has_previous(),
            forward_enabled: config.has_next(),
            loading: false,
            empty_notice: false,
        });
        drop(scope);

        // Signals fire after the cells so listeners see the new page.
        if let Some(how) = config.arrived_by() {
            self.page_turned.send(how);
            if how != PageMove::Back && !config.has_next() {
                self.end_reached.send(());
            }
        }
    }
}

impl Translator for PagerTranslator {
    type Step = PagerStep;

    fn translate(&self, step: &PagerStep) {
        match step {
            PagerStep::Loading => self.show_loading(),
            PagerStep::Empty => self.show_empty(),
            PagerStep::Page(config) => self.show_page(config),
        }
    }
}

impl Traceable for PagerTranslator {
    fn trace(&self, recorder: &TraceRecorder) {
        recorder.cell("page_label", &self.page_label);
        recorder.cell("title", &self.title);
        recorder.cell("body", &self.body);
        recorder.cell("back_enabled", &self.back_enabled);
        recorder.cell("forward_enabled", &self.forward_enabled);
        recorder.cell("loading", &self.loading);
        recorder.cell("empty_notice", &self.empty_notice);
        recorder.signal("page_turned", &self.page_turned);
        recorder.signal("end_reached", &self.end_reached);
        recorder.transitions(&self.transitions);
    }
}

pub type PagerScreen = Screen<PagerEvaluator, PagerTranslator>;

/// Assemble a pager over `content`.
#[must_use]
pub fn pager_screen(content: Rc<dyn ContentSource>, sequencer: DeferredSequencer) -> PagerScreen {
    Screen::new(
        PagerEvaluator::new(content),
        PagerTranslator::new(),
        sequencer.scoped(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::StaticContent;

    #[test]
    fn parse_tokens() {
        assert_eq!(PagerAction::parse("next"), Some(PagerAction::Advance));
        assert_eq!(PagerAction::parse("jump:2"), Some(PagerAction::JumpTo(1)));
        assert_eq!(PagerAction::parse("jump:0"), None);
        assert_eq!(PagerAction::parse("jump:x"), None);
        assert_eq!(PagerAction::parse("skip"), None);
    }

    #[test]
    fn label_and_edges() {
        let config = PageConfig::first(StaticContent::numbered(3).pages()).unwrap();
        assert_eq!(config.label(), "1 / 3");
        assert!(!config.has_previous());
        assert!(config.has_next());
        let last = config.moved(2, PageMove::Jump);
        assert_eq!(last.label(), "3 / 3");
        assert!(!last.has_next());
    }

    #[test]
    fn empty_content_goes_to_empty_step() {
        let screen = pager_screen(Rc::new(StaticContent::numbered(0)), DeferredSequencer::new());
        screen.dispatch(PagerAction::ViewAppeared);
        assert_eq!(screen.current_step(), PagerStep::Empty);
        let display = screen.translator().display();
        assert!(display.empty_notice);
        assert_eq!(display.page_label, "0 / 0");
        assert!(!display.forward_enabled);
    }

    #[test]
    fn jump_guards() {
        let screen = pager_screen(Rc::new(StaticContent::numbered(3)), DeferredSequencer::new());
        assert!(!screen.dispatch(PagerAction::JumpTo(1)).is_applied());
        screen.dispatch(PagerAction::ViewAppeared);
        assert!(!screen.dispatch(PagerAction::JumpTo(0)).is_applied());
        assert!(!screen.dispatch(PagerAction::JumpTo(3)).is_applied());
        assert!(screen.dispatch(PagerAction::JumpTo(2)).is_applied());
        assert_eq!(screen.translator().page_label.get(), "3 / 3");
    }

    #[test]
    fn translation_is_deterministic() {
        let config = PageConfig::first(StaticContent::numbered(4).pages())
            .unwrap()
            .moved(1, PageMove::Forward);
        let a = PagerTranslator::new();
        let b = PagerTranslator::new();
        a.translate(&PagerStep::Page(config.clone()));
        b.translate(&PagerStep::Loading);
        b.translate(&PagerStep::Page(config));
        assert_eq!(a.display(), b.display());
    }
}
