#![forbid(unsafe_code)]

//! Content providers injected into screen evaluators.
//!
//! Evaluators take an `Rc<dyn ContentSource>` at construction instead of
//! reaching for a global, so tests and the trace runner can supply their own
//! copy.

use std::rc::Rc;

/// One page of pager content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub title: String,
    pub body: String,
}

impl Page {
    #[must_use]
    pub fn new(title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
        }
    }
}

/// Copy shown by the timed intro screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntroCopy {
    pub title: String,
    pub subtitle: String,
    pub body: String,
}

/// Source of the text a screen displays.
pub trait ContentSource {
    /// Pages for the pager, in reading order. May be empty.
    fn pages(&self) -> Rc<[Page]>;

    /// Copy for the intro screen.
    fn intro(&self) -> IntroCopy;
}

/// Fixed in-memory content.
#[derive(Debug, Clone)]
pub struct StaticContent {
    pages: Rc<[Page]>,
    intro: IntroCopy,
}

impl StaticContent {
    #[must_use]
    pub fn new(pages: Vec<Page>, intro: IntroCopy) -> Self {
        Self {
            pages: pages.into(),
            intro,
        }
    }

    /// The built-in tutorial content.
    #[must_use]
    pub fn tutorial() -> Self {
        Self::new(
            vec![
                Page::new(
                    "One step at a time",
                    "A screen holds exactly one step. Everything it shows is derived from it.",
                ),
                Page::new(
                    "Cells, not screens",
                    "The translator writes small observable cells; views watch only what they draw.",
                ),
                Page::new(
                    "Intent flows up",
                    "Views dispatch actions. The evaluator decides what the next step is.",
                ),
            ],
            Self::tutorial_intro(),
        )
    }

    /// `count` generated pages titled "Page 1", "Page 2", ...
    #[must_use]
    pub fn numbered(count: usize) -> Self {
        let pages = (1..=count)
            .map(|n| Page::new(format!("Page {n}"), format!("Body of page {n}.")))
            .collect();
        Self::new(pages, Self::tutorial_intro())
    }

    fn tutorial_intro() -> IntroCopy {
        IntroCopy {
            title: "Stepwise".to_string(),
            subtitle: "State you can point at".to_string(),
            body: "Every screen in this tour is one step machine.".to_string(),
        }
    }
}

impl Default for StaticContent {
    fn default() -> Self {
        Self::tutorial()
    }
}

impl ContentSource for StaticContent {
    fn pages(&self) -> Rc<[Page]> {
        Rc::clone(&self.pages)
    }

    fn intro(&self) -> IntroCopy {
        self.intro.clone()
    }
}
