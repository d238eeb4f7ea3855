#![forbid(unsafe_code)]

//! Example screens built on the stepwise runtime.

pub mod intro;
pub mod login;
pub mod pager;

use std::fmt;
use std::str::FromStr;

use crate::error::DemoError;

/// The screens the trace runner can drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenKind {
    Pager,
    Intro,
    Login,
}

impl ScreenKind {
    pub const ALL: [Self; 3] = [Self::Pager, Self::Intro, Self::Login];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Pager => "pager",
            Self::Intro => "intro",
            Self::Login => "login",
        }
    }
}

impl fmt::Display for ScreenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ScreenKind {
    type Err = DemoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DemoError::UnknownScreen {
                name: s.to_string(),
            })
    }
}
