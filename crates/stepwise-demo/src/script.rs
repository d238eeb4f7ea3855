#![forbid(unsafe_code)]

//! Scripted driving of a screen on a lab clock.
//!
//! A script is a comma- or whitespace-separated list of tokens. `wait:<ms>`
//! advances the lab clock; every other token is parsed by the chosen
//! screen's action parser and dispatched. Due timers run after every
//! dispatch and on every host tick during a wait.
//!
//! # Failure Modes
//!
//! - Unknown action tokens fail the whole script before anything runs.
//! - A malformed `wait:` token, or one longer than [`MAX_WAIT_MS`], is an
//!   invalid-argument error.

use std::fmt::Debug;
use std::rc::Rc;
use std::time::Duration;

use serde_json::Value;
use stepwise_runtime::{DeferredSequencer, Evaluator, LabClock, Screen, Translator};

use crate::content::{ContentSource, StaticContent};
use crate::error::{DemoError, Result};
use crate::screens::ScreenKind;
use crate::screens::intro::{IntroAction, IntroStep, IntroTimings, intro_screen};
use crate::screens::login::{LoginAction, LoginStep, StaticAuthenticator, login_screen};
use crate::screens::pager::{PagerAction, PagerStep, pager_screen};
use crate::trace::{TraceKind, TraceRecorder, Traceable};

/// Longest single `wait:` a script may ask for (one hour).
pub const MAX_WAIT_MS: u64 = 3_600_000;

/// Everything needed to run one script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub screen: ScreenKind,
    pub script: String,
    /// Generate this many numbered pages instead of the tutorial content.
    pub pages: Option<usize>,
    /// Host tick interval during waits. Zero steps exactly to each deadline.
    pub tick: Duration,
    pub intro: IntroTimings,
    pub verify_delay: Duration,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            screen: ScreenKind::Pager,
            script: "appear".to_string(),
            pages: None,
            tick: Duration::from_millis(16),
            intro: IntroTimings::default(),
            verify_delay: Duration::from_millis(800),
        }
    }
}

/// One parsed script token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction<A> {
    Act(A),
    Wait(Duration),
}

/// Parse `script` with `parse_action` for non-wait tokens.
pub fn parse_script<A>(
    screen: ScreenKind,
    script: &str,
    parse_action: impl Fn(&str) -> Option<A>,
) -> Result<Vec<Instruction<A>>> {
    script
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|token| !token.is_empty())
        .map(|token| {
            if let Some(ms) = token.strip_prefix("wait:") {
                let ms: u64 = ms.parse().map_err(|_| {
                    DemoError::invalid(format!("wait needs milliseconds, got `{token}`"))
                })?;
                if ms > MAX_WAIT_MS {
                    return Err(DemoError::invalid(format!(
                        "wait must be at most {MAX_WAIT_MS} ms, got `{token}`"
                    )));
                }
                return Ok(Instruction::Wait(Duration::from_millis(ms)));
            }
            parse_action(token)
                .map(Instruction::Act)
                .ok_or_else(|| DemoError::UnknownAction {
                    screen: screen.name(),
                    token: token.to_string(),
                })
        })
        .collect()
}

/// Run `config` and return the recorder holding the trace.
pub fn run_script(config: &RunConfig) -> Result<TraceRecorder> {
    let clock = LabClock::new();
    let sequencer = DeferredSequencer::with_clock(clock.clone());
    let recorder = TraceRecorder::new(clock.clone());
    let content: Rc<dyn ContentSource> = Rc::new(match config.pages {
        Some(count) => StaticContent::numbered(count),
        None => StaticContent::tutorial(),
    });
    let host = Host {
        clock: &clock,
        recorder: &recorder,
        tick: config.tick,
    };

    tracing::info!(screen = %config.screen, script = %config.script, "running script");
    match config.screen {
        ScreenKind::Pager => {
            let script = parse_script(config.screen, &config.script, PagerAction::parse)?;
            host.drive(&pager_screen(content, sequencer), script, PagerStep::name);
        }
        ScreenKind::Intro => {
            let script = parse_script(config.screen, &config.script, IntroAction::parse)?;
            let screen = intro_screen(content, sequencer, config.intro);
            host.drive(&screen, script, IntroStep::name);
        }
        ScreenKind::Login => {
            let script = parse_script(config.screen, &config.script, LoginAction::parse)?;
            let screen = login_screen(
                Rc::new(StaticAuthenticator::demo()),
                sequencer,
                config.verify_delay,
            );
            host.drive(&screen, script, LoginStep::name);
        }
    }
    Ok(recorder)
}

struct Host<'a> {
    clock: &'a LabClock,
    recorder: &'a TraceRecorder,
    tick: Duration,
}

impl Host<'_> {
    fn drive<E, T>(
        &self,
        screen: &Screen<E, T>,
        script: Vec<Instruction<E::Action>>,
        label: fn(&E::Step) -> &'static str,
    ) where
        E: Evaluator,
        E::Action: Debug,
        T: Translator<Step = E::Step> + Traceable,
    {
        self.recorder.record(
            TraceKind::Step,
            "step",
            Value::from(screen.evaluator().store().with_current(label)),
        );
        self.recorder.store(screen.evaluator().store(), label);
        self.recorder.attach(screen.translator());

        for instruction in script {
            match instruction {
                Instruction::Act(action) => {
                    self.recorder
                        .record(TraceKind::Dispatch, "action", Value::from(format!("{action:?}")));
                    let outcome = screen.dispatch(action);
                    tracing::debug!(?outcome, "scripted action");
                    screen.tick();
                }
                Instruction::Wait(duration) => self.wait(screen.sequencer(), duration),
            }
        }
    }

    fn wait(&self, sequencer: &DeferredSequencer, duration: Duration) {
        if self.tick.is_zero() {
            sequencer.advance(self.clock, duration);
            return;
        }
        let mut remaining = duration;
        while !remaining.is_zero() {
            let step = self.idle_ticks(sequencer).min(remaining);
            self.clock.advance(step);
            sequencer.run_due();
            remaining -= step;
        }
    }

    /// Whole ticks until the next deadline is reached, so quiet stretches
    /// are skipped without moving any callback off its tick boundary.
    fn idle_ticks(&self, sequencer: &DeferredSequencer) -> Duration {
        let Some(until) = sequencer.time_until_next() else {
            return Duration::MAX;
        };
        let tick = self.tick.as_nanos();
        let ticks = until.as_nanos().div_ceil(tick).max(1);
        u64::try_from(ticks * tick).map_or(Duration::MAX, Duration::from_nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_mixed_separators() {
        let script = parse_script(ScreenKind::Pager, "appear, next wait:250,,prev", PagerAction::parse)
            .unwrap();
        assert_eq!(
            script,
            vec![
                Instruction::Act(PagerAction::ViewAppeared),
                Instruction::Act(PagerAction::Advance),
                Instruction::Wait(Duration::from_millis(250)),
                Instruction::Act(PagerAction::Retreat),
            ]
        );
    }

    #[test]
    fn unknown_token_names_screen() {
        let err = parse_script(ScreenKind::Intro, "appear,next", IntroAction::parse).unwrap_err();
        match err {
            DemoError::UnknownAction { screen, token } => {
                assert_eq!(screen, "intro");
                assert_eq!(token, "next");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn bad_wait_is_invalid_argument() {
        let err = parse_script(ScreenKind::Pager, "wait:soon", PagerAction::parse).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("wait:soon"));
    }

    #[test]
    fn oversized_wait_is_rejected() {
        let err = parse_script(ScreenKind::Pager, "appear wait:18446744073709551615", PagerAction::parse)
            .unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let limit = format!("wait:{MAX_WAIT_MS}");
        let script = parse_script(ScreenKind::Pager, &limit, PagerAction::parse).unwrap();
        assert_eq!(script, vec![Instruction::Wait(Duration::from_millis(MAX_WAIT_MS))]);
    }

    #[test]
    fn long_wait_keeps_tick_aligned_timing() {
        let config = RunConfig {
            screen: ScreenKind::Intro,
            script: format!("appear wait:{MAX_WAIT_MS}"),
            tick: Duration::from_millis(16),
            ..RunConfig::default()
        };
        let recorder = run_script(&config).unwrap();
        let step_times: Vec<_> = recorder
            .events()
            .into_iter()
            .filter(|e| e.kind == TraceKind::Step)
            .map(|e| (e.value, e.at_ms))
            .collect();
        assert_eq!(
            step_times,
            [
                (Value::from("initial"), 0),
                (Value::from("interlude"), 0),
                (Value::from("title"), 512),
                (Value::from("content"), 1504),
            ]
        );
    }

    #[test]
    fn coarse_ticks_still_reach_every_stage() {
        let config = RunConfig {
            screen: ScreenKind::Intro,
            script: "appear wait:1600".to_string(),
            tick: Duration::from_millis(100),
            ..RunConfig::default()
        };
        let recorder = run_script(&config).unwrap();
        let steps: Vec<_> = recorder
            .events()
            .into_iter()
            .filter(|e| e.kind == TraceKind::Step)
            .map(|e| e.value)
            .collect();
        assert_eq!(steps, ["initial", "interlude", "title", "content"]);
    }
}
