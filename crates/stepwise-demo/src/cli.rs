use std::io::Write;
use std::time::Duration;

use clap::Parser;

use crate::error::{DemoError, Result};
use crate::screens::intro::IntroTimings;
use crate::script::{RunConfig, run_script};

const MAX_TICK_MS: u64 = 60_000;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "stepwise-demo",
    about = "Drive an example Stepwise screen with scripted actions and print a JSONL trace",
    version
)]
pub struct Cli {
    /// Screen to drive: pager, intro or login.
    #[arg(long, env = "STEPWISE_DEMO_SCREEN", default_value = "pager")]
    pub screen: String,

    /// Action script, e.g. "appear,next,wait:500,prev".
    #[arg(long, env = "STEPWISE_DEMO_ACTIONS", default_value = "appear")]
    pub actions: String,

    /// Host tick interval for waits, in milliseconds. 0 steps exactly to
    /// each timer deadline.
    #[arg(long = "tick-ms", env = "STEPWISE_DEMO_TICK_MS", default_value_t = 16)]
    pub tick_ms: u64,

    /// Use this many generated pages instead of the tutorial content.
    #[arg(long, env = "STEPWISE_DEMO_PAGES")]
    pub pages: Option<usize>,

    #[arg(long = "interlude-ms", default_value_t = 500)]
    pub interlude_ms: u64,

    #[arg(long = "title-ms", default_value_t = 1000)]
    pub title_ms: u64,

    /// Simulated credential check latency for the login screen.
    #[arg(long = "verify-ms", default_value_t = 800)]
    pub verify_ms: u64,
}

impl Cli {
    pub fn to_config(&self) -> Result<RunConfig> {
        if self.tick_ms > MAX_TICK_MS {
            return Err(DemoError::invalid(format!(
                "--tick-ms must be at most {MAX_TICK_MS}, got {}",
                self.tick_ms
            )));
        }
        Ok(RunConfig {
            screen: self.screen.parse()?,
            script: self.actions.clone(),
            pages: self.pages,
            tick: Duration::from_millis(self.tick_ms),
            intro: IntroTimings {
                interlude: Duration::from_millis(self.interlude_ms),
                title: Duration::from_millis(self.title_ms),
            },
            verify_delay: Duration::from_millis(self.verify_ms),
        })
    }
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    run(cli)
}

pub fn run(cli: Cli) -> Result<()> {
    let config = cli.to_config()?;
    let recorder = run_script(&config)?;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    recorder.write_jsonl(&mut out)?;
    out.flush()?;
    Ok(())
}
