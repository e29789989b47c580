//! Container engine invocation.
//!
//! Every pull/build/push goes through [`Executor`], which owns the retry and
//! dry-run behavior so call sites only decide whether a failure is worth
//! retrying.

use crate::error::{BuildError, Result};
use colored::Colorize;
use std::process::Command;
use std::time::Duration;

/// Bounded retry policy for engine invocations.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total invocation attempts, including the first.
    pub attempts: u32,

    /// Fixed delay between attempts.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

/// Runs container-engine commands, optionally retrying on failure.
#[derive(Debug, Clone)]
pub struct Executor {
    engine: String,
    dry_run: bool,
    retry: RetryPolicy,
}

impl Executor {
    pub fn new(engine: impl Into<String>, dry_run: bool, retry: RetryPolicy) -> Self {
        Self {
            engine: engine.into(),
            dry_run,
            retry,
        }
    }

    /// Run `<engine> <args..>`, inheriting stdio so engine output streams
    /// through.
    ///
    /// With `retry` the same invocation is repeated until it succeeds or the
    /// policy's attempts run out; the last failure then propagates. Without
    /// `retry` the first failure propagates immediately. In dry-run mode the
    /// command is echoed instead of executed and treated as succeeding.
    pub fn run(&self, args: &[String], retry: bool) -> Result<()> {
        let command = self.render(args);

        if self.dry_run {
            println!("  {} {}", "dry-run:".yellow(), command);
            return Ok(());
        }

        let attempts = if retry { self.retry.attempts.max(1) } else { 1 };
        let mut attempt = 1;

        loop {
            tracing::debug!("Running ({}/{}): {}", attempt, attempts, command);

            let status = Command::new(&self.engine).args(args).status()?;
            if status.success() {
                return Ok(());
            }

            if attempt >= attempts {
                return Err(BuildError::CommandFailed {
                    command,
                    attempts,
                    status,
                });
            }

            tracing::warn!(
                "Command failed ({}), retrying in {:?}: {}",
                status,
                self.retry.delay,
                command
            );
            std::thread::sleep(self.retry.delay);
            attempt += 1;
        }
    }

    fn render(&self, args: &[String]) -> String {
        let mut command = self.engine.clone();
        for arg in args {
            command.push(' ');
            command.push_str(arg);
        }
        command
    }
}
