//! Command helpers shared by the steps.
use std::time::Duration;

use anyhow::Result;

use super::Context;
use crate::exec::ShellCommand;
use crate::outcome::Outcome;
use crate::sanitize::Sanitizer;

/// Run one shell command for a step and require a successful outcome.
///
/// In dry-run mode the command is only logged. Otherwise it is run with
/// `timeout`, its error output is sanitized with `sanitizer`, and a
/// [`Outcome::Failure`] or an interrupt is returned as an error.
///
/// # Errors
///
/// Returns a [`CommandError`](crate::error::CommandError) if the command
/// could not run, was interrupted, or failed.
pub fn run_command(
    ctx: &Context,
    line: &str,
    timeout: Option<Duration>,
    sanitizer: &Sanitizer,
) -> Result<Outcome> {
    if ctx.dry_run {
        ctx.log.dry_run(&format!("would run: {line}"));
        return Ok(Outcome::Success);
    }

    ctx.log.debug(&format!("$ {line}"));
    let command = ShellCommand::new(line).with_timeout(timeout);
    let result = ctx.executor.run(&command)?;

    let stdout = result.stdout_lossy();
    if !stdout.trim().is_empty() {
        ctx.log.debug(stdout.trim_end());
    }

    let sanitizer = (!sanitizer.is_empty()).then_some(sanitizer);
    let outcome = Outcome::classify(&result, sanitizer)?.into_result(line)?;
    if outcome == Outcome::SuccessWithBenignNoise {
        ctx.log.debug("stripped benign diagnostics from error output");
    }
    Ok(outcome)
}

/// Quote `s` for safe interpolation into a POSIX shell command line.
#[must_use]
pub fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}
