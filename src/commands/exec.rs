use std::io::Write as _;
use std::time::Duration;

use anyhow::{Context as _, Result};

use crate::cli::ExecOpts;
use crate::exec::{self, CancelToken, ShellCommand};
use crate::logging::Logger;
use crate::outcome::Outcome;
use crate::sanitize::Sanitizer;
use crate::steps::helpers::shell_quote;

/// Run a single shell command and report how it ended.
///
/// A single argument is taken as a shell line; several arguments are an
/// argument vector and each is quoted. The command's stdout is passed through; its stderr is sanitized with the
/// requested benign diagnostics and only the residual is shown.
///
/// # Errors
///
/// Returns a [`CommandError`](crate::error::CommandError) if the command
/// could not run, was interrupted, or failed.
pub fn run(opts: &ExecOpts, log: &Logger, cancel: &CancelToken) -> Result<()> {
    let command = ShellCommand::new(command_line(&opts.command))
        .with_timeout(opts.timeout.map(Duration::from_secs));
    log.debug(&format!("$ {command}"));

    let result = exec::run(&command, cancel)?;

    std::io::stdout()
        .write_all(&result.stdout)
        .context("writing command output")?;

    let sanitizer = Sanitizer::from_noise(&opts.noise);
    let outcome = Outcome::classify(&result, (!sanitizer.is_empty()).then_some(&sanitizer))?;
    log.debug(&format!(
        "finished in {:.1}s: {outcome:?}",
        result.elapsed.as_secs_f64()
    ));

    if outcome == Outcome::SuccessWithBenignNoise {
        log.info("succeeded (benign diagnostics stripped)");
    }
    outcome.into_result(command.line())?;
    Ok(())
}

/// The shell line for the trailing arguments of `exec`.
fn command_line(args: &[String]) -> String {
    match args {
        [line] => line.clone(),
        args => args
            .iter()
            .map(|arg| shell_quote(arg))
            .collect::<Vec<_>>()
            .join(" "),
    }
}
