//! Named provisioning steps and the fail-fast orchestrator that runs them.
mod context;
pub mod cleanup;
pub mod helpers;
pub mod images;
pub mod packages;
pub mod post_install;
pub mod preflight;
pub mod prepare;
pub mod programs;

pub use context::Context;

use anyhow::Result;

use crate::config::Config;
use crate::error::{CommandError, InstallationError, PlatformError, ProvisionError};
use crate::logging::StepStatus;

/// Result of a step that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepResult {
    /// The step applied its changes.
    Ok,
    /// The step only logged what it would do.
    DryRun,
}

impl StepResult {
    /// `DryRun` when `ctx` is a dry run, `Ok` otherwise.
    #[must_use]
    pub const fn done(ctx: &Context) -> Self {
        if ctx.dry_run { Self::DryRun } else { Self::Ok }
    }
}

/// A named, executable provisioning step.
pub trait Step: Send + Sync {
    /// Human-readable step name, used in logs, the summary, and errors.
    fn name(&self) -> &str;

    /// Whether this step has anything to do.
    fn should_run(&self, ctx: &Context) -> bool;

    /// Execute the step.
    ///
    /// # Errors
    ///
    /// Returns an error if any command or file operation of the step fails.
    fn run(&self, ctx: &Context) -> Result<StepResult>;
}

/// The full step sequence for `config`, in execution order.
#[must_use]
pub fn plan(config: &Config) -> Vec<Box<dyn Step>> {
    let mut steps: Vec<Box<dyn Step>> = vec![
        Box::new(preflight::CheckPlatform),
        Box::new(preflight::CheckPrivileges),
        Box::new(prepare::PrepareDownloads),
        Box::new(packages::InstallAptPackages),
        Box::new(packages::InstallSnapPackages),
    ];
    steps.extend(
        config
            .programs
            .iter()
            .map(|r| Box::new(programs::InstallProgram::new(r.clone())) as Box<dyn Step>),
    );
    steps.extend(
        config
            .post_install
            .iter()
            .map(|r| Box::new(post_install::ConfigureRecipe::new(r.clone())) as Box<dyn Step>),
    );
    steps.push(Box::new(images::DownloadImages));
    steps.push(Box::new(cleanup::CleanUp));
    steps
}

/// Keep the steps selected by `--only` / `--skip`.
///
/// Both match case-insensitive substrings of step names; `only` wins when
/// both are given.
#[must_use]
pub fn select(steps: Vec<Box<dyn Step>>, only: &[String], skip: &[String]) -> Vec<Box<dyn Step>> {
    steps
        .into_iter()
        .filter(|s| {
            let name = s.name().to_lowercase();
            if !only.is_empty() {
                return only.iter().any(|o| name.contains(&o.to_lowercase()));
            }
            !skip.iter().any(|k| name.contains(&k.to_lowercase()))
        })
        .collect()
}

/// Whether `err`'s chain contains a user interrupt.
fn is_interrupt(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<CommandError>())
        .any(CommandError::is_interrupted)
}

/// Execute a step, recording the result in the logger.
///
/// # Errors
///
/// Returns [`ProvisionError::Interrupted`] if the user interrupted the step,
/// [`ProvisionError::Platform`] if the machine is unsupported, and
/// [`ProvisionError::Installation`] naming the step for any other failure.
pub fn execute(step: &dyn Step, ctx: &Context) -> Result<(), ProvisionError> {
    let name = step.name();
    if !step.should_run(ctx) {
        ctx.log.debug(&format!("skipping step: {name} (not applicable)"));
        ctx.log.record_step(name, StepStatus::NotApplicable, None);
        return Ok(());
    }

    ctx.log.stage(name);

    match step.run(ctx) {
        Ok(StepResult::Ok) => {
            ctx.log.record_step(name, StepStatus::Ok, None);
            Ok(())
        }
        Ok(StepResult::DryRun) => {
            ctx.log.record_step(name, StepStatus::DryRun, None);
            Ok(())
        }
        Err(e) if is_interrupt(&e) => {
            ctx.log.error(&format!("{name}: interrupted"));
            ctx.log.record_step(name, StepStatus::Failed, Some("interrupted"));
            Err(ProvisionError::Interrupted {
                step: name.to_string(),
            })
        }
        Err(e) => {
            let cause = format!("{e:#}");
            ctx.log.error(&format!("{name}: {cause}"));
            ctx.log.record_step(name, StepStatus::Failed, Some(&cause));
            match e.downcast::<PlatformError>() {
                Ok(platform) => Err(platform.into()),
                Err(_) => Err(InstallationError {
                    step: name.to_string(),
                    cause,
                }
                .into()),
            }
        }
    }
}

/// Run `steps` in order, stopping at the first failure.
///
/// Steps after a failure are never started and are recorded as
/// [`StepStatus::NotRun`]. A pending interrupt is honoured before each
/// step starts.
///
/// # Errors
///
/// Returns the error of the first failing step.
pub fn run_fail_fast(steps: &[Box<dyn Step>], ctx: &Context) -> Result<(), ProvisionError> {
    for (i, step) in steps.iter().enumerate() {
        let result = if ctx.cancel.is_cancelled() {
            ctx.log.record_step(step.name(), StepStatus::NotRun, Some("interrupted"));
            Err(ProvisionError::Interrupted {
                step: step.name().to_string(),
            })
        } else {
            execute(step.as_ref(), ctx)
        };
        if let Err(e) = result {
            for rest in steps.iter().skip(i + 1) {
                ctx.log.record_step(rest.name(), StepStatus::NotRun, None);
            }
            return Err(e);
        }
    }
    Ok(())
}

/// Shared helpers for step unit tests.
#[cfg(test)]
#[allow(clippy::expect_used)]
pub mod test_helpers {
    use std::path::{Path, PathBuf};
    use std::sync::Arc;
    use std::time::Duration;

    use crate::config::Config;
    use crate::exec::{CancelToken, ExecResult, ExecStatus, Executor, MockExecutor};
    use crate::logging::{Log, Logger};
    use crate::platform::Platform;

    use super::Context;

    /// Configuration with every list empty, rooted at `root`.
    #[must_use]
    pub fn empty_config(root: &Path) -> Config {
        Config::parse(root, "").expect("empty config parses")
    }

    /// An Ubuntu platform.
    #[must_use]
    pub fn ubuntu() -> Platform {
        Platform::from_sources("ID=ubuntu\nPRETTY_NAME=\"Ubuntu 24.04 LTS\"\n", "Linux version 6.8.0")
    }

    /// An [`ExecResult`] for `command` with the given status and stderr.
    #[must_use]
    pub fn exec_result(command: &str, status: ExecStatus, stderr: &[u8]) -> ExecResult {
        ExecResult {
            command: command.to_string(),
            stdout: Vec::new(),
            stderr: stderr.to_vec(),
            stdout_truncated: 0,
            stderr_truncated: 0,
            status,
            elapsed: Duration::ZERO,
            timeout: None,
        }
    }

    /// A root, non-dry-run context whose executor must not be called.
    #[must_use]
    pub fn make_context(config: Config) -> (Context, Arc<Logger>) {
        let mut mock = MockExecutor::new();
        mock.expect_run().never();
        make_context_with(config, Arc::new(mock), false)
    }

    /// A root context with the given executor and dry-run flag.
    #[must_use]
    pub fn make_context_with(
        config: Config,
        executor: Arc<dyn Executor>,
        dry_run: bool,
    ) -> (Context, Arc<Logger>) {
        let log = Arc::new(Logger::with_log_file(None));
        let ctx = Context {
            config: Arc::new(config),
            platform: Arc::new(ubuntu()),
            log: Arc::clone(&log) as Arc<dyn Log>,
            dry_run,
            home: PathBuf::from("/home/test"),
            is_root: true,
            executor,
            cancel: CancelToken::new(),
        };
        (ctx, log)
    }
}
