//! Final cleanup: drop the downloads directory and run cleanup commands.
use std::io;

use anyhow::{Context as _, Result};

use super::helpers::run_command;
use super::{Context, Step, StepResult};
use crate::sanitize::Sanitizer;

/// Remove the downloads directory, then run the `[cleanup]` commands.
#[derive(Debug)]
pub struct CleanUp;

impl Step for CleanUp {
    fn name(&self) -> &'static str {
        "Clean up"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.config.cleanup.remove_downloads || !ctx.config.cleanup.commands.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let cleanup = &ctx.config.cleanup;

        if cleanup.remove_downloads {
            let dir = ctx.downloads_dir();
            if ctx.dry_run {
                ctx.log.dry_run(&format!("would remove {}", dir.display()));
            } else {
                match std::fs::remove_dir_all(dir) {
                    Ok(()) => ctx.log.debug(&format!("removed {}", dir.display())),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(e) => {
                        return Err(e).with_context(|| format!("removing {}", dir.display()));
                    }
                }
            }
        }

        let sanitizer = Sanitizer::from_noise(&cleanup.noise);
        let timeout = ctx.config.timeouts.default.get();
        for command in &cleanup.commands {
            let line = ctx.config.expand(command);
            run_command(ctx, &line, timeout, &sanitizer)?;
        }

        Ok(StepResult::done(ctx))
    }
}
