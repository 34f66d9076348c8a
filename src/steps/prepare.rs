//! Create the downloads directory used by program recipes.
use anyhow::{Context as _, Result};

use super::{Context, Step, StepResult};

/// Create the downloads directory.
#[derive(Debug)]
pub struct PrepareDownloads;

impl Step for PrepareDownloads {
    fn name(&self) -> &'static str {
        "Prepare downloads directory"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let dir = ctx.downloads_dir();
        if ctx.dry_run {
            ctx.log.dry_run(&format!("would create {}", dir.display()));
            return Ok(StepResult::DryRun);
        }
        std::fs::create_dir_all(dir)
            .with_context(|| format!("creating downloads directory {}", dir.display()))?;
        ctx.log.debug(&format!("downloads directory: {}", dir.display()));
        Ok(StepResult::Ok)
    }
}
