//! Wallpaper downloads into the user's home directory.
use anyhow::{Context as _, Result};

use super::helpers::{run_command, shell_quote};
use super::{Context, Step, StepResult};
use crate::sanitize::Sanitizer;

/// Download every `[[image]]` with curl.
#[derive(Debug)]
pub struct DownloadImages;

impl Step for DownloadImages {
    fn name(&self) -> &'static str {
        "Download images"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.images.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let timeout = ctx.config.timeouts.downloads.get();
        for image in &ctx.config.images {
            let dest = image.destination(&ctx.home);
            if let Some(dir) = dest.parent()
                && !ctx.dry_run
            {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("creating directory {}", dir.display()))?;
            }
            let line = format!(
                "curl -fsSL -o {} {}",
                shell_quote(&dest.display().to_string()),
                shell_quote(&image.url)
            );
            run_command(ctx, &line, timeout, &Sanitizer::default())
                .with_context(|| format!("downloading {}", image.url))?;
        }
        Ok(StepResult::done(ctx))
    }
}
