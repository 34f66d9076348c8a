//! apt and snap package installation.
use anyhow::{Context as _, Result, bail};

use super::helpers::run_command;
use super::{Context, Step, StepResult};
use crate::config::packages::install_order;
use crate::sanitize::Sanitizer;

/// Install the `[apt]` packages one at a time.
///
/// apt's "does not have a stable CLI interface" warning is stripped from
/// every command's error output; anything else apt prints there fails the
/// step.
#[derive(Debug)]
pub struct InstallAptPackages;

impl Step for InstallAptPackages {
    fn name(&self) -> &'static str {
        "Install apt packages"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        ctx.config.apt.update || !ctx.config.apt.packages.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let sanitizer = Sanitizer::apt();
        let timeout = ctx.config.timeouts.packages.get();

        if ctx.config.apt.update {
            run_command(ctx, "apt update -y", timeout, &sanitizer)
                .context("updating package lists")?;
        }

        for package in &ctx.config.apt.packages {
            ctx.log.info(&format!("installing {package}"));
            run_command(ctx, &format!("apt install -y {package}"), timeout, &sanitizer)
                .with_context(|| format!("installing {package}"))?;
        }

        Ok(StepResult::done(ctx))
    }
}

/// Install the `[[snap]]` packages, classic confinement first.
#[derive(Debug)]
pub struct InstallSnapPackages;

impl Step for InstallSnapPackages {
    fn name(&self) -> &'static str {
        "Install snap packages"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.config.snaps.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        if !ctx.dry_run && !ctx.executor.which("snap") {
            bail!("snap is not installed");
        }
        let timeout = ctx.config.timeouts.packages.get();
        for snap in install_order(&ctx.config.snaps) {
            ctx.log.info(&format!("installing snap {}", snap.name));
            run_command(ctx, &snap.install_command(), timeout, &Sanitizer::default())
                .with_context(|| format!("installing snap {}", snap.name))?;
        }
        Ok(StepResult::done(ctx))
    }
}
