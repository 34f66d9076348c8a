//! Checks that must pass before anything is installed.
use anyhow::{Result, bail};

use super::{Context, Step, StepResult};
use crate::error::PlatformError;

/// Refuse to provision anything but an apt-based Linux.
#[derive(Debug)]
pub struct CheckPlatform;

impl Step for CheckPlatform {
    fn name(&self) -> &'static str {
        "Check platform"
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        true
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        if !ctx.platform.is_supported() {
            return Err(PlatformError::Unsupported(ctx.platform.describe()).into());
        }
        ctx.log.info(&format!(
            "platform: {} ({})",
            ctx.platform.describe(),
            ctx.platform.distro
        ));
        Ok(StepResult::Ok)
    }
}

/// Require root; apt and snap refuse to install otherwise.
#[derive(Debug)]
pub struct CheckPrivileges;

impl Step for CheckPrivileges {
    fn name(&self) -> &'static str {
        "Check privileges"
    }

    fn should_run(&self, ctx: &Context) -> bool {
        !ctx.dry_run
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        if !ctx.is_root {
            bail!("must be run as root (try sudo)");
        }
        Ok(StepResult::Ok)
    }
}
