use std::sync::Arc;

use anyhow::Result;

use super::CommandSetup;
use crate::cli::{GlobalOpts, InstallOpts};
use crate::exec::{CancelToken, SystemExecutor};
use crate::logging::{Log, Logger};
use crate::steps::{self, Context};

/// Run the install command.
///
/// Steps run strictly in order and the run stops at the first failure; the
/// summary is printed either way.
///
/// # Errors
///
/// Returns a [`ProvisionError`](crate::error::ProvisionError) if setup fails
/// or a step fails or is interrupted.
pub fn run(
    global: &GlobalOpts,
    opts: &InstallOpts,
    log: &Arc<Logger>,
    cancel: &CancelToken,
) -> Result<()> {
    log.info(&format!("provision {}", super::version::version()));

    let setup = CommandSetup::init(global, log)?;
    log.info(&format!("platform: {}", setup.platform.describe()));

    let ctx = Context::new(
        Arc::new(setup.config),
        Arc::new(setup.platform),
        Arc::clone(log) as Arc<dyn Log>,
        global.dry_run,
        Arc::new(SystemExecutor::new(cancel.clone())),
        cancel.clone(),
    )?;

    let plan = steps::select(steps::plan(&ctx.config), &opts.only, &opts.skip);
    log.debug(&format!("{} steps selected", plan.len()));

    let result = steps::run_fail_fast(&plan, &ctx);
    log.print_summary();
    Ok(result?)
}
