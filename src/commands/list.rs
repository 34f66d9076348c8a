use anyhow::Result;

use super::CommandSetup;
use crate::cli::{GlobalOpts, InstallOpts};
use crate::logging::Logger;
use crate::steps;

/// Print the names of the steps an install would run, in order.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded.
#[allow(clippy::print_stdout)]
pub fn run(global: &GlobalOpts, opts: &InstallOpts, log: &Logger) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let plan = steps::select(steps::plan(&setup.config), &opts.only, &opts.skip);
    for (i, step) in plan.iter().enumerate() {
        println!("{:>2}. {}", i + 1, step.name());
    }
    Ok(())
}
