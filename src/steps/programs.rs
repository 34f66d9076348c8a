//! Program recipes: one step per `[[program]]` entry.
use anyhow::{Context as _, Result};

use super::helpers::run_command;
use super::{Context, Step, StepResult};
use crate::config::recipes::ProgramRecipe;

/// Run the commands of one program recipe in order.
#[derive(Debug)]
pub struct InstallProgram {
    label: String,
    recipe: ProgramRecipe,
}

impl InstallProgram {
    /// Create the step for `recipe`.
    #[must_use]
    pub fn new(recipe: ProgramRecipe) -> Self {
        Self {
            label: format!("Install {}", recipe.name),
            recipe,
        }
    }
}

impl Step for InstallProgram {
    fn name(&self) -> &str {
        &self.label
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        !self.recipe.commands.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let sanitizer = self.recipe.sanitizer();
        let timeout = ctx.config.timeouts.programs.get();
        for command in &self.recipe.commands {
            let line = ctx.config.expand(command);
            run_command(ctx, &line, timeout, &sanitizer)
                .with_context(|| format!("installing {}", self.recipe.name))?;
        }
        Ok(StepResult::done(ctx))
    }
}
