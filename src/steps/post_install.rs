//! Post-install configuration: recipe commands followed by file copies.
use std::fs;
use std::path::Path;

use anyhow::{Context as _, Result};

use super::helpers::run_command;
use super::{Context, Step, StepResult};
use crate::config::recipes::{FileCopy, PostInstallRecipe, expand_home};

/// Apply one `[[post_install]]` recipe.
#[derive(Debug)]
pub struct ConfigureRecipe {
    label: String,
    recipe: PostInstallRecipe,
}

impl ConfigureRecipe {
    /// Create the step for `recipe`.
    #[must_use]
    pub fn new(recipe: PostInstallRecipe) -> Self {
        Self {
            label: format!("Configure {}", recipe.name),
            recipe,
        }
    }
}

impl Step for ConfigureRecipe {
    fn name(&self) -> &str {
        &self.label
    }

    fn should_run(&self, _ctx: &Context) -> bool {
        !self.recipe.commands.is_empty() || !self.recipe.files.is_empty()
    }

    fn run(&self, ctx: &Context) -> Result<StepResult> {
        let sanitizer = self.recipe.sanitizer();
        let timeout = ctx.config.timeouts.post_install.get();
        for command in &self.recipe.commands {
            let line = ctx.config.expand(command);
            run_command(ctx, &line, timeout, &sanitizer)
                .with_context(|| format!("configuring {}", self.recipe.name))?;
        }

        for copy in &self.recipe.files {
            copy_file(ctx, copy)?;
        }

        Ok(StepResult::done(ctx))
    }
}

/// Copy one file from the files directory, creating missing parents.
fn copy_file(ctx: &Context, copy: &FileCopy) -> Result<()> {
    let source = ctx.config.files_dir.join(&copy.source);
    let target = expand_home(&copy.target, &ctx.home);

    if ctx.dry_run {
        ctx.log.dry_run(&format!(
            "would copy {} -> {}",
            source.display(),
            target.display()
        ));
        return Ok(());
    }

    if !source.is_file() {
        anyhow::bail!("source file not found: {}", source.display());
    }
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    if same_file(&source, &target) {
        ctx.log.debug(&format!("{} is already in place", target.display()));
        return Ok(());
    }

    fs::copy(&source, &target).with_context(|| {
        format!("copying {} to {}", source.display(), target.display())
    })?;
    ctx.log.debug(&format!("copied {} -> {}", source.display(), target.display()));
    Ok(())
}

/// Whether both paths resolve to the same existing file.
fn same_file(a: &Path, b: &Path) -> bool {
    match (dunce::canonicalize(a), dunce::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::exec::{ExecStatus, MockExecutor};
    use crate::steps::test_helpers::{exec_result, make_context_with};
    use std::sync::Arc;
    use std::time::Duration;

    const TMUX: &str = r#"
[[post_install]]
name = "Tmux"
files = [{ source = "tmux.conf", target = "~/.config/tmux/tmux.conf" }]
"#;

    fn step(config: &Config) -> ConfigureRecipe {
        ConfigureRecipe::new(config.post_install.first().cloned().expect("one recipe"))
    }

    #[test]
    fn copies_files_into_home() {
        let root = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("files")).unwrap();
        fs::write(root.path().join("files/tmux.conf"), "set -g mouse on\n").unwrap();

        let config = Config::parse(root.path(), TMUX).unwrap();
        let step = step(&config);
        let (mut ctx, _log) = make_context_with(config, Arc::new(MockExecutor::new()), false);
        ctx.home = home.path().to_path_buf();

        assert_eq!(step.name(), "Configure Tmux");
        assert_eq!(step.run(&ctx).unwrap(), StepResult::Ok);
        let copied = fs::read_to_string(home.path().join(".config/tmux/tmux.conf")).unwrap();
        assert_eq!(copied, "set -g mouse on\n");

        // Re-running overwrites in place.
        assert_eq!(step.run(&ctx).unwrap(), StepResult::Ok);
    }

    #[test]
    fn missing_source_fails() {
        let root = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let config = Config::parse(root.path(), TMUX).unwrap();
        let step = step(&config);
        let (mut ctx, _log) = make_context_with(config, Arc::new(MockExecutor::new()), false);
        ctx.home = home.path().to_path_buf();

        let err = step.run(&ctx).unwrap_err();
        assert!(err.to_string().contains("source file not found"));
    }

    #[test]
    fn commands_run_before_copies_with_post_install_timeout() {
        let root = tempfile::tempdir().unwrap();
        let config = Config::parse(
            root.path(),
            "[[post_install]]\nname = \"Fish\"\ncommands = [\"chsh -s /usr/bin/fish\"]\n",
        )
        .unwrap();
        let step = step(&config);

        let mut mock = MockExecutor::new();
        mock.expect_run()
            .withf(|c| {
                c.line() == "chsh -s /usr/bin/fish" && c.timeout() == Some(Duration::from_secs(15))
            })
            .times(1)
            .returning(|c| Ok(exec_result(c.line(), ExecStatus::Completed { code: Some(0) }, b"")));
        let (ctx, _log) = make_context_with(config, Arc::new(mock), false);
        assert_eq!(step.run(&ctx).unwrap(), StepResult::Ok);
    }

    #[test]
    fn dry_run_copies_nothing() {
        let root = tempfile::tempdir().unwrap();
        let home = tempfile::tempdir().unwrap();
        let config = Config::parse(root.path(), TMUX).unwrap();
        let step = step(&config);
        let (mut ctx, _log) = make_context_with(config, Arc::new(MockExecutor::new()), true);
        ctx.home = home.path().to_path_buf();

        assert_eq!(step.run(&ctx).unwrap(), StepResult::DryRun);
        assert!(!home.path().join(".config").exists());
    }

    #[test]
    fn same_file_detects_identical_paths() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("a");
        fs::write(&file, "x").unwrap();
        assert!(same_file(&file, &tmp.path().join("./a")));
        assert!(!same_file(&file, &tmp.path().join("missing")));
    }
}
