#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for the `install` command.
//!
//! These tests exercise the step plan built from the shipped configuration,
//! the name-based filtering applied by `--skip` and `--only`, and full
//! fail-fast runs against a scripted executor.

mod common;

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use common::{Reply, ScriptedExecutor, TestContextBuilder};
use provision_cli::config::{CONFIG_FILE, Config};
use provision_cli::error::ProvisionError;
use provision_cli::logging::StepStatus;
use provision_cli::steps;

fn shipped_config() -> Config {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    Config::load(root, &root.join(CONFIG_FILE)).expect("load shipped config")
}

const FULL: &str = r#"
[apt]
update = true
packages = ["curl", "foo", "tmux"]

[[snap]]
name = "vlc"

[[program]]
name = "Poetry"
commands = ["curl -sSL https://install.python-poetry.org | python3 -"]

[[post_install]]
name = "Tmux"
files = [{ source = "tmux.conf", target = "~/.tmux.conf" }]

[cleanup]
commands = ["apt autoclean"]
noise = ["apt-cli-warning"]
"#;

// ---------------------------------------------------------------------------
// Snapshot: step plan of the shipped configuration
// ---------------------------------------------------------------------------

/// Snapshot of every step name in execution order.
///
/// Any addition, removal, or rename of a step or a shipped recipe fails this
/// test, prompting a deliberate snapshot update.
#[test]
fn plan_step_names() {
    let plan = steps::plan(&shipped_config());
    let names: Vec<&str> = plan.iter().map(|s| s.name()).collect();
    insta::assert_snapshot!("plan_step_names", names.join("\n"));
}

// ---------------------------------------------------------------------------
// Structural invariants
// ---------------------------------------------------------------------------

/// No two steps may share the same name.
#[test]
fn plan_step_names_are_unique() {
    let plan = steps::plan(&shipped_config());
    let mut seen: HashSet<&str> = HashSet::new();
    for step in &plan {
        assert!(seen.insert(step.name()), "duplicate step name: '{}'", step.name());
    }
}

/// Preflight checks come first and cleanup comes last.
#[test]
fn plan_is_bracketed_by_preflight_and_cleanup() {
    let plan = steps::plan(&shipped_config());
    assert_eq!(plan.first().map(|s| s.name()), Some("Check platform"));
    assert_eq!(plan.last().map(|s| s.name()), Some("Clean up"));
}

/// The shipped configuration has no validation warnings.
#[test]
fn shipped_config_is_clean() {
    let warnings = shipped_config().validate();
    assert!(warnings.is_empty(), "unexpected warnings: {warnings:?}");
}

// ---------------------------------------------------------------------------
// --skip / --only
// ---------------------------------------------------------------------------

/// `--skip` removes every step whose name contains the keyword.
#[test]
fn skip_filter_excludes_matching_steps() {
    let all = steps::plan(&shipped_config()).len();
    let filtered = steps::select(steps::plan(&shipped_config()), &[], &["Neovim".to_string()]);
    assert_eq!(filtered.len(), all - 2);
    assert!(filtered.iter().all(|s| !s.name().contains("Neovim")));
}

/// `--only` with several keywords keeps steps matching any of them.
#[test]
fn only_filter_accepts_multiple_keywords() {
    let filtered = steps::select(
        steps::plan(&shipped_config()),
        &["apt".to_string(), "clean".to_string()],
        &[],
    );
    let names: Vec<&str> = filtered.iter().map(|s| s.name()).collect();
    assert_eq!(names, ["Install apt packages", "Clean up"]);
}

/// `--only` matching nothing yields an empty plan.
#[test]
fn only_filter_with_no_match_is_empty() {
    let filtered = steps::select(steps::plan(&shipped_config()), &["zzznomatch".to_string()], &[]);
    assert!(filtered.is_empty());
}

// ---------------------------------------------------------------------------
// Fail-fast runs
// ---------------------------------------------------------------------------

/// A failing apt package stops the run: later packages and later steps are
/// never executed, and the error names the step.
#[test]
fn failing_package_stops_the_run() {
    let repo = TestContextBuilder::new()
        .with_config(FULL)
        .with_file("tmux.conf", "set -g mouse on\n")
        .build();
    let executor = Arc::new(
        ScriptedExecutor::default()
            .on("apt update", Reply::AptNoise)
            .on("apt install -y curl", Reply::AptNoise)
            .on("apt install -y foo", Reply::Fail(100, "E: Unable to locate package foo\n")),
    );
    let (ctx, log) = repo.context(executor.clone());

    let plan = steps::plan(&ctx.config);
    let err = steps::run_fail_fast(&plan, &ctx).unwrap_err();

    assert_eq!(err.exit_code(), 1);
    assert!(matches!(&err, ProvisionError::Installation(e) if e.step == "Install apt packages"));
    assert!(err.to_string().contains("E: Unable to locate package foo"));

    assert_eq!(
        executor.calls(),
        ["apt update -y", "apt install -y curl", "apt install -y foo"]
    );
    assert!(!repo.home.path().join(".tmux.conf").exists());

    let entries = log.entries();
    let failed = entries.iter().position(|e| e.status == StepStatus::Failed).unwrap();
    assert_eq!(entries[failed].name, "Install apt packages");
    assert!(entries[failed + 1..].iter().all(|e| e.status == StepStatus::NotRun));
    assert_eq!(entries.len(), plan.len());
}

/// With only benign apt noise on stderr every step succeeds.
#[test]
fn benign_noise_does_not_fail_the_run() {
    let repo = TestContextBuilder::new()
        .with_config(FULL)
        .with_file("tmux.conf", "set -g mouse on\n")
        .build();
    let executor = Arc::new(ScriptedExecutor::default().on("apt", Reply::AptNoise));
    let (ctx, log) = repo.context(executor.clone());

    steps::run_fail_fast(&steps::plan(&ctx.config), &ctx).unwrap();

    assert_eq!(log.failure_count(), 0);
    assert_eq!(
        std::fs::read_to_string(repo.home.path().join(".tmux.conf")).unwrap(),
        "set -g mouse on\n"
    );
    assert!(!repo.root_path().join("inst_downloads").exists());
    assert_eq!(executor.calls().last().map(String::as_str), Some("apt autoclean"));
}

/// An interrupt inside a step maps to exit code 130 and stops the run.
#[test]
fn interrupt_stops_the_run() {
    let repo = TestContextBuilder::new().with_config(FULL).build();
    let executor = Arc::new(
        ScriptedExecutor::default()
            .on("apt", Reply::AptNoise)
            .on("snap install vlc", Reply::Interrupt),
    );
    let (ctx, log) = repo.context(executor.clone());

    let err = steps::run_fail_fast(&steps::plan(&ctx.config), &ctx).unwrap_err();

    assert_eq!(err.exit_code(), 130);
    assert!(matches!(err, ProvisionError::Interrupted { step } if step == "Install snap packages"));
    assert!(executor.calls().iter().all(|c| !c.contains("poetry")));
    assert!(log.entries().iter().any(|e| e.status == StepStatus::NotRun));
}
