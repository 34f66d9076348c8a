// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed provisioning root, a fluent builder
// for its configuration, and a scripted executor that records every command
// line instead of running it.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use provision_cli::config::Config;
use provision_cli::error::CommandError;
use provision_cli::exec::{CancelToken, ExecResult, ExecStatus, Executor, ShellCommand};
use provision_cli::logging::{Log, Logger};
use provision_cli::platform::Platform;
use provision_cli::sanitize::APT_CLI_WARNING;
use provision_cli::steps::Context;

/// An isolated provisioning root backed by a [`tempfile::TempDir`].
pub struct IntegrationTestContext {
    /// Temporary directory containing `conf/` and `files/`.
    pub root: tempfile::TempDir,
    /// Temporary directory used as `$HOME`.
    pub home: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Path to the provisioning root.
    pub fn root_path(&self) -> &Path {
        self.root.path()
    }

    /// Load `conf/provision.toml` from the root.
    pub fn load_config(&self) -> Config {
        let path = self.root.path().join(provision_cli::config::CONFIG_FILE);
        Config::load(self.root.path(), &path).expect("load config")
    }

    /// A root, non-dry-run step context using `executor`.
    pub fn context(&self, executor: Arc<dyn Executor>) -> (Context, Arc<Logger>) {
        let log = Arc::new(Logger::with_log_file(None));
        let ctx = Context {
            config: Arc::new(self.load_config()),
            platform: Arc::new(Platform::from_sources(
                "ID=ubuntu\nPRETTY_NAME=\"Ubuntu 24.04 LTS\"\n",
                "Linux version 6.8.0-40-generic",
            )),
            log: Arc::clone(&log) as Arc<dyn Log>,
            dry_run: false,
            home: self.home.path().to_path_buf(),
            is_root: true,
            executor,
            cancel: CancelToken::new(),
        };
        (ctx, log)
    }
}

/// Fluent builder for [`IntegrationTestContext`].
pub struct TestContextBuilder {
    ctx: IntegrationTestContext,
}

impl TestContextBuilder {
    /// Begin building with an empty `conf/provision.toml`.
    pub fn new() -> Self {
        let root = tempfile::tempdir().expect("create temp dir");
        let home = tempfile::tempdir().expect("create home dir");
        std::fs::create_dir_all(root.path().join("conf")).expect("create conf dir");
        std::fs::create_dir_all(root.path().join("files")).expect("create files dir");
        std::fs::write(root.path().join("conf/provision.toml"), "").expect("write config");
        Self {
            ctx: IntegrationTestContext { root, home },
        }
    }

    /// Replace `conf/provision.toml` with `content`.
    pub fn with_config(self, content: &str) -> Self {
        let path = self.ctx.root.path().join("conf/provision.toml");
        std::fs::write(path, content).expect("write config file");
        self
    }

    /// Create `files/<source>` with `content`.
    pub fn with_file(self, source: &str, content: &str) -> Self {
        let path = self.ctx.root.path().join("files").join(source);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create file parent");
        }
        std::fs::write(&path, content).expect("write source file");
        self
    }

    /// Finish building and return the configured context.
    pub fn build(self) -> IntegrationTestContext {
        self.ctx
    }
}

/// How the scripted executor answers a command.
#[derive(Clone, Copy)]
pub enum Reply {
    /// Exit 0 with apt's CLI warning on stderr.
    AptNoise,
    /// Exit with `code` and `stderr`.
    Fail(i32, &'static str),
    /// Report an interrupt.
    Interrupt,
}

/// Executor that records command lines and answers from a script.
///
/// Commands with no matching rule succeed silently.
#[derive(Default)]
pub struct ScriptedExecutor {
    rules: Vec<(String, Reply)>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedExecutor {
    /// Answer commands containing `needle` with `reply`.
    pub fn on(mut self, needle: &str, reply: Reply) -> Self {
        self.rules.push((needle.to_string(), reply));
        self
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

impl Executor for ScriptedExecutor {
    fn run(&self, command: &ShellCommand) -> Result<ExecResult, CommandError> {
        let line = command.line().to_string();
        self.calls.lock().expect("calls lock").push(line.clone());

        let reply = self
            .rules
            .iter()
            .find(|(needle, _)| line.contains(needle.as_str()))
            .map(|(_, reply)| *reply);
        let (status, stderr) = match reply {
            None => (ExecStatus::Completed { code: Some(0) }, Vec::new()),
            Some(Reply::AptNoise) => (ExecStatus::Completed { code: Some(0) }, APT_CLI_WARNING.to_vec()),
            Some(Reply::Fail(code, stderr)) => {
                (ExecStatus::Completed { code: Some(code) }, stderr.as_bytes().to_vec())
            }
            Some(Reply::Interrupt) => (ExecStatus::Interrupted, Vec::new()),
        };
        Ok(ExecResult {
            command: line,
            stdout: Vec::new(),
            stderr,
            stdout_truncated: 0,
            stderr_truncated: 0,
            status,
            elapsed: Duration::ZERO,
            timeout: command.timeout(),
        })
    }

    fn which(&self, _program: &str) -> bool {
        true
    }
}
