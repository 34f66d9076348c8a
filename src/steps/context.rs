use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::config::Config;
use crate::exec::{CancelToken, Executor};
use crate::logging::Log;
use crate::platform::Platform;

/// Shared context for step execution.
pub struct Context {
    /// Loaded configuration.
    pub config: Arc<Config>,
    /// Detected platform information.
    pub platform: Arc<Platform>,
    /// Logger for output and step recording.
    pub log: Arc<dyn Log>,
    /// Whether to perform a dry run (log commands instead of running them).
    pub dry_run: bool,
    /// Home directory that `~` and image directories resolve against.
    pub home: PathBuf,
    /// Whether the effective user is root.
    pub is_root: bool,
    /// Command executor (for testing or real system calls).
    pub executor: Arc<dyn Executor>,
    /// Set when the user interrupts the run.
    pub cancel: CancelToken,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &"<Config>")
            .field("platform", &self.platform)
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .field("home", &self.home)
            .field("is_root", &self.is_root)
            .field("executor", &"<dyn Executor>")
            .field("cancel", &self.cancel)
            .finish()
    }
}

impl Context {
    /// Creates a new context for step execution.
    ///
    /// # Errors
    ///
    /// Returns an error if the HOME environment variable is not set.
    pub fn new(
        config: Arc<Config>,
        platform: Arc<Platform>,
        log: Arc<dyn Log>,
        dry_run: bool,
        executor: Arc<dyn Executor>,
        cancel: CancelToken,
    ) -> Result<Self> {
        let home = std::env::var_os("HOME")
            .filter(|h| !h.is_empty())
            .ok_or_else(|| anyhow::anyhow!("HOME environment variable is not set"))?;

        Ok(Self {
            config,
            platform,
            log,
            dry_run,
            home: PathBuf::from(home),
            is_root: effective_user_is_root(),
            executor,
            cancel,
        })
    }

    /// Downloads directory.
    #[must_use]
    pub fn downloads_dir(&self) -> &std::path::Path {
        &self.config.downloads_dir
    }
}

#[cfg(unix)]
fn effective_user_is_root() -> bool {
    nix::unistd::geteuid().is_root()
}

#[cfg(not(unix))]
const fn effective_user_is_root() -> bool {
    false
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use crate::steps::test_helpers::{empty_config, make_context};
    use std::path::{Path, PathBuf};

    #[test]
    fn downloads_dir_comes_from_config() {
        let (ctx, _log) = make_context(empty_config(Path::new("/srv/p")));
        assert_eq!(ctx.downloads_dir(), PathBuf::from("/srv/p/inst_downloads"));
    }

    #[test]
    fn debug_format_includes_key_fields() {
        let (ctx, _log) = make_context(empty_config(Path::new("/srv/p")));
        let debug = format!("{ctx:?}");
        assert!(debug.contains("Context"));
        assert!(debug.contains("dry_run"));
        assert!(debug.contains("home"));
    }
}
