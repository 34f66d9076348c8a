//! Top-level subcommand orchestration.
/// `provision exec`: run one command and report its outcome.
pub mod exec;
/// `provision install`: run the step sequence.
pub mod install;
/// `provision list`: show the step sequence.
pub mod list;
/// `provision version`.
pub mod version;

use std::path::{Path, PathBuf};

use crate::cli::GlobalOpts;
use crate::config::{CONFIG_FILE, Config};
use crate::error::ConfigError;
use crate::logging::Logger;
use crate::platform::Platform;

/// Environment variable naming the provisioning root.
pub const ROOT_ENV: &str = "PROVISION_ROOT";

/// Shared state produced by the common command setup sequence.
#[derive(Debug)]
pub struct CommandSetup {
    /// Detected platform.
    pub platform: Platform,
    /// Loaded configuration.
    pub config: Config,
}

impl CommandSetup {
    /// Detect the platform, locate the root, and load the configuration.
    ///
    /// Validation problems are logged as warnings and do not stop the run.
    ///
    /// # Errors
    ///
    /// Returns an error if the root directory cannot be determined or the
    /// configuration file cannot be read or parsed.
    pub fn init(global: &GlobalOpts, log: &Logger) -> Result<Self, ConfigError> {
        let platform = Platform::detect();
        let root = resolve_root(global)?;
        let path = global
            .config
            .clone()
            .unwrap_or_else(|| root.join(CONFIG_FILE));

        log.stage("Loading configuration");
        log.debug(&format!("root: {}", root.display()));
        let config = Config::load(&root, &path)?;

        log.debug(&format!("{} apt packages", config.apt.packages.len()));
        log.debug(&format!("{} snap packages", config.snaps.len()));
        log.debug(&format!("{} post-install recipes", config.post_install.len()));
        log.debug(&format!("{} images", config.images.len()));
        log.info(&format!(
            "loaded {} packages, {} programs from {}",
            config.apt.packages.len() + config.snaps.len(),
            config.programs.len(),
            path.display()
        ));

        let warnings = config.validate();
        if !warnings.is_empty() {
            log.warn(&format!(
                "found {} configuration warning(s):",
                warnings.len()
            ));
            for warning in &warnings {
                log.warn(&format!(
                    "  {} [{}]: {}",
                    warning.source, warning.item, warning.message
                ));
            }
        }

        Ok(Self { platform, config })
    }
}

/// Resolve the provisioning root from CLI arguments or auto-detection.
///
/// # Errors
///
/// Returns [`ConfigError::RootNotFound`] if no candidate holds a config file.
pub fn resolve_root(global: &GlobalOpts) -> Result<PathBuf, ConfigError> {
    find_root(
        global.root.as_deref(),
        std::env::var_os(ROOT_ENV).map(PathBuf::from),
        std::env::current_exe().ok(),
        std::env::current_dir().ok(),
    )
}

/// Pick the root: an explicit `--root`, then `$PROVISION_ROOT`, then a
/// directory near the binary, then the working directory.
///
/// Auto-detected candidates must contain `conf/provision.toml`.
fn find_root(
    explicit: Option<&Path>,
    env: Option<PathBuf>,
    exe: Option<PathBuf>,
    cwd: Option<PathBuf>,
) -> Result<PathBuf, ConfigError> {
    if let Some(root) = explicit {
        return Ok(root.to_path_buf());
    }
    if let Some(root) = env.filter(|r| !r.as_os_str().is_empty()) {
        return Ok(root);
    }

    let has_config = |dir: &Path| dir.join(CONFIG_FILE).is_file();

    if let Some(parent) = exe.as_deref().and_then(Path::parent) {
        // target/release/ or bin/
        for candidate in [parent.join("../.."), parent.join("..")] {
            if has_config(&candidate)
                && let Ok(root) = dunce::canonicalize(&candidate)
            {
                return Ok(root);
            }
        }
    }

    cwd.filter(|dir| has_config(dir))
        .ok_or(ConfigError::RootNotFound)
}
