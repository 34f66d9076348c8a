//! Loading and validation of `conf/provision.toml`.
/// `[apt]` and `[[snap]]` package lists.
pub mod packages;
/// Program, post-install, image, and cleanup recipes.
pub mod recipes;
/// Per-phase command timeouts.
pub mod timeouts;
pub mod toml_loader;
/// Non-fatal configuration checks.
pub mod validation;

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use packages::{AptConfig, SnapPackage};
use recipes::{Cleanup, Image, PostInstallRecipe, ProgramRecipe};
use timeouts::Timeouts;
use validation::{
    ConfigValidator, ImageValidator, PackageValidator, RecipeValidator, ValidationWarning,
};

/// Config file location relative to the provisioning root.
pub const CONFIG_FILE: &str = "conf/provision.toml";

/// On-disk shape of `conf/provision.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    downloads_dir: Option<PathBuf>,
    files_dir: Option<PathBuf>,
    timeouts: Timeouts,
    apt: AptConfig,
    #[serde(rename = "snap")]
    snaps: Vec<SnapPackage>,
    #[serde(rename = "program")]
    programs: Vec<ProgramRecipe>,
    post_install: Vec<PostInstallRecipe>,
    #[serde(rename = "image")]
    images: Vec<Image>,
    cleanup: Cleanup,
}

/// All loaded configuration, with directories resolved against the root.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provisioning root directory.
    pub root: PathBuf,
    /// Scratch directory for downloads, removed during cleanup.
    pub downloads_dir: PathBuf,
    /// Source directory for post-install file copies.
    pub files_dir: PathBuf,
    /// Per-phase command timeouts.
    pub timeouts: Timeouts,
    /// apt packages.
    pub apt: AptConfig,
    /// snap packages, in declared order.
    pub snaps: Vec<SnapPackage>,
    /// Program recipes, in declared order.
    pub programs: Vec<ProgramRecipe>,
    /// Post-install recipes, in declared order.
    pub post_install: Vec<PostInstallRecipe>,
    /// Images to download.
    pub images: Vec<Image>,
    /// Cleanup settings.
    pub cleanup: Cleanup,
}

impl Config {
    /// Load the configuration at `path`, resolving relative directories
    /// against `root`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(root: &Path, path: &Path) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml_loader::load_config(path)?;
        Ok(Self::from_file(root, file))
    }

    /// Parse configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error if `content` is not a valid configuration.
    pub fn parse(root: &Path, content: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml_loader::parse_config(content, CONFIG_FILE)?;
        Ok(Self::from_file(root, file))
    }

    fn from_file(root: &Path, file: ConfigFile) -> Self {
        let resolve = |dir: Option<PathBuf>, default: &str| {
            let dir = dir.unwrap_or_else(|| PathBuf::from(default));
            if dir.is_absolute() { dir } else { root.join(dir) }
        };
        Self {
            root: root.to_path_buf(),
            downloads_dir: resolve(file.downloads_dir, "inst_downloads"),
            files_dir: resolve(file.files_dir, "files"),
            timeouts: file.timeouts,
            apt: file.apt,
            snaps: file.snaps,
            programs: file.programs,
            post_install: file.post_install,
            images: file.images,
            cleanup: file.cleanup,
        }
    }

    /// Substitute `{downloads}` and `{files}` in a command line.
    #[must_use]
    pub fn expand(&self, command: &str) -> String {
        command
            .replace("{downloads}", &self.downloads_dir.display().to_string())
            .replace("{files}", &self.files_dir.display().to_string())
    }

    /// Run every validator and collect their warnings.
    #[must_use]
    pub fn validate(&self) -> Vec<ValidationWarning> {
        let validators: [&dyn ConfigValidator; 3] = [
            &PackageValidator::new(&self.apt, &self.snaps),
            &RecipeValidator::new(&self.programs, &self.post_install),
            &ImageValidator::new(&self.images),
        ];
        validators
            .iter()
            .flat_map(|v| v.validate(&self.files_dir))
            .collect()
    }
}
