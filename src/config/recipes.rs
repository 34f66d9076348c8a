use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::sanitize::{BenignNoise, Sanitizer};

/// A `[[program]]` recipe: shell commands installing one program.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProgramRecipe {
    /// Display name, used in the step label.
    pub name: String,
    /// Commands run in order; the first failure aborts the recipe.
    #[serde(default)]
    pub commands: Vec<String>,
    /// Benign diagnostics stripped from every command's error output.
    #[serde(default)]
    pub noise: Vec<BenignNoise>,
}

impl ProgramRecipe {
    /// The sanitizer for this recipe's commands.
    #[must_use]
    pub fn sanitizer(&self) -> Sanitizer {
        Sanitizer::from_noise(&self.noise)
    }
}

/// A file copied from the files directory during post-install.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileCopy {
    /// Path relative to the files directory.
    pub source: String,
    /// Destination; a leading `~` expands to the home directory.
    pub target: String,
}

/// A `[[post_install]]` recipe: configuration applied after installs.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostInstallRecipe {
    /// Display name, used in the step label.
    pub name: String,
    /// Commands run before the file copies.
    #[serde(default)]
    pub commands: Vec<String>,
    /// Files to copy.
    #[serde(default)]
    pub files: Vec<FileCopy>,
    /// Benign diagnostics stripped from every command's error output.
    #[serde(default)]
    pub noise: Vec<BenignNoise>,
}

impl PostInstallRecipe {
    /// The sanitizer for this recipe's commands.
    #[must_use]
    pub fn sanitizer(&self) -> Sanitizer {
        Sanitizer::from_noise(&self.noise)
    }
}

/// An `[[image]]` entry downloaded into the user's home directory.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Image {
    /// Source URL.
    pub url: String,
    /// File name to save as.
    pub file: String,
    /// Directory relative to the home directory.
    pub dir: String,
}

impl Image {
    /// Absolute destination path under `home`.
    #[must_use]
    pub fn destination(&self, home: &Path) -> PathBuf {
        home.join(&self.dir).join(&self.file)
    }
}

/// The `[cleanup]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Cleanup {
    /// Remove the downloads directory.
    pub remove_downloads: bool,
    /// Commands run after the downloads directory is removed.
    pub commands: Vec<String>,
    /// Benign diagnostics stripped from the commands' error output.
    pub noise: Vec<BenignNoise>,
}

impl Default for Cleanup {
    fn default() -> Self {
        Self {
            remove_downloads: true,
            commands: Vec::new(),
            noise: Vec::new(),
        }
    }
}

/// Expand a leading `~` or `~/` in `path` against `home`.
#[must_use]
pub fn expand_home(path: &str, home: &Path) -> PathBuf {
    if path == "~" {
        home.to_path_buf()
    } else if let Some(rest) = path.strip_prefix("~/") {
        home.join(rest)
    } else {
        PathBuf::from(path)
    }
}
