use std::collections::HashSet;
use std::path::Path;

use super::packages::{AptConfig, SnapPackage};
use super::recipes::{Image, PostInstallRecipe, ProgramRecipe};

/// A validation warning detected during configuration loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    /// The configuration section (e.g., "apt", "program").
    pub source: String,
    /// The specific item that triggered the warning.
    pub item: String,
    /// Human-readable warning message.
    pub message: String,
}

impl ValidationWarning {
    /// Create a warning.
    #[must_use]
    pub fn new(
        source: impl Into<String>,
        item: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            item: item.into(),
            message: message.into(),
        }
    }
}

/// Trait for configuration validators.
///
/// Validators never fail loading; they report suspicious entries that would
/// make a step fail or do nothing at run time.
pub trait ConfigValidator {
    /// Validate the configuration and return any warnings found.
    ///
    /// `files_dir` is the resolved directory post-install file sources are
    /// read from.
    fn validate(&self, files_dir: &Path) -> Vec<ValidationWarning>;
}

/// Validator for `[apt]` and `[[snap]]`.
#[derive(Debug)]
pub struct PackageValidator<'a> {
    apt: &'a AptConfig,
    snaps: &'a [SnapPackage],
}

impl<'a> PackageValidator<'a> {
    /// Validate the given package lists.
    #[must_use]
    pub const fn new(apt: &'a AptConfig, snaps: &'a [SnapPackage]) -> Self {
        Self { apt, snaps }
    }
}

impl ConfigValidator for PackageValidator<'_> {
    fn validate(&self, _files_dir: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        let mut seen = HashSet::new();
        for package in &self.apt.packages {
            if package.trim().is_empty() {
                warnings.push(ValidationWarning::new("apt", package, "package name is empty"));
            } else if package.split_whitespace().count() > 1 {
                warnings.push(ValidationWarning::new(
                    "apt",
                    package,
                    "package name contains whitespace",
                ));
            }
            if !seen.insert(package.as_str()) {
                warnings.push(ValidationWarning::new("apt", package, "duplicate package"));
            }
        }

        let mut seen = HashSet::new();
        for snap in self.snaps {
            if snap.name.trim().is_empty() {
                warnings.push(ValidationWarning::new("snap", &snap.name, "snap name is empty"));
            }
            if !seen.insert(snap.name.as_str()) {
                warnings.push(ValidationWarning::new("snap", &snap.name, "duplicate snap"));
            }
        }

        warnings
    }
}

/// Validator for `[[program]]` and `[[post_install]]` recipes.
#[derive(Debug)]
pub struct RecipeValidator<'a> {
    programs: &'a [ProgramRecipe],
    post_install: &'a [PostInstallRecipe],
}

impl<'a> RecipeValidator<'a> {
    /// Validate the given recipes.
    #[must_use]
    pub const fn new(programs: &'a [ProgramRecipe], post_install: &'a [PostInstallRecipe]) -> Self {
        Self {
            programs,
            post_install,
        }
    }
}

impl ConfigValidator for RecipeValidator<'_> {
    fn validate(&self, files_dir: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        let mut seen = HashSet::new();
        for recipe in self.programs {
            if !seen.insert(recipe.name.as_str()) {
                warnings.push(ValidationWarning::new("program", &recipe.name, "duplicate recipe name"));
            }
            if recipe.commands.is_empty() {
                warnings.push(ValidationWarning::new("program", &recipe.name, "recipe has no commands"));
            }
            if recipe.commands.iter().any(|c| c.trim().is_empty()) {
                warnings.push(ValidationWarning::new("program", &recipe.name, "recipe has an empty command"));
            }
        }

        let mut seen = HashSet::new();
        for recipe in self.post_install {
            if !seen.insert(recipe.name.as_str()) {
                warnings.push(ValidationWarning::new(
                    "post_install",
                    &recipe.name,
                    "duplicate recipe name",
                ));
            }
            if recipe.commands.is_empty() && recipe.files.is_empty() {
                warnings.push(ValidationWarning::new(
                    "post_install",
                    &recipe.name,
                    "recipe has no commands and no files",
                ));
            }
            for file in &recipe.files {
                let source = files_dir.join(&file.source);
                if !source.exists() {
                    warnings.push(ValidationWarning::new(
                        "post_install",
                        &recipe.name,
                        format!("source file does not exist: {}", source.display()),
                    ));
                }
                if Path::new(&file.source).is_absolute() {
                    warnings.push(ValidationWarning::new(
                        "post_install",
                        &recipe.name,
                        "source path should be relative to the files directory",
                    ));
                }
            }
        }

        warnings
    }
}

/// Validator for `[[image]]` entries.
#[derive(Debug)]
pub struct ImageValidator<'a> {
    images: &'a [Image],
}

impl<'a> ImageValidator<'a> {
    /// Validate the given images.
    #[must_use]
    pub const fn new(images: &'a [Image]) -> Self {
        Self { images }
    }
}

impl ConfigValidator for ImageValidator<'_> {
    fn validate(&self, _files_dir: &Path) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();
        for image in self.images {
            if image.url.trim().is_empty() {
                warnings.push(ValidationWarning::new("image", &image.file, "image URL is empty"));
            }
            if image.file.trim().is_empty() || image.file.contains('/') {
                warnings.push(ValidationWarning::new(
                    "image",
                    &image.url,
                    "image file must be a plain file name",
                ));
            }
            if Path::new(&image.dir).is_absolute() {
                warnings.push(ValidationWarning::new(
                    "image",
                    &image.file,
                    "image dir should be relative to the home directory",
                ));
            }
        }
        warnings
    }
}
