use serde::Deserialize;

/// The `[apt]` table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AptConfig {
    /// Run `apt update -y` before installing.
    pub update: bool,
    /// Packages installed one at a time with `apt install -y`.
    pub packages: Vec<String>,
}

/// A `[[snap]]` entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SnapPackage {
    /// Snap name.
    pub name: String,
    /// Install with `--classic` confinement.
    #[serde(default)]
    pub classic: bool,
}

impl SnapPackage {
    /// The `snap install` command line for this package.
    #[must_use]
    pub fn install_command(&self) -> String {
        if self.classic {
            format!("snap install {} --classic", self.name)
        } else {
            format!("snap install {}", self.name)
        }
    }
}

/// Order snaps for installation: classic packages first, each group in
/// declared order.
#[must_use]
pub fn install_order(snaps: &[SnapPackage]) -> Vec<&SnapPackage> {
    let (classic, strict): (Vec<_>, Vec<_>) = snaps.iter().partition(|s| s.classic);
    classic.into_iter().chain(strict).collect()
}
