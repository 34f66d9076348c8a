use std::fmt;

/// Linux distribution family, as far as provisioning cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Distro {
    /// Ubuntu, or a derivative that declares `ID_LIKE=ubuntu`.
    Ubuntu,
    /// Debian, or another Debian derivative.
    Debian,
    /// Anything without apt.
    Other,
}

impl fmt::Display for Distro {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ubuntu => write!(f, "ubuntu"),
            Self::Debian => write!(f, "debian"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Whether the kernel is Linux.
    pub is_linux: bool,
    /// Detected distribution family.
    pub distro: Distro,
    /// Whether running under WSL2.
    pub is_wsl2: bool,
    /// Pretty name for messages, e.g. `Ubuntu 24.04 LTS`.
    pub name: String,
}

impl Platform {
    /// Detect the current platform.
    #[must_use]
    pub fn detect() -> Self {
        if !cfg!(target_os = "linux") {
            return Self {
                is_linux: false,
                distro: Distro::Other,
                is_wsl2: false,
                name: std::env::consts::OS.to_string(),
            };
        }
        let os_release = std::fs::read_to_string("/etc/os-release").unwrap_or_default();
        let kernel = std::fs::read_to_string("/proc/version").unwrap_or_default();
        Self::from_sources(&os_release, &kernel)
    }

    /// Build platform information from the contents of `/etc/os-release`
    /// and `/proc/version`.
    #[must_use]
    pub fn from_sources(os_release: &str, kernel: &str) -> Self {
        let field = |key: &str| {
            os_release.lines().find_map(|line| {
                line.strip_prefix(key)
                    .and_then(|rest| rest.strip_prefix('='))
                    .map(|v| v.trim().trim_matches('"').to_lowercase())
            })
        };
        let id = field("ID").unwrap_or_default();
        let like = field("ID_LIKE").unwrap_or_default();
        let like: Vec<&str> = like.split_whitespace().collect();

        let distro = if id == "ubuntu" || like.contains(&"ubuntu") {
            Distro::Ubuntu
        } else if id == "debian" || like.contains(&"debian") {
            Distro::Debian
        } else {
            Distro::Other
        };

        let kernel = kernel.to_lowercase();
        // WSL1 kernels are built by Microsoft@Microsoft.com and say nothing of WSL2.
        let is_wsl2 = kernel.contains("wsl2")
            || (kernel.contains("microsoft") && !kernel.contains("microsoft@microsoft.com"));

        let name = os_release
            .lines()
            .find_map(|l| l.strip_prefix("PRETTY_NAME="))
            .map_or_else(|| id.clone(), |v| v.trim().trim_matches('"').to_string());

        Self {
            is_linux: true,
            distro,
            is_wsl2,
            name: if name.is_empty() { "linux".to_string() } else { name },
        }
    }

    /// Whether this machine can be provisioned (a Linux with apt).
    #[must_use]
    pub fn is_supported(&self) -> bool {
        self.is_linux && self.distro != Distro::Other
    }

    /// Short description used in log messages.
    #[must_use]
    pub fn describe(&self) -> String {
        if self.is_wsl2 {
            format!("{} (WSL2)", self.name)
        } else {
            self.name.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UBUNTU: &str = "PRETTY_NAME=\"Ubuntu 24.04 LTS\"\nNAME=\"Ubuntu\"\nID=ubuntu\nID_LIKE=debian\n";
    const MINT: &str = "NAME=\"Linux Mint\"\nID=linuxmint\nID_LIKE=\"ubuntu debian\"\n";
    const DEBIAN: &str = "PRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"\nID=debian\n";
    const ARCH: &str = "NAME=\"Arch Linux\"\nID=arch\n";
    const KERNEL: &str = "Linux version 6.8.0-40-generic (buildd@lcy02-amd64-075) (gcc 13.2.0)";
    const WSL_KERNEL: &str =
        "Linux version 5.15.153.1-microsoft-standard-WSL2 (root@941d701f84f1) (gcc 11.2.0)";

    #[test]
    fn detect_does_not_panic() {
        let p = Platform::detect();
        assert!(!p.name.is_empty());
    }

    #[test]
    fn ubuntu_is_supported() {
        let p = Platform::from_sources(UBUNTU, KERNEL);
        assert_eq!(p.distro, Distro::Ubuntu);
        assert!(!p.is_wsl2);
        assert!(p.is_supported());
        assert_eq!(p.describe(), "Ubuntu 24.04 LTS");
    }

    #[test]
    fn ubuntu_derivative_is_ubuntu() {
        let p = Platform::from_sources(MINT, KERNEL);
        assert_eq!(p.distro, Distro::Ubuntu);
        assert_eq!(p.name, "linuxmint");
    }

    #[test]
    fn debian_is_supported() {
        let p = Platform::from_sources(DEBIAN, KERNEL);
        assert_eq!(p.distro, Distro::Debian);
        assert!(p.is_supported());
    }

    #[test]
    fn arch_is_not_supported() {
        let p = Platform::from_sources(ARCH, KERNEL);
        assert_eq!(p.distro, Distro::Other);
        assert!(!p.is_supported());
    }

    #[test]
    fn wsl2_kernel_is_detected() {
        let p = Platform::from_sources(UBUNTU, WSL_KERNEL);
        assert!(p.is_wsl2);
        assert_eq!(p.describe(), "Ubuntu 24.04 LTS (WSL2)");
    }

    #[test]
    fn missing_os_release_is_unsupported() {
        let p = Platform::from_sources("", KERNEL);
        assert_eq!(p.distro, Distro::Other);
        assert_eq!(p.name, "linux");
        assert!(!p.is_supported());
    }

    #[test]
    fn distro_display() {
        assert_eq!(Distro::Ubuntu.to_string(), "ubuntu");
        assert_eq!(Distro::Debian.to_string(), "debian");
    }
}
