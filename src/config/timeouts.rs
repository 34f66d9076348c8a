use serde::Deserialize;
use std::time::Duration;

/// A timeout in whole seconds, or no timeout at all (`"none"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "RawTimeout")]
pub struct Timeout(Option<Duration>);

impl Timeout {
    /// No timeout.
    pub const NONE: Self = Self(None);

    /// A timeout of `secs` seconds.
    #[must_use]
    pub const fn secs(secs: u64) -> Self {
        Self(Some(Duration::from_secs(secs)))
    }

    /// The duration, or `None` for no timeout.
    #[must_use]
    pub const fn get(self) -> Option<Duration> {
        self.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimeout {
    Secs(u64),
    Word(String),
}

impl TryFrom<RawTimeout> for Timeout {
    type Error = String;

    fn try_from(raw: RawTimeout) -> Result<Self, Self::Error> {
        match raw {
            RawTimeout::Secs(secs) => Ok(Self::secs(secs)),
            RawTimeout::Word(word) if word.eq_ignore_ascii_case("none") => Ok(Self::NONE),
            RawTimeout::Word(word) => Err(format!(
                "invalid timeout '{word}': expected seconds or \"none\""
            )),
        }
    }
}

/// Per-phase command timeouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    /// Commands not covered by a more specific phase.
    pub default: Timeout,
    /// apt and snap package installs.
    pub packages: Timeout,
    /// Program recipes.
    pub programs: Timeout,
    /// Post-install recipes.
    pub post_install: Timeout,
    /// Image downloads.
    pub downloads: Timeout,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            default: Timeout::NONE,
            packages: Timeout::secs(30),
            programs: Timeout::secs(30),
            post_install: Timeout::secs(15),
            downloads: Timeout::secs(30),
        }
    }
}
