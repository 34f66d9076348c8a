//! Domain-specific error types for the provisioning engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Internal modules return typed errors (e.g., [`CommandError`],
//! [`ConfigError`]) while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ProvisionError
//! ├── Config(ConfigError)             — config file I/O, parsing, root discovery
//! ├── Platform(PlatformError)         — unsupported OS / distribution
//! ├── Installation(InstallationError) — a step failed (step name + cause)
//! └── Interrupted { step }            — user interrupt during a step
//! ```
//!
//! [`CommandError`] is produced by the command runner and travels inside a
//! step's `anyhow` error chain until the orchestrator classifies it.

use std::time::Duration;

use thiserror::Error;

/// Top-level error type for the provisioning engine.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// Configuration-related error (parsing, validation, I/O).
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The current machine is not a supported provisioning target.
    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    /// A provisioning step failed; the remaining steps were not run.
    #[error(transparent)]
    Installation(#[from] InstallationError),

    /// The run was interrupted by the user while a step was executing.
    #[error("interrupted during '{step}'")]
    Interrupted {
        /// Name of the step that was executing.
        step: String,
    },
}

impl ProvisionError {
    /// Process exit code for this error: `130` for interrupts, `1` otherwise.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Interrupted { .. } => 130,
            _ => 1,
        }
    }
}

/// A genuine step failure, carrying the step label and a readable cause.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Step '{step}' failed: {cause}")]
pub struct InstallationError {
    /// Name of the step that failed.
    pub step: String,
    /// Human-readable reason for the failure.
    pub cause: String,
}

/// Why a command that ran to an end is considered failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureCause {
    /// The command exceeded its timeout and was killed.
    TimedOut(Duration),
    /// The command exited with a non-zero code, or was killed by a signal
    /// (`None`).
    AbnormalExit {
        /// Exit code, if the process exited normally.
        code: Option<i32>,
        /// Residual error output after sanitization (may be empty).
        stderr: String,
    },
    /// The command exited successfully but left genuine error output behind.
    ErrorOutput(String),
}

impl std::fmt::Display for FailureCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TimedOut(timeout) => write!(f, "timed out after {}s", timeout.as_secs()),
            Self::AbnormalExit { code, stderr } => {
                match code {
                    Some(code) => write!(f, "exit {code}")?,
                    None => write!(f, "killed by signal")?,
                }
                if stderr.is_empty() {
                    Ok(())
                } else {
                    write!(f, ": {stderr}")
                }
            }
            Self::ErrorOutput(stderr) => f.write_str(stderr),
        }
    }
}

/// Errors raised by the command runner and its classification.
#[derive(Error, Debug)]
pub enum CommandError {
    /// The command line was empty or whitespace only.
    #[error("empty command")]
    Empty,

    /// The shell process could not be spawned.
    #[error("failed to execute `{command}`: {source}")]
    Spawn {
        /// The command line.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Waiting on the child process failed.
    #[error("failed waiting for `{command}`: {source}")]
    Wait {
        /// The command line.
        command: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The user interrupted the run; the child has already been killed.
    #[error("`{command}` interrupted")]
    Interrupted {
        /// The command line.
        command: String,
    },

    /// The command ran but its outcome was a failure.
    #[error("`{command}` failed ({cause})")]
    Failed {
        /// The command line.
        command: String,
        /// Classified reason.
        cause: FailureCause,
    },
}

impl CommandError {
    /// Whether this error is a user interrupt.
    #[must_use]
    pub const fn is_interrupted(&self) -> bool {
        matches!(self, Self::Interrupted { .. })
    }
}

/// Errors that arise from configuration loading.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The config file contains invalid TOML or an invalid value.
    #[error("Invalid config in {file}: {message}")]
    InvalidSyntax {
        /// Path of the offending file.
        file: String,
        /// Parser message.
        message: String,
    },

    /// An I/O error occurred while reading a config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// No provisioning root could be located.
    #[error("cannot determine provisioning root. Use --root or set PROVISION_ROOT env var")]
    RootNotFound,
}

/// Errors that arise from platform detection.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The machine is not a supported provisioning target.
    #[error("unsupported machine: {0}")]
    Unsupported(String),
}
