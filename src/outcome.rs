//! Classification of command results into success or failure.
use crate::error::{CommandError, FailureCause};
use crate::exec::{ExecResult, ExecStatus};
use crate::sanitize::Sanitizer;

/// The classified result of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Clean exit with no error output.
    Success,
    /// Clean exit whose error output was entirely benign noise.
    SuccessWithBenignNoise,
    /// The command failed.
    Failure(FailureCause),
}

impl Outcome {
    /// Classify `result`, sanitizing its error output first when a
    /// sanitizer is given.
    ///
    /// A command fails if it timed out, exited abnormally, or left non-empty
    /// error output after sanitization.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::Interrupted`] if the run was interrupted.
    pub fn classify(
        result: &ExecResult,
        sanitizer: Option<&Sanitizer>,
    ) -> Result<Self, CommandError> {
        let residual = match sanitizer {
            Some(s) => s.sanitize(&result.stderr),
            None if result.stderr.is_empty() => None,
            None => Some(result.stderr.clone()),
        };
        let residual_text = residual
            .as_deref()
            .map(|r| String::from_utf8_lossy(r).trim_end().to_string());

        let outcome = match result.status {
            ExecStatus::Interrupted => {
                return Err(CommandError::Interrupted {
                    command: result.command.clone(),
                });
            }
            ExecStatus::TimedOut => {
                Self::Failure(FailureCause::TimedOut(result.timeout.unwrap_or_default()))
            }
            ExecStatus::Completed { code } if code != Some(0) => {
                Self::Failure(FailureCause::AbnormalExit {
                    code,
                    stderr: residual_text.unwrap_or_default(),
                })
            }
            ExecStatus::Completed { .. } => match residual_text {
                Some(text) => Self::Failure(FailureCause::ErrorOutput(text)),
                None if result.stderr.is_empty() => Self::Success,
                None => Self::SuccessWithBenignNoise,
            },
        };
        Ok(outcome)
    }

    /// Whether the outcome counts as success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        !matches!(self, Self::Failure(_))
    }

    /// Convert a failure into a [`CommandError::Failed`] for `command`.
    ///
    /// # Errors
    ///
    /// Returns the failure cause wrapped in [`CommandError::Failed`].
    pub fn into_result(self, command: &str) -> Result<Self, CommandError> {
        match self {
            Self::Failure(cause) => Err(CommandError::Failed {
                command: command.to_string(),
                cause,
            }),
            other => Ok(other),
        }
    }
}
