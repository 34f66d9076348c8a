//! Core logging types: step entries, status, and the [`Log`] trait.

/// Step execution result for summary reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepEntry {
    /// Human-readable step name.
    pub name: String,
    /// Final status of the step.
    pub status: StepStatus,
    /// Optional detail message (e.g., reason or error description).
    pub message: Option<String>,
}

/// Status of a step at the end of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    /// Step completed successfully.
    Ok,
    /// Step had nothing to do on this machine or configuration.
    NotApplicable,
    /// Step ran in dry-run mode; no changes were applied.
    DryRun,
    /// Step failed; the run stopped here.
    Failed,
    /// Step was never started because an earlier step failed.
    NotRun,
}

/// Abstraction over logging backends.
///
/// Steps log through this trait so tests can observe what a step reported
/// without a global subscriber.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a step result for the summary.
    fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_status_equality() {
        assert_eq!(StepStatus::Ok, StepStatus::Ok);
        assert_ne!(StepStatus::Ok, StepStatus::Failed);
        assert_ne!(StepStatus::NotRun, StepStatus::NotApplicable);
    }
}
