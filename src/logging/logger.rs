//! Structured logger with dry-run awareness and summary collection.
use std::path::PathBuf;
use std::sync::Mutex;

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Log, StepEntry, StepStatus};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Structured logger with dry-run awareness and summary collection.
///
/// Messages go through [`tracing`]; the subscriber installed by
/// [`init_subscriber`](super::subscriber::init_subscriber) also appends them
/// to `$XDG_CACHE_HOME/provision/<command>.log`.
#[derive(Debug)]
pub struct Logger {
    steps: Mutex<Vec<StepEntry>>,
    log_file: Option<PathBuf>,
}

impl Logger {
    /// Create a logger for `command`.
    ///
    /// Stores the log file path for display in the run summary; the file
    /// itself is written by the subscriber's file layer.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self::with_log_file(log_file_path(command))
    }

    /// Create a logger that reports `log_file` in its summary.
    #[must_use]
    pub const fn with_log_file(log_file: Option<PathBuf>) -> Self {
        Self {
            steps: Mutex::new(Vec::new()),
            log_file,
        }
    }

    /// Return the log file path, if available.
    #[must_use]
    pub const fn log_path(&self) -> Option<&PathBuf> {
        self.log_file.as_ref()
    }

    /// Return a clone of all recorded step entries, in record order.
    #[must_use]
    pub fn entries(&self) -> Vec<StepEntry> {
        self.steps.lock().map_or_else(|_| vec![], |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header (major section).
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (suppressed on console unless verbose; always
    /// written to the log file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log a dry-run action message.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record a step result for the summary.
    pub fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.steps.lock() {
            guard.push(StepEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Count the number of failed steps.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.steps.lock().map_or(0, |guard| {
            guard
                .iter()
                .filter(|s| s.status == StepStatus::Failed)
                .count()
        })
    }

    /// Print the summary of all recorded steps.
    pub fn print_summary(&self) {
        let steps = self.entries();
        if steps.is_empty() {
            return;
        }

        self.stage("Summary");

        let mut ok = 0u32;
        let mut not_applicable = 0u32;
        let mut dry_run = 0u32;
        let mut failed = 0u32;
        let mut not_run = 0u32;

        for step in &steps {
            let (icon, color) = match step.status {
                StepStatus::Ok => {
                    ok += 1;
                    ("✓", "\x1b[32m")
                }
                StepStatus::NotApplicable => {
                    not_applicable += 1;
                    ("·", "\x1b[2m")
                }
                StepStatus::DryRun => {
                    dry_run += 1;
                    ("~", "\x1b[37m")
                }
                StepStatus::Failed => {
                    failed += 1;
                    ("✗", "\x1b[31m")
                }
                StepStatus::NotRun => {
                    not_run += 1;
                    ("○", "\x1b[33m")
                }
            };

            let suffix = step
                .message
                .as_ref()
                .map_or_else(String::new, |msg| format!(" ({msg})"));

            self.info(&format!("{color}{icon} {}{suffix}\x1b[0m", step.name));
        }

        let total = ok + not_applicable + dry_run + failed + not_run;
        self.info(&format!(
            "{total} steps: \x1b[32m{ok} ok\x1b[0m, \x1b[2m{not_applicable} n/a\x1b[0m, \x1b[37m{dry_run} dry-run\x1b[0m, \x1b[31m{failed} failed\x1b[0m, \x1b[33m{not_run} not run\x1b[0m"
        ));

        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record_step(&self, name: &str, status: StepStatus, message: Option<&str>) {
        self.record_step(name, status, message);
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::isolated_logger;
    use std::fs;

    #[test]
    fn logger_new() {
        let (log, _tmp, _guard) = isolated_logger();
        assert!(log.entries().is_empty(), "expected empty step list");
    }

    #[test]
    fn record_step_with_message() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_step("Install apt packages", StepStatus::Failed, Some("exit 100"));
        let entries = log.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "Install apt packages");
        assert_eq!(entries[0].message, Some("exit 100".to_string()));
    }

    #[test]
    fn failure_count_returns_correct_count() {
        let (log, _tmp, _guard) = isolated_logger();
        assert_eq!(log.failure_count(), 0);
        log.record_step("a", StepStatus::Ok, None);
        log.record_step("b", StepStatus::Failed, Some("error"));
        log.record_step("c", StepStatus::NotRun, None);
        assert_eq!(log.failure_count(), 1);
    }

    #[test]
    fn log_trait_delegates_to_logger() {
        let (log, _tmp, _guard) = isolated_logger();
        let log_ref: &dyn Log = &log;
        log_ref.record_step("via-trait", StepStatus::Ok, None);
        assert_eq!(log.entries().len(), 1);
    }

    #[test]
    fn messages_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        let marker = format!("marker-{}", std::process::id());
        log.debug(&format!("debug-{marker}"));
        log.warn(&format!("warn-{marker}"));
        log.error(&format!("error-{marker}"));
        log.dry_run(&format!("dry-{marker}"));
        log.stage(&format!("stage-{marker}"));
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains(&format!("[debug] debug-{marker}")));
        assert!(contents.contains(&format!("[warn] warn-{marker}")));
        assert!(contents.contains(&format!("[error] error-{marker}")));
        assert!(contents.contains(&format!("[dry run] dry-{marker}")));
        assert!(contents.contains(&format!("==> stage-{marker}")));
    }

    #[test]
    fn summary_written_to_file() {
        let (log, _tmp, _guard) = isolated_logger();
        log.record_step("Check platform", StepStatus::Ok, None);
        log.record_step("Install apt packages", StepStatus::Failed, Some("boom"));
        log.record_step("Clean up", StepStatus::NotRun, None);
        log.print_summary();
        let contents = fs::read_to_string(log.log_path().expect("log path")).unwrap();
        assert!(contents.contains("==> Summary"));
        assert!(contents.contains("✓ Check platform"));
        assert!(contents.contains("✗ Install apt packages (boom)"));
        assert!(contents.contains("○ Clean up"));
        assert!(contents.contains("3 steps: 1 ok, 0 n/a, 0 dry-run, 1 failed, 1 not run"));
    }
}
