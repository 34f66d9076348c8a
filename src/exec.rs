//! Bounded, cancellable execution of shell commands.
//!
//! [`run`] spawns one `sh -c` process with its output captured through pipes,
//! waits for it in short slices so that both the timeout and the
//! [`CancelToken`] are observed promptly, and guarantees that the process is
//! killed and reaped on every exit path.
use std::borrow::Cow;
use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, mpsc};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};
use wait_timeout::ChildExt;

use crate::error::CommandError;

/// Upper bound on how long a cancellation or deadline can go unnoticed.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long to keep draining output once the process is gone.
///
/// A descendant that left the process group can hold the pipes open
/// indefinitely; after this grace period whatever was read is kept.
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Default number of bytes kept per output stream.
pub const CAPTURE_LIMIT: usize = 4 * 1024 * 1024;

/// Shared flag set when the user interrupts the run.
///
/// Cloning is cheap; all clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of any in-flight and future commands.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A shell command line with an optional timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellCommand {
    line: String,
    timeout: Option<Duration>,
    capture_limit: usize,
}

impl ShellCommand {
    /// A command with no timeout.
    #[must_use]
    pub fn new(line: impl Into<String>) -> Self {
        Self {
            line: line.into(),
            timeout: None,
            capture_limit: CAPTURE_LIMIT,
        }
    }

    /// Join `parts` with `&&` so each runs only if the previous succeeded.
    #[must_use]
    pub fn all<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parts: Vec<String> = parts.into_iter().map(|p| p.as_ref().to_string()).collect();
        Self::new(parts.join(" && "))
    }

    /// Set the timeout; `None` waits indefinitely.
    #[must_use]
    pub fn with_timeout(self, timeout: Option<Duration>) -> Self {
        Self { timeout, ..self }
    }

    /// Keep at most `limit` bytes of each output stream.
    #[must_use]
    pub fn with_capture_limit(self, limit: usize) -> Self {
        Self {
            capture_limit: limit,
            ..self
        }
    }

    /// The shell command line.
    #[must_use]
    pub fn line(&self) -> &str {
        &self.line
    }

    /// The timeout, if any.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

impl std::fmt::Display for ShellCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.line)
    }
}

/// How a command execution ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecStatus {
    /// The process exited on its own. `code` is `None` if a signal killed it.
    Completed {
        /// Exit code, if any.
        code: Option<i32>,
    },
    /// The timeout expired and the process was killed.
    TimedOut,
    /// The run was cancelled and the process was killed.
    Interrupted,
}

impl ExecStatus {
    /// Whether the process exited with code 0.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Completed { code: Some(0) })
    }
}

/// Everything captured from a single command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// The command line that was run.
    pub command: String,
    /// Captured standard output.
    pub stdout: Vec<u8>,
    /// Captured standard error.
    pub stderr: Vec<u8>,
    /// Bytes of standard output discarded past the capture limit.
    pub stdout_truncated: usize,
    /// Bytes of standard error discarded past the capture limit.
    pub stderr_truncated: usize,
    /// How the execution ended.
    pub status: ExecStatus,
    /// Time from spawn until the process was reaped.
    pub elapsed: Duration,
    /// The timeout that applied, if any.
    pub timeout: Option<Duration>,
}

impl ExecResult {
    /// Standard output decoded lossily as UTF-8.
    #[must_use]
    pub fn stdout_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stdout)
    }

    /// Standard error decoded lossily as UTF-8.
    #[must_use]
    pub fn stderr_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.stderr)
    }
}

/// Abstraction over command execution so steps can be tested without
/// spawning processes.
#[cfg_attr(test, mockall::automock)]
pub trait Executor: Send + Sync {
    /// Run a command to completion, timeout, or interruption.
    ///
    /// # Errors
    ///
    /// Returns an error if the command is empty or the process could not be
    /// spawned or waited on.
    fn run(&self, command: &ShellCommand) -> Result<ExecResult, CommandError>;

    /// Whether `program` is available on `PATH`.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] that spawns real processes.
#[derive(Debug, Clone, Default)]
pub struct SystemExecutor {
    cancel: CancelToken,
}

impl SystemExecutor {
    /// An executor whose commands are killed when `cancel` fires.
    #[must_use]
    pub const fn new(cancel: CancelToken) -> Self {
        Self { cancel }
    }
}

impl Executor for SystemExecutor {
    fn run(&self, command: &ShellCommand) -> Result<ExecResult, CommandError> {
        run(command, &self.cancel)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Owns the child process and kills and reaps it unless it was already
/// reaped.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl ChildGuard {
    /// Kill the child's process group and reap the child.
    fn terminate(&mut self) {
        kill_group(&mut self.child);
        if !self.reaped {
            self.child.wait().ok();
            self.reaped = true;
        }
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.reaped {
            self.terminate();
        }
    }
}

/// Run `command`, capturing its output.
///
/// The process is killed if its timeout expires or `cancel` fires; in both
/// cases the output captured up to that point is still returned, with status
/// [`ExecStatus::TimedOut`] or [`ExecStatus::Interrupted`]. No retries are
/// performed.
///
/// # Errors
///
/// Returns [`CommandError::Empty`] for a blank command line, and
/// [`CommandError::Spawn`] / [`CommandError::Wait`] if the OS refuses to
/// start or wait on the process. The process never outlives this call.
pub fn run(command: &ShellCommand, cancel: &CancelToken) -> Result<ExecResult, CommandError> {
    let line = command.line();
    if line.trim().is_empty() {
        return Err(CommandError::Empty);
    }

    debug!(command = line, timeout = ?command.timeout(), "spawning command");
    let started = Instant::now();
    let mut child = shell(line)
        .spawn()
        .map_err(|source| CommandError::Spawn {
            command: line.to_string(),
            source,
        })?;
    let stdout = spawn_reader(child.stdout.take(), command.capture_limit);
    let stderr = spawn_reader(child.stderr.take(), command.capture_limit);
    let mut guard = ChildGuard {
        child,
        reaped: false,
    };

    let deadline = command.timeout().map(|t| started + t);
    let status = loop {
        let slice = deadline.map_or(POLL_INTERVAL, |d| {
            d.saturating_duration_since(Instant::now())
                .min(POLL_INTERVAL)
        });
        match guard.child.wait_timeout(slice) {
            Ok(Some(exit)) => {
                guard.reaped = true;
                // Stragglers left in the group would hold the pipes open.
                kill_group(&mut guard.child);
                break ExecStatus::Completed { code: exit.code() };
            }
            Ok(None) => {}
            Err(source) => {
                return Err(CommandError::Wait {
                    command: line.to_string(),
                    source,
                });
            }
        }
        if cancel.is_cancelled() {
            warn!(command = line, "interrupted, killing command");
            guard.terminate();
            break ExecStatus::Interrupted;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            warn!(
                command = line,
                timeout_secs = command.timeout().map_or(0, |t| t.as_secs()),
                "command timed out, killing"
            );
            guard.terminate();
            break ExecStatus::TimedOut;
        }
    };
    let elapsed = started.elapsed();

    let drain_deadline = Instant::now() + DRAIN_GRACE;
    let (stdout, stdout_truncated) = collect(stdout, drain_deadline);
    let (stderr, stderr_truncated) = collect(stderr, drain_deadline);
    if stdout_truncated > 0 || stderr_truncated > 0 {
        warn!(command = line, stdout_truncated, stderr_truncated, "output truncated");
    }
    debug!(command = line, ?status, elapsed_ms = elapsed.as_millis(), "command finished");

    Ok(ExecResult {
        command: line.to_string(),
        stdout,
        stderr,
        stdout_truncated,
        stderr_truncated,
        status,
        elapsed,
        timeout: command.timeout(),
    })
}

/// Build the `sh -c` invocation for `line`, in its own process group.
fn shell(line: &str) -> Command {
    let mut cmd = if cfg!(target_family = "unix") {
        let mut c = Command::new("sh");
        c.arg("-c").arg(line);
        c
    } else {
        let mut c = Command::new("cmd");
        c.arg("/C").arg(line);
        c
    };
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt as _;
        cmd.process_group(0);
    }
    cmd
}

/// Send `SIGKILL` to the child's whole process group.
#[cfg(unix)]
fn kill_group(child: &mut Child) {
    use nix::errno::Errno;
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Ok(pid) = i32::try_from(child.id()) else {
        child.kill().ok();
        return;
    };
    if let Err(err) = killpg(Pid::from_raw(pid), Signal::SIGKILL)
        && err != Errno::ESRCH
    {
        debug!(pid, %err, "killpg failed, killing child only");
        child.kill().ok();
    }
}

#[cfg(not(unix))]
fn kill_group(child: &mut Child) {
    child.kill().ok();
}

/// Output read so far from one pipe.
#[derive(Debug, Default)]
struct Capture {
    buf: Vec<u8>,
    truncated: usize,
}

impl Capture {
    fn push(&mut self, bytes: &[u8], limit: usize) {
        let keep = bytes.len().min(limit.saturating_sub(self.buf.len()));
        let (kept, dropped) = bytes.split_at(keep);
        self.buf.extend_from_slice(kept);
        self.truncated += dropped.len();
    }
}

/// A pipe being drained on a background thread.
struct Reader {
    capture: Arc<Mutex<Capture>>,
    done: mpsc::Receiver<()>,
}

/// Drain a pipe to EOF on a background thread, keeping at most `limit`
/// bytes.
fn spawn_reader<R: Read + Send + 'static>(stream: Option<R>, limit: usize) -> Option<Reader> {
    stream.map(|mut stream| {
        let capture = Arc::new(Mutex::new(Capture::default()));
        let shared = Arc::clone(&capture);
        let (tx, done) = mpsc::channel();
        thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                let n = match stream.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => n,
                    Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                };
                let Ok(mut capture) = shared.lock() else {
                    break;
                };
                capture.push(chunk.get(..n).unwrap_or_default(), limit);
            }
            tx.send(()).ok();
        });
        Reader { capture, done }
    })
}

/// Wait until `deadline` for the reader to reach EOF, then take what it has.
///
/// A reader still blocked at the deadline is left behind; it exits once the
/// last writer closes the pipe.
fn collect(reader: Option<Reader>, deadline: Instant) -> (Vec<u8>, usize) {
    let Some(reader) = reader else {
        return (Vec::new(), 0);
    };
    let wait = deadline.saturating_duration_since(Instant::now());
    if reader.done.recv_timeout(wait).is_err() {
        debug!("output pipe still held open, keeping partial capture");
    }
    reader
        .capture
        .lock()
        .map(|mut capture| (std::mem::take(&mut capture.buf), capture.truncated))
        .unwrap_or_default()
}
