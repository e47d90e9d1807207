//! Spawning jbang and relaying its result.
//!
//! Every entry point resolves the launcher first, then builds the argument
//! vector, so a missing jbang is reported before the arguments are looked at
//! and no process is spawned.

use crate::args;
use crate::error::{JbangError, Result};
use crate::locator::{self, Launcher};
use serde::Serialize;
use std::ffi::OsStr;
use std::io::{self, Read};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Output of a captured jbang run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Runs jbang through a resolved [`Launcher`].
#[derive(Debug, Clone)]
pub struct Invoker {
    launcher: Launcher,
    timeout: Option<Duration>,
}

impl Invoker {
    /// Invoker using the process-wide launcher.
    ///
    /// # Errors
    ///
    /// Returns [`JbangError::ExecutableNotFound`] when jbang can't be located.
    pub fn new() -> Result<Self> {
        Ok(Self::with_launcher(locator::resolve()?.clone()))
    }

    #[must_use]
    pub fn with_launcher(launcher: Launcher) -> Self {
        Self {
            launcher,
            timeout: None,
        }
    }

    /// Kill jbang and fail with [`JbangError::Timeout`] if it runs longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn launcher(&self) -> &Launcher {
        &self.launcher
    }

    /// The full argument vector for `tokens`, rendered as one quoted line for logs.
    #[must_use]
    pub fn command_line<S: AsRef<OsStr>>(&self, tokens: &[S]) -> String {
        let argv: Vec<String> = self
            .launcher
            .argv(tokens)
            .iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect();
        args::quote(&argv)
    }

    /// Build the [`Command`] for `tokens` without spawning it.
    #[must_use]
    pub fn command<S: AsRef<OsStr>>(&self, tokens: &[S]) -> Command {
        let argv = self.launcher.argv(tokens);
        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..]);
        cmd
    }

    /// Word-split `line` and run jbang with the resulting tokens, inheriting
    /// the caller's standard streams.
    ///
    /// An empty line runs jbang with no arguments.
    ///
    /// # Errors
    ///
    /// [`JbangError::ArgumentParse`] for an unterminated quote,
    /// [`JbangError::ExternalProcess`] when jbang exits non-zero,
    /// [`JbangError::Timeout`] and [`JbangError::Io`] as for [`Invoker::invoke_args`].
    pub fn invoke(&self, line: &str) -> Result<()> {
        debug!("try to execute sync command: {line:?}");
        let tokens = args::split(line)?;
        self.invoke_args(&tokens)
    }

    /// Run jbang with `tokens` taken verbatim, inheriting the caller's standard streams.
    ///
    /// # Errors
    ///
    /// [`JbangError::ExternalProcess`] when jbang exits non-zero,
    /// [`JbangError::Timeout`] when the timeout elapses,
    /// [`JbangError::Io`] when the process can't be spawned or waited on.
    pub fn invoke_args<S: AsRef<OsStr>>(&self, tokens: &[S]) -> Result<()> {
        debug!("spawning sync command: '{}'", self.command_line(tokens));

        let mut child = self
            .command(tokens)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()?;

        let status = self.wait(&mut child)?;
        check_status(status, None)
    }

    /// Word-split `line`, run jbang and capture its output.
    ///
    /// # Errors
    ///
    /// As for [`Invoker::exec_args`], plus [`JbangError::ArgumentParse`].
    pub fn exec(&self, line: &str) -> Result<CommandOutput> {
        debug!("try to execute command: {line:?}");
        let tokens = args::split(line)?;
        self.exec_args(&tokens)
    }

    /// Run jbang with `tokens` taken verbatim and capture stdout and stderr.
    ///
    /// Standard input is closed. On a non-zero exit the captured output is
    /// attached to the [`JbangError::ExternalProcess`] error. On a timeout,
    /// whatever was read before the kill is attached to [`JbangError::Timeout`].
    ///
    /// # Errors
    ///
    /// [`JbangError::ExternalProcess`], [`JbangError::Timeout`] or [`JbangError::Io`].
    pub fn exec_args<S: AsRef<OsStr>>(&self, tokens: &[S]) -> Result<CommandOutput> {
        debug!("executing command: '{}'", self.command_line(tokens));

        let mut child = self
            .command(tokens)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let stdout = child.stdout.take().map(|pipe| Capture::start("stdout", pipe));
        let stderr = child.stderr.take().map(|pipe| Capture::start("stderr", pipe));

        let status = match self.wait(&mut child) {
            // A grandchild may still hold the pipes open, so take what has
            // arrived so far instead of joining the readers.
            Err(JbangError::Timeout { after, .. }) => {
                return Err(JbangError::Timeout {
                    after,
                    output: Some(CommandOutput {
                        stdout: Capture::snapshot_of(stdout.as_ref()),
                        stderr: Capture::snapshot_of(stderr.as_ref()),
                        exit_code: None,
                    }),
                });
            }
            other => other?,
        };

        let output = CommandOutput {
            stdout: Capture::finish(stdout),
            stderr: Capture::finish(stderr),
            exit_code: status.code(),
        };
        check_status(status, Some(output.clone()))?;
        Ok(output)
    }

    fn wait(&self, child: &mut Child) -> Result<ExitStatus> {
        let Some(timeout) = self.timeout else {
            return Ok(child.wait()?);
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status);
            }
            let now = Instant::now();
            if now >= deadline {
                warn!("jbang still running after {timeout:?}, killing pid {}", child.id());
                if let Err(e) = child.kill() {
                    debug!("failed to kill jbang: {e}");
                }
                if let Err(e) = child.wait() {
                    debug!("failed to reap jbang: {e}");
                }
                return Err(JbangError::Timeout {
                    after: timeout,
                    output: None,
                });
            }
            thread::sleep(POLL_INTERVAL.min(deadline - now));
        }
    }
}

/// A pipe drained on its own thread into a shared buffer.
///
/// Both pipes are drained concurrently so a chatty child can't block on a
/// full pipe while the other one is waited on.
struct Capture {
    buf: Arc<Mutex<Vec<u8>>>,
    reader: thread::JoinHandle<()>,
}

impl Capture {
    fn start<R: Read + Send + 'static>(name: &'static str, mut pipe: R) -> Self {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&buf);
        let reader = thread::spawn(move || {
            let mut chunk = [0u8; 8192];
            loop {
                match pipe.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(n) => sink
                        .lock()
                        .unwrap_or_else(PoisonError::into_inner)
                        .extend_from_slice(&chunk[..n]),
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                    Err(e) => {
                        debug!("reading jbang {name} failed: {e}");
                        break;
                    }
                }
            }
        });
        Self { buf, reader }
    }

    fn snapshot(&self) -> String {
        let bytes = self.buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    fn snapshot_of(capture: Option<&Self>) -> String {
        capture.map(Self::snapshot).unwrap_or_default()
    }

    /// Wait for the pipe to close and return everything read from it.
    fn finish(capture: Option<Self>) -> String {
        let Some(capture) = capture else {
            return String::new();
        };
        let Capture { buf, reader } = capture;
        if reader.join().is_err() {
            debug!("jbang output reader panicked");
        }
        let bytes = buf.lock().unwrap_or_else(PoisonError::into_inner);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

fn check_status(status: ExitStatus, output: Option<CommandOutput>) -> Result<()> {
    if status.success() {
        return Ok(());
    }
    debug!("jbang failed with status: {status}");
    Err(JbangError::ExternalProcess {
        code: status.code(),
        signal: terminating_signal(status),
        output,
    })
}

#[cfg(unix)]
fn terminating_signal(status: ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn terminating_signal(_status: ExitStatus) -> Option<i32> {
    None
}

/// Run jbang with a shell-style argument string, inheriting standard streams.
///
/// Uses the process-wide launcher, resolved on first use.
///
/// # Errors
///
/// See [`Invoker::invoke`]; also [`JbangError::ExecutableNotFound`].
pub fn invoke(line: &str) -> Result<()> {
    Invoker::new()?.invoke(line)
}

/// Run jbang with an argument list, inheriting standard streams.
///
/// # Errors
///
/// See [`Invoker::invoke_args`]; also [`JbangError::ExecutableNotFound`].
pub fn invoke_args<S: AsRef<OsStr>>(tokens: &[S]) -> Result<()> {
    Invoker::new()?.invoke_args(tokens)
}

/// Run jbang with a shell-style argument string and capture its output.
///
/// # Errors
///
/// See [`Invoker::exec`]; also [`JbangError::ExecutableNotFound`].
pub fn exec(line: &str) -> Result<CommandOutput> {
    Invoker::new()?.exec(line)
}

/// Run jbang with an argument list and capture its output.
///
/// # Errors
///
/// See [`Invoker::exec_args`]; also [`JbangError::ExecutableNotFound`].
pub fn exec_args<S: AsRef<OsStr>>(tokens: &[S]) -> Result<CommandOutput> {
    Invoker::new()?.exec_args(tokens)
}
