//! Subprocess invocation.
//!
//! Every external program the harness touches (build tool, compiler under
//! test, native compiler, linked test program) is started here. Each launch
//! names its working directory explicitly and may carry a deadline; the
//! result keeps "could not start" apart from "ran and failed".
//!
//! A deadline covers the whole step: the child's exit and the close of every
//! captured pipe. On Unix a child with a deadline leads its own process
//! group, so a timeout also kills anything it left running in the background.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

/// How often a child with a deadline is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// What happens to one of the child's output streams.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Stream {
    /// Send to the null device.
    #[default]
    Discard,
    /// Collect into the result.
    Capture,
    /// Share the harness's own stream.
    Inherit,
}

impl Stream {
    fn to_stdio(self) -> Stdio {
        match self {
            Stream::Discard => Stdio::null(),
            Stream::Capture => Stdio::piped(),
            Stream::Inherit => Stdio::inherit(),
        }
    }
}

/// A program invocation with an explicit working directory.
#[derive(Clone, Debug)]
pub struct Invocation {
    program: OsString,
    args: Vec<OsString>,
    cwd: PathBuf,
    stdout: Stream,
    stderr: Stream,
    timeout: Option<Duration>,
}

impl Invocation {
    /// Invoke `program` with `cwd` as its working directory.
    ///
    /// Both output streams default to [`Stream::Discard`] and there is no
    /// deadline.
    pub fn new(program: impl AsRef<OsStr>, cwd: impl Into<PathBuf>) -> Self {
        Invocation {
            program: program.as_ref().to_owned(),
            args: Vec::new(),
            cwd: cwd.into(),
            stdout: Stream::Discard,
            stderr: Stream::Discard,
            timeout: None,
        }
    }

    #[must_use]
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_owned());
        self
    }

    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_owned()));
        self
    }

    #[must_use]
    pub fn stdout(mut self, stream: Stream) -> Self {
        self.stdout = stream;
        self
    }

    #[must_use]
    pub fn stderr(mut self, stream: Stream) -> Self {
        self.stderr = stream;
        self
    }

    #[must_use]
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run to completion, to the deadline, or to a launch failure.
    pub fn run(&self) -> ProcessResult {
        let start = Instant::now();
        let deadline = self.timeout.map(|timeout| start + timeout);

        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(self.stdout.to_stdio())
            .stderr(self.stderr.to_stdio());
        #[cfg(unix)]
        if deadline.is_some() {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = match command.spawn() {
            Ok(child) => child,
            Err(error) => return ProcessResult::LaunchFailed { error },
        };
        let own_group = cfg!(unix) && deadline.is_some();

        // Drain pipes on their own threads so a chatty child cannot block on a
        // full pipe while we poll for the deadline.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);

        let status = match wait_until(&mut child, deadline) {
            Ok(Some(status)) => status,
            Ok(None) => {
                terminate(&mut child, own_group);
                return ProcessResult::TimedOut {
                    elapsed: start.elapsed(),
                };
            }
            Err(error) => {
                terminate(&mut child, own_group);
                return ProcessResult::LaunchFailed { error };
            }
        };

        // A background grandchild can hold a pipe open after the child exits.
        match (collect(stdout, deadline), collect(stderr, deadline)) {
            (Some(stdout), Some(stderr)) => ProcessResult::Completed {
                status,
                stdout,
                stderr,
                elapsed: start.elapsed(),
            },
            // Readers are left detached; they finish once the group is gone.
            _ => {
                terminate(&mut child, own_group);
                ProcessResult::TimedOut {
                    elapsed: start.elapsed(),
                }
            }
        }
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.to_string_lossy())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// How an [`Invocation`] ended.
#[derive(Debug)]
pub enum ProcessResult {
    /// The process ran and exited (successfully or not).
    Completed {
        status: ExitStatus,
        stdout: Vec<u8>,
        stderr: Vec<u8>,
        elapsed: Duration,
    },
    /// The process could not be started or waited on.
    LaunchFailed { error: io::Error },
    /// The deadline passed and the process was killed.
    TimedOut { elapsed: Duration },
}

impl ProcessResult {
    /// Exit code of a completed process; `None` for signals and non-completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ProcessResult::Completed { status, .. } => status.code(),
            _ => None,
        }
    }
}

fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        // A read error truncates the capture; the exit status still decides.
        let _ = pipe.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// Wait for a drained pipe to close. `None` means the deadline passed first.
fn collect(reader: Option<Receiver<Vec<u8>>>, deadline: Option<Instant>) -> Option<Vec<u8>> {
    let Some(reader) = reader else {
        return Some(Vec::new());
    };
    let Some(deadline) = deadline else {
        return Some(reader.recv().unwrap_or_default());
    };

    match reader.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(buf) => Some(buf),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => Some(Vec::new()),
    }
}

fn wait_until(child: &mut Child, deadline: Option<Instant>) -> io::Result<Option<ExitStatus>> {
    let Some(deadline) = deadline else {
        return child.wait().map(Some);
    };

    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        let now = Instant::now();
        if now >= deadline {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(deadline - now));
    }
}

/// Kill the child, and its whole process group when it leads one.
fn terminate(child: &mut Child, own_group: bool) {
    if own_group {
        #[cfg(unix)]
        if let Err(e) = kill_group(child.id()) {
            tracing::debug!("failed to kill process group: {e}");
        }
    }
    if let Err(e) = child.kill() {
        tracing::debug!("failed to kill child process: {e}");
    }
    // Reap so the child does not linger as a zombie.
    let _ = child.wait();
}

#[cfg(unix)]
fn kill_group(pid: u32) -> nix::Result<()> {
    use nix::errno::Errno;
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    let pgid = i32::try_from(pid).map_err(|_| Errno::EINVAL)?;
    killpg(Pid::from_raw(pgid), Signal::SIGKILL)
}
