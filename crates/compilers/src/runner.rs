//! Invocation of the external build tool.

use solnorm_core::error::{BuildError, Result};
use std::{
    fmt,
    io::Write,
    path::PathBuf,
    process::{Child, Command, Output, Stdio},
    sync::mpsc,
    thread,
    time::{Duration, Instant},
};

/// How often a running child is polled while waiting on a deadline.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How long output of a killed command is still collected.
const KILL_GRACE: Duration = Duration::from_millis(500);

/// A command line to run in a given directory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolchainCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
    /// Written to the child's stdin, which is then closed.
    pub stdin: Option<String>,
}

impl ToolchainCommand {
    /// Builds a command from its argv; the first element is the program.
    pub fn new<I, S>(argv: I, cwd: impl Into<PathBuf>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut argv = argv.into_iter().map(Into::into);
        let program = argv.next().unwrap_or_default();
        Self { program, args: argv.collect(), cwd: cwd.into(), stdin: None }
    }

    #[must_use]
    pub fn with_stdin(mut self, stdin: impl Into<String>) -> Self {
        self.stdin = Some(stdin.into());
        self
    }

    /// The full argv, program included.
    pub fn argv(&self) -> Vec<&str> {
        std::iter::once(self.program.as_str()).chain(self.args.iter().map(String::as_str)).collect()
    }
}

impl fmt::Display for ToolchainCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        if !self.args.is_empty() {
            write!(f, " {}", self.args.join(" "))?;
        }
        Ok(())
    }
}

/// Captured result of a finished command.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolchainOutput {
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    /// `None` if the process was terminated by a signal.
    pub exit_code: Option<i32>,
}

impl ToolchainOutput {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Turns a non-zero exit into [`BuildError::ToolchainExecutionFailed`].
    pub fn into_result(self, cmd: &ToolchainCommand) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            let reason = match self.exit_code {
                Some(code) => format!("exit code {code}"),
                None => "terminated by signal".to_string(),
            };
            Err(BuildError::toolchain(cmd.to_string(), reason, self.stderr_lossy()))
        }
    }
}

impl From<Output> for ToolchainOutput {
    fn from(output: Output) -> Self {
        Self { stdout: output.stdout, stderr: output.stderr, exit_code: output.status.code() }
    }
}

/// Runs build tool commands.
///
/// Implementations return the captured output for any exit status and only fail when the
/// command could not be run at all; callers decide what a non-zero exit means.
pub trait ToolchainRunner {
    fn run(&self, cmd: &ToolchainCommand) -> Result<ToolchainOutput>;
}

impl<T: ToolchainRunner + ?Sized> ToolchainRunner for &T {
    fn run(&self, cmd: &ToolchainCommand) -> Result<ToolchainOutput> {
        (**self).run(cmd)
    }
}

/// Runs commands as child processes of the current process.
#[derive(Clone, Debug, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Kills commands that run longer than `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    fn spawn(&self, cmd: &ToolchainCommand) -> Result<Child> {
        let mut command = Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .current_dir(&cmd.cwd)
            .stdin(if cmd.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        // a timed out command is killed with everything it started
        #[cfg(unix)]
        if self.timeout.is_some() {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }
        debug!(?command, "spawning");

        let mut child = command.spawn().map_err(|err| {
            BuildError::toolchain(cmd.to_string(), format!("failed to spawn: {err}"), "")
        })?;

        if let (Some(input), Some(mut stdin)) = (&cmd.stdin, child.stdin.take()) {
            stdin.write_all(input.as_bytes()).map_err(|err| {
                BuildError::toolchain(cmd.to_string(), format!("failed to write stdin: {err}"), "")
            })?;
            trace!("wrote stdin");
        }
        Ok(child)
    }

    fn wait(&self, cmd: &ToolchainCommand, mut child: Child) -> Result<Output> {
        let map_err =
            |err: std::io::Error| BuildError::toolchain(cmd.to_string(), err.to_string(), "");

        let Some(timeout) = self.timeout else {
            return child.wait_with_output().map_err(map_err);
        };

        // stdout and stderr are drained on separate threads so a chatty child cannot block on a
        // full pipe while we poll for its exit.
        let stdout = child.stdout.take().map(drain);
        let stderr = child.stderr.take().map(drain);
        let collect = |rx: Option<mpsc::Receiver<Vec<u8>>>| {
            rx.and_then(|rx| rx.recv().ok()).unwrap_or_default()
        };

        let deadline = Instant::now() + timeout;
        let status = loop {
            if let Some(status) = child.try_wait().map_err(map_err)? {
                break status;
            }
            if Instant::now() >= deadline {
                warn!(%cmd, ?timeout, "killing timed out command");
                #[cfg(unix)]
                kill_process_group(child.id());
                let _ = child.kill();
                let _ = child.wait();
                // descendants that escaped the group may still hold the pipes open
                let stderr =
                    stderr.and_then(|rx| rx.recv_timeout(KILL_GRACE).ok()).unwrap_or_default();
                return Err(BuildError::toolchain(
                    cmd.to_string(),
                    format!("timed out after {timeout:?}"),
                    String::from_utf8_lossy(&stderr),
                ));
            }
            thread::sleep(POLL_INTERVAL);
        };

        Ok(Output { status, stdout: collect(stdout), stderr: collect(stderr) })
    }
}

/// Reads `reader` to the end on a detached thread.
fn drain<R: std::io::Read + Send + 'static>(mut reader: R) -> mpsc::Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        let _ = tx.send(buf);
    });
    rx
}

/// Sends `SIGKILL` to the process group led by `pid`.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    let status = Command::new("kill")
        .args(["-KILL", "--", &format!("-{pid}")])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(status) if status.success() => trace!(pid, "killed process group"),
        Ok(status) => debug!(pid, %status, "could not kill process group"),
        Err(err) => debug!(pid, %err, "could not kill process group"),
    }
}

impl ToolchainRunner for ProcessRunner {
    #[instrument(name = "toolchain", level = "debug", skip_all, fields(cmd = %cmd))]
    fn run(&self, cmd: &ToolchainCommand) -> Result<ToolchainOutput> {
        let child = self.spawn(cmd)?;
        let output = self.wait(cmd, child)?;
        debug!(%output.status, "finished");
        Ok(output.into())
    }
}

#[cfg(feature = "async")]
impl ProcessRunner {
    /// Same as [`ToolchainRunner::run`] but on the tokio runtime.
    pub async fn run_async(&self, cmd: &ToolchainCommand) -> Result<ToolchainOutput> {
        use tokio::io::AsyncWriteExt;

        let mut command = tokio::process::Command::new(&cmd.program);
        command
            .args(&cmd.args)
            .current_dir(&cmd.cwd)
            .stdin(if cmd.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        debug!(?command, "spawning");

        let toolchain_err = |reason: String| BuildError::toolchain(cmd.to_string(), reason, "");
        let mut child =
            command.spawn().map_err(|err| toolchain_err(format!("failed to spawn: {err}")))?;
        if let (Some(input), Some(mut stdin)) = (&cmd.stdin, child.stdin.take()) {
            stdin
                .write_all(input.as_bytes())
                .await
                .map_err(|err| toolchain_err(format!("failed to write stdin: {err}")))?;
        }

        let output = child.wait_with_output();
        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, output)
                .await
                .map_err(|_| toolchain_err(format!("timed out after {timeout:?}")))?,
            None => output.await,
        }
        .map_err(|err| toolchain_err(err.to_string()))?;
        Ok(output.into())
    }
}
