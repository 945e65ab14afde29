//! Builder and runner seam for executing external tool commands.
//!
//! [`ToolCommand`] describes an invocation; a [`ToolRunner`] executes it.
//! Production code uses [`ProcessRunner`], which spawns a real process and
//! waits for it to exit. Tests substitute their own runner to stand in for
//! ffmpeg/ffprobe.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::process::Command;
use tubely_core::{Error, Result};

/// Default command timeout: 5 minutes.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Output captured from a successful tool execution.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Captured standard output (lossy UTF-8).
    pub stdout: String,
    /// Captured standard error (lossy UTF-8).
    pub stderr: String,
}

/// A builder for constructing external tool invocations.
///
/// # Example
///
/// ```no_run
/// use tubely_av::ToolCommand;
///
/// # async fn example() -> tubely_core::Result<()> {
/// let output = ToolCommand::new("ffprobe")
///     .args(["-v", "error", "-print_format", "json", "-show_streams"])
///     .arg("/path/to/video.mp4")
///     .execute()
///     .await?;
/// println!("{}", output.stdout);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    args: Vec<OsString>,
    timeout: Duration,
}

impl ToolCommand {
    /// Create a new command for the given program path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Append a single argument.
    pub fn arg(&mut self, s: impl AsRef<OsStr>) -> &mut Self {
        self.args.push(s.as_ref().to_os_string());
        self
    }

    /// Append multiple arguments.
    pub fn args<I, S>(&mut self, iter: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(iter.into_iter().map(|s| s.as_ref().to_os_string()));
        self
    }

    /// Set the maximum execution time.
    pub fn timeout(&mut self, d: Duration) -> &mut Self {
        self.timeout = d;
        self
    }

    /// The program that will be executed.
    pub fn program(&self) -> &Path {
        &self.program
    }

    /// The arguments passed to the program.
    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    /// The configured timeout.
    pub fn get_timeout(&self) -> Duration {
        self.timeout
    }

    /// Short tool name used in error messages (`ffmpeg` for `/usr/bin/ffmpeg`).
    pub fn tool_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| self.program.to_string_lossy().to_string())
    }

    /// The command line as a single string, for logging.
    pub fn display(&self) -> String {
        let mut line = self.program.to_string_lossy().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(&arg.to_string_lossy());
        }
        line
    }

    /// Execute the command, capturing stdout and stderr.
    ///
    /// The child is killed if the timeout expires or the returned future is
    /// dropped.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Tool`] if spawning fails, the process exits with a
    /// non-zero status (message includes stderr) or the timeout expires.
    pub async fn execute(&self) -> Result<ToolOutput> {
        let tool = self.tool_name();
        tracing::debug!(command = %self.display(), "running external tool");

        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::tool(&tool, format!("failed to spawn: {e}")))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(Error::tool(
                    tool,
                    format!("I/O error waiting for process: {e}"),
                ))
            }
            Err(_elapsed) => {
                return Err(Error::tool(
                    tool,
                    format!("timed out after {:?}", self.timeout),
                ))
            }
        };

        let captured = ToolOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };

        if !output.status.success() {
            return Err(Error::tool(
                tool,
                format!(
                    "exited with status {}: {}",
                    output.status,
                    captured.stderr.trim()
                ),
            ));
        }

        Ok(captured)
    }
}

/// Executes [`ToolCommand`]s.
///
/// Implementations must wait for the tool to finish before returning and
/// must report launch failures and non-zero exits as [`Error::Tool`].
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run the command to completion and return its captured output.
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput>;
}

/// Runs commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

#[async_trait]
impl ToolRunner for ProcessRunner {
    async fn run(&self, command: &ToolCommand) -> Result<ToolOutput> {
        command.execute().await
    }
}
