//! External command execution.
//!
//! Commands are spawned directly (no intermediate shell) with stdout and
//! stderr captured. Every invocation goes through the [`CommandRunner`]
//! trait so that pipelines can be driven by [`MockRunner`](super::MockRunner)
//! in tests.

use crate::error::{BundlekitError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

/// A program invocation: executable, arguments, working directory and
/// environment overlay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    /// Executable name or path, looked up on `PATH`.
    pub program: String,

    /// Arguments, passed through verbatim.
    pub args: Vec<String>,

    /// Working directory (inherits the current one if `None`).
    pub cwd: Option<PathBuf>,

    /// Environment variables set on top of the inherited environment.
    pub env: BTreeMap<String, String>,
}

impl ToolCommand {
    /// Create a command for `program` with no arguments.
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: BTreeMap::new(),
        }
    }

    /// Append one argument.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Append several arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Merge an environment overlay.
    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    /// The command line as a single string (`program arg1 arg2`).
    pub fn command_line(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Result of executing a command.
#[derive(Debug, Clone)]
pub struct CommandResult {
    /// Exit code (None if killed by signal).
    pub exit_code: Option<i32>,

    /// Standard output.
    pub stdout: String,

    /// Standard error.
    pub stderr: String,

    /// Execution duration.
    pub duration: Duration,

    /// Whether command succeeded (exit code 0).
    pub success: bool,
}

impl CommandResult {
    /// Create a success result.
    pub fn success(stdout: String, stderr: String, duration: Duration) -> Self {
        Self {
            exit_code: Some(0),
            stdout,
            stderr,
            duration,
            success: true,
        }
    }

    /// Create a failure result.
    pub fn failure(
        exit_code: Option<i32>,
        stdout: String,
        stderr: String,
        duration: Duration,
    ) -> Self {
        Self {
            exit_code,
            stdout,
            stderr,
            duration,
            success: false,
        }
    }

    /// Stdout followed by stderr, for error display.
    pub fn combined_output(&self) -> String {
        match (self.stdout.trim_end(), self.stderr.trim_end()) {
            ("", err) => err.to_string(),
            (out, "") => out.to_string(),
            (out, err) => format!("{}\n{}", out, err),
        }
    }

    /// Convert a non-zero exit into [`BundlekitError::CommandFailed`].
    pub fn into_checked(self, command: &ToolCommand) -> Result<Self> {
        if self.success {
            Ok(self)
        } else {
            Err(BundlekitError::CommandFailed {
                command: command.command_line(),
                code: self.exit_code,
            })
        }
    }
}

/// Executes [`ToolCommand`]s.
pub trait CommandRunner {
    /// Run a command to completion.
    ///
    /// Returns `Err` only when the process could not be started; a non-zero
    /// exit is reported through [`CommandResult::success`].
    fn run(&mut self, command: &ToolCommand) -> Result<CommandResult>;
}

/// Runs commands as real child processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    /// Create a new system runner.
    pub fn new() -> Self {
        Self
    }
}

impl CommandRunner for SystemRunner {
    fn run(&mut self, command: &ToolCommand) -> Result<CommandResult> {
        tracing::debug!("Running: {}", command);
        let start = Instant::now();

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args);

        if let Some(cwd) = &command.cwd {
            cmd.current_dir(cwd);
        }

        for (key, value) in &command.env {
            cmd.env(key, value);
        }

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        let output = cmd.output().map_err(|e| {
            tracing::debug!("Failed to spawn {}: {}", command.program, e);
            BundlekitError::CommandFailed {
                command: command.command_line(),
                code: None,
            }
        })?;

        let duration = start.elapsed();
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        tracing::debug!(
            "{} exited with {:?} after {:?}",
            command.program,
            output.status.code(),
            duration
        );

        if output.status.success() {
            Ok(CommandResult::success(stdout, stderr, duration))
        } else {
            Ok(CommandResult::failure(
                output.status.code(),
                stdout,
                stderr,
                duration,
            ))
        }
    }
}
