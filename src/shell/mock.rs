//! Mock command runner for testing.
//!
//! `MockRunner` implements [`CommandRunner`] without spawning anything. It
//! answers each command with a scripted response chosen by command-line
//! prefix and records every invocation for later assertion.
//!
//! # Example
//!
//! ```
//! use bundlekit::shell::{CommandRunner, MockResponse, MockRunner, ToolCommand};
//!
//! let mut runner = MockRunner::new();
//! runner.respond("bundle list --paths", MockResponse::stdout("/app/vendor/bundle/rack\n"));
//!
//! let cmd = ToolCommand::new("bundle").args(["list", "--paths"]);
//! let result = runner.run(&cmd).unwrap();
//!
//! assert!(result.success);
//! assert!(runner.was_run("bundle list"));
//! ```

use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{BundlekitError, Result};

use super::command::{CommandResult, CommandRunner, ToolCommand};

/// A scripted answer to a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockResponse {
    /// The process ran and exited with `code`.
    Exit {
        code: i32,
        stdout: String,
        stderr: String,
    },
    /// The process could not be started (e.g. not on `PATH`).
    SpawnError,
}

impl MockResponse {
    /// Exit 0 with no output.
    pub fn ok() -> Self {
        Self::stdout("")
    }

    /// Exit 0 with the given stdout.
    pub fn stdout(stdout: &str) -> Self {
        Self::Exit {
            code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    /// Exit non-zero with the given stderr.
    pub fn fail(code: i32, stderr: &str) -> Self {
        Self::Exit {
            code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    fn to_result(&self, command: &ToolCommand) -> Result<CommandResult> {
        match self {
            Self::Exit {
                code: 0,
                stdout,
                stderr,
            } => Ok(CommandResult::success(
                stdout.clone(),
                stderr.clone(),
                Duration::ZERO,
            )),
            Self::Exit {
                code,
                stdout,
                stderr,
            } => Ok(CommandResult::failure(
                Some(*code),
                stdout.clone(),
                stderr.clone(),
                Duration::ZERO,
            )),
            Self::SpawnError => Err(BundlekitError::CommandFailed {
                command: command.command_line(),
                code: None,
            }),
        }
    }
}

/// Mock runner that records invocations.
///
/// Queued responses (via [`queue`](Self::queue)) are consumed first, in
/// order; after a queue is exhausted the persistent response for the same
/// prefix (via [`respond`](Self::respond)) applies. When several prefixes
/// match, the longest wins. Unmatched commands succeed with empty output.
#[derive(Debug, Default)]
pub struct MockRunner {
    responses: Vec<(String, MockResponse)>,
    queues: Vec<(String, VecDeque<MockResponse>)>,
    invocations: Vec<ToolCommand>,
}

impl MockRunner {
    /// Create a runner where every command succeeds silently.
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer every command starting with `prefix` with `response`.
    pub fn respond(&mut self, prefix: &str, response: MockResponse) {
        self.responses.retain(|(p, _)| p != prefix);
        self.responses.push((prefix.to_string(), response));
    }

    /// Answer successive commands starting with `prefix` with `responses`.
    pub fn queue(&mut self, prefix: &str, responses: Vec<MockResponse>) {
        self.queues.retain(|(p, _)| p != prefix);
        self.queues
            .push((prefix.to_string(), responses.into_iter().collect()));
    }

    /// All commands run so far, in order.
    pub fn invocations(&self) -> &[ToolCommand] {
        &self.invocations
    }

    /// Command lines of all commands run so far, in order.
    pub fn command_lines(&self) -> Vec<String> {
        self.invocations.iter().map(|c| c.command_line()).collect()
    }

    /// Whether any command line started with `prefix`.
    pub fn was_run(&self, prefix: &str) -> bool {
        self.count(prefix) > 0
    }

    /// Number of command lines that started with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.invocations
            .iter()
            .filter(|c| c.command_line().starts_with(prefix))
            .count()
    }

    fn take_queued(&mut self, line: &str) -> Option<MockResponse> {
        self.queues
            .iter_mut()
            .filter(|(prefix, queue)| line.starts_with(prefix.as_str()) && !queue.is_empty())
            .max_by_key(|(prefix, _)| prefix.len())
            .and_then(|(_, queue)| queue.pop_front())
    }

    fn persistent(&self, line: &str) -> Option<MockResponse> {
        self.responses
            .iter()
            .filter(|(prefix, _)| line.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, response)| response.clone())
    }
}

impl CommandRunner for MockRunner {
    fn run(&mut self, command: &ToolCommand) -> Result<CommandResult> {
        let line = command.command_line();
        self.invocations.push(command.clone());

        let response = self
            .take_queued(&line)
            .or_else(|| self.persistent(&line))
            .unwrap_or_else(MockResponse::ok);

        response.to_result(command)
    }
}
