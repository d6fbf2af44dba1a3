//! Typed facade over the Bundler CLI.
//!
//! [`commands`] builds argument vectors; [`Bundler`] runs them in the
//! project directory with the configured environment overlay.

pub mod commands;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::error::Result;
use crate::shell::{CommandResult, CommandRunner, ToolCommand};

pub use commands::PROBE_NOT_LOADABLE;

/// Runs tool commands in a project directory.
pub struct Bundler<'r> {
    runner: &'r mut dyn CommandRunner,
    cwd: PathBuf,
    env: BTreeMap<String, String>,
}

impl<'r> Bundler<'r> {
    /// Create a facade for the project described by `settings`.
    pub fn new(runner: &'r mut dyn CommandRunner, settings: &Settings) -> Self {
        Self {
            runner,
            cwd: settings.project_root.clone(),
            env: settings.bundler_env(),
        }
    }

    /// Working directory of every command.
    pub fn cwd(&self) -> &Path {
        &self.cwd
    }

    /// Current environment overlay.
    pub fn env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Add variables to the overlay for all later commands.
    pub fn export(&mut self, vars: BTreeMap<String, String>) {
        for (key, value) in &vars {
            tracing::debug!("export {}={}", key, value);
        }
        self.env.extend(vars);
    }

    /// The command as it will actually be run.
    pub fn prepare(&self, command: &ToolCommand) -> ToolCommand {
        command.clone().cwd(&self.cwd).envs(&self.env)
    }

    /// Run a command; a non-zero exit is not an error.
    pub fn run(&mut self, command: &ToolCommand) -> Result<CommandResult> {
        let prepared = self.prepare(command);
        self.runner.run(&prepared)
    }

    /// Run a command; a non-zero exit becomes
    /// [`CommandFailed`](crate::error::BundlekitError::CommandFailed).
    pub fn run_checked(&mut self, command: &ToolCommand) -> Result<CommandResult> {
        self.run(command)?.into_checked(command)
    }

    /// First line of a version command's stdout, if it ran.
    pub fn version_of(&mut self, command: &ToolCommand) -> Option<String> {
        match self.run(command) {
            Ok(result) if result.success => result
                .stdout
                .lines()
                .next()
                .map(|l| l.trim().to_string())
                .filter(|l| !l.is_empty()),
            Ok(_) | Err(_) => None,
        }
    }
}
