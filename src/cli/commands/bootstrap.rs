//! The `bundlekit bootstrap` command.

use std::path::{Path, PathBuf};

use crate::bootstrap::Bootstrapper;
use crate::config::{Settings, SettingsOverrides};
use crate::error::Result;
use crate::shell::{CommandRunner, SystemRunner};
use crate::ui::UserInterface;

use super::dispatcher::{Command, CommandResult};

/// The bootstrap command implementation.
pub struct BootstrapCommand {
    project_root: PathBuf,
    overrides: SettingsOverrides,
}

impl BootstrapCommand {
    /// Create a new bootstrap command.
    pub fn new(project_root: &Path, overrides: SettingsOverrides) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            overrides,
        }
    }

    /// Execute against a specific runner.
    pub fn execute_with(
        &self,
        runner: &mut dyn CommandRunner,
        ui: &mut dyn UserInterface,
    ) -> Result<CommandResult> {
        let settings = Settings::load(&self.project_root, self.overrides.clone())?;
        tracing::debug!("Bootstrapping with {:?}", settings);

        let report = Bootstrapper::new(&settings).run(runner, ui)?;
        tracing::debug!(
            "Bootstrap finished: {} steps, {} warnings",
            report.records.len(),
            report.warnings()
        );
        Ok(CommandResult::success())
    }
}

impl Command for BootstrapCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        self.execute_with(&mut SystemRunner::new(), ui)
    }
}
