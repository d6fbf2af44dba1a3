//! The `bundlekit verify` command.

use std::path::{Path, PathBuf};

use crate::config::{Settings, SettingsOverrides};
use crate::error::Result;
use crate::shell::{CommandRunner, SystemRunner};
use crate::ui::{NonInteractiveUI, OutputMode, UserInterface};
use crate::verify::{VerifyReport, Verifier};

use super::dispatcher::{Command, CommandResult};

/// The verify command implementation.
pub struct VerifyCommand {
    project_root: PathBuf,
    overrides: SettingsOverrides,
    json: bool,
}

impl VerifyCommand {
    /// Create a new verify command.
    pub fn new(project_root: &Path, overrides: SettingsOverrides, json: bool) -> Self {
        Self {
            project_root: project_root.to_path_buf(),
            overrides,
            json,
        }
    }

    /// Run verification against a specific runner, returning the report.
    ///
    /// In JSON mode progress output is suppressed regardless of `ui`.
    pub fn report_with(
        &self,
        runner: &mut dyn CommandRunner,
        ui: &mut dyn UserInterface,
    ) -> Result<VerifyReport> {
        let settings = Settings::load(&self.project_root, self.overrides.clone())?;
        let verifier = Verifier::new(&settings);
        if self.json {
            verifier.run(runner, &mut NonInteractiveUI::new(OutputMode::Silent))
        } else {
            verifier.run(runner, ui)
        }
    }
}

impl Command for VerifyCommand {
    fn execute(&self, ui: &mut dyn UserInterface) -> Result<CommandResult> {
        let report = self.report_with(&mut SystemRunner::new(), ui)?;
        if self.json {
            let json = serde_json::to_string_pretty(&report).map_err(anyhow::Error::from)?;
            println!("{}", json);
        }
        Ok(CommandResult::from_exit_code(report.exit_code))
    }
}
