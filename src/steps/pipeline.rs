//! Sequential step execution with per-step classification.

use std::time::Instant;

use crate::bundler::Bundler;
use crate::error::Result;
use crate::shell::ToolCommand;
use crate::ui::{RunSummary, UserInterface};

use super::outcome::{StepOutcome, StepPolicy, StepRecord};

/// Runs steps in the order they are issued and keeps their records.
#[derive(Debug)]
pub struct Pipeline {
    records: Vec<StepRecord>,
    started: Instant,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    /// Create an empty pipeline.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Records of every step run so far.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Consume the pipeline, returning its records.
    pub fn into_records(self) -> Vec<StepRecord> {
        self.records
    }

    /// Run one command as a step named `name`.
    ///
    /// A spawn failure or non-zero exit is classified by `policy`: it
    /// returns `Ok(StepOutcome::Warning)` for best-effort steps and
    /// `Err(StepFailed)` for required ones, after showing the command output.
    pub fn run_command(
        &mut self,
        ui: &mut dyn UserInterface,
        bundler: &mut Bundler<'_>,
        name: &str,
        policy: StepPolicy,
        command: &ToolCommand,
    ) -> Result<StepOutcome> {
        let start = Instant::now();
        let mut spinner = ui.start_spinner(&format!("{}: {}", name, command));

        let (outcome, output) = match bundler.run(command) {
            Ok(result) if result.success => (StepOutcome::Success, result.combined_output()),
            Ok(result) => {
                let reason = match result.exit_code {
                    Some(code) => format!("exited with code {}", code),
                    None => "terminated by signal".to_string(),
                };
                (policy.on_failure(reason), result.combined_output())
            }
            Err(e) => (policy.on_failure(e.to_string()), String::new()),
        };

        match &outcome {
            StepOutcome::Success => {
                spinner.finish_success(name);
                ui.command_output(&output);
            }
            StepOutcome::Warning(reason) => {
                tracing::warn!("{} failed ({}); continuing", command, reason);
                spinner.finish_warning(&format!("{} ({}; continuing)", name, reason));
                ui.command_output(&output);
            }
            StepOutcome::Fatal(reason) => {
                tracing::debug!("{} failed ({})", command, reason);
                spinner.finish_error(&format!("{} ({})", name, reason));
                ui.show_error_block(&command.to_string(), &output, None);
            }
        }

        self.record(name, outcome.clone(), start);
        outcome.check(name)
    }

    /// Record a step that did not run a command.
    pub fn record(&mut self, name: &str, outcome: StepOutcome, start: Instant) {
        self.records.push(StepRecord {
            name: name.to_string(),
            outcome,
            duration: start.elapsed(),
        });
    }

    /// Summary of every recorded step.
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            rows: self.records.iter().map(StepRecord::summary_row).collect(),
            total_duration: self.started.elapsed(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundler::commands;
    use crate::config::Settings;
    use crate::error::BundlekitError;
    use crate::shell::{MockResponse, MockRunner};
    use crate::ui::{MockUI, OutputMode, StatusKind};

    #[test]
    fn success_is_recorded() {
        let settings = Settings::with_defaults("/srv/app");
        let mut runner = MockRunner::new();
        let mut bundler = Bundler::new(&mut runner, &settings);
        let mut ui = MockUI::new();
        let mut pipeline = Pipeline::new();

        let outcome = pipeline
            .run_command(
                &mut ui,
                &mut bundler,
                "cache",
                StepPolicy::BestEffort,
                &commands::cache_all(),
            )
            .unwrap();

        assert!(outcome.is_success());
        assert_eq!(pipeline.records().len(), 1);
        assert!(ui.spinners()[0].contains("bundle cache --all --all-platforms"));
    }

    #[test]
    fn best_effort_failure_continues_with_warning() {
        let settings = Settings::with_defaults("/srv/app");
        let mut runner = MockRunner::new();
        runner.respond("bundle lock --add-checksums", MockResponse::fail(15, "unknown option"));
        let mut bundler = Bundler::new(&mut runner, &settings);
        let mut ui = MockUI::new();
        let mut pipeline = Pipeline::new();

        let outcome = pipeline
            .run_command(
                &mut ui,
                &mut bundler,
                "add checksums",
                StepPolicy::BestEffort,
                &commands::lock_add_checksums(),
            )
            .unwrap();

        assert_eq!(outcome, StepOutcome::Warning("exited with code 15".to_string()));
        assert!(ui.has_warning("add checksums"));
        assert!(ui.error_blocks().is_empty());
    }

    #[test]
    fn best_effort_spawn_failure_is_warning() {
        let settings = Settings::with_defaults("/srv/app");
        let mut runner = MockRunner::new();
        runner.respond("bundle binstubs", MockResponse::SpawnError);
        let mut bundler = Bundler::new(&mut runner, &settings);
        let mut ui = MockUI::new();
        let mut pipeline = Pipeline::new();

        let outcome = pipeline
            .run_command(
                &mut ui,
                &mut bundler,
                "binstubs",
                StepPolicy::BestEffort,
                &commands::binstubs("bin"),
            )
            .unwrap();

        assert!(matches!(outcome, StepOutcome::Warning(_)));
    }

    #[test]
    fn required_failure_is_err_with_error_block() {
        let settings = Settings::with_defaults("/srv/app");
        let mut runner = MockRunner::new();
        runner.respond("bundle install", MockResponse::fail(6, "Could not reach rubygems.org"));
        let mut bundler = Bundler::new(&mut runner, &settings);
        let mut ui = MockUI::new();
        let mut pipeline = Pipeline::new();

        let err = pipeline
            .run_command(
                &mut ui,
                &mut bundler,
                "resolve",
                StepPolicy::Required,
                &commands::install("vendor/bundle"),
            )
            .unwrap_err();

        assert!(matches!(err, BundlekitError::StepFailed { .. }));
        assert_eq!(ui.error_blocks().len(), 1);
        assert!(ui.error_blocks()[0].1.contains("Could not reach rubygems.org"));
        assert_eq!(pipeline.summary().count(StatusKind::Failed), 1);
    }

    #[test]
    fn verbose_mode_echoes_output() {
        let settings = Settings::with_defaults("/srv/app");
        let mut runner = MockRunner::new();
        runner.respond("bundle cache", MockResponse::stdout("Updating files in vendor/cache\n"));
        let mut bundler = Bundler::new(&mut runner, &settings);
        let mut ui = MockUI::with_mode(OutputMode::Verbose);
        let mut pipeline = Pipeline::new();

        pipeline
            .run_command(
                &mut ui,
                &mut bundler,
                "cache",
                StepPolicy::BestEffort,
                &commands::cache_all(),
            )
            .unwrap();

        assert!(ui.has_raw("Updating files in vendor/cache"));
    }
}
