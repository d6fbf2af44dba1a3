//! Vendored dependency bootstrap.
//!
//! [`Bootstrapper`] turns a project with a `Gemfile` into a fully vendored,
//! offline-installable bundle: resolve if needed, widen the lockfile, cache
//! every gem archive, then install from the cache alone. If the local install
//! fails, it fetches from the network exactly once, re-caches and retries.

use std::path::PathBuf;
use std::time::Instant;

use crate::bundler::{commands, Bundler};
use crate::config::Settings;
use crate::error::{BundlekitError, Result};
use crate::shell::{CommandRunner, ToolCommand};
use crate::steps::{Pipeline, StepOutcome, StepPolicy, StepRecord};
use crate::ui::UserInterface;

/// Steps of the bootstrap pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapStep {
    Resolve,
    AddPlatforms,
    AddChecksums,
    Cache,
    DeploymentFlags,
    LocalInstall,
    NetworkInstall,
    Recache,
    RetryLocalInstall,
    Binstubs,
}

impl BootstrapStep {
    /// Name shown in progress lines and the summary.
    pub fn name(self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::AddPlatforms => "add platforms",
            Self::AddChecksums => "add checksums",
            Self::Cache => "cache",
            Self::DeploymentFlags => "deployment flags",
            Self::LocalInstall => "local install",
            Self::NetworkInstall => "network install",
            Self::Recache => "recache",
            Self::RetryLocalInstall => "local install (retry)",
            Self::Binstubs => "binstubs",
        }
    }

    /// How a failure of this step is treated.
    pub fn policy(self) -> StepPolicy {
        match self {
            Self::Resolve
            | Self::NetworkInstall
            | Self::Recache
            | Self::RetryLocalInstall
            | Self::DeploymentFlags => StepPolicy::Required,
            // The first local install is retried rather than fatal.
            Self::LocalInstall
            | Self::AddPlatforms
            | Self::AddChecksums
            | Self::Cache
            | Self::Binstubs => StepPolicy::BestEffort,
        }
    }

    /// The command this step runs, if any.
    pub fn command(self, settings: &Settings) -> Option<ToolCommand> {
        let path = settings.bundle_path.as_str();
        match self {
            Self::Resolve | Self::NetworkInstall => Some(commands::install(path)),
            Self::AddPlatforms => Some(commands::lock_add_platforms(&settings.platforms)),
            Self::AddChecksums => Some(commands::lock_add_checksums()),
            Self::Cache | Self::Recache => Some(commands::cache_all()),
            Self::LocalInstall | Self::RetryLocalInstall => Some(commands::install_local(path)),
            Self::Binstubs => Some(commands::binstubs(&settings.bundle_bin)),
            Self::DeploymentFlags => None,
        }
    }
}

/// What a successful bootstrap did.
#[derive(Debug, Clone)]
pub struct BootstrapReport {
    /// Absolute install root.
    pub install_root: PathBuf,
    /// Every step that ran, in order.
    pub records: Vec<StepRecord>,
    /// Whether an initial resolve created the lockfile.
    pub resolved: bool,
    /// Whether the network fallback ran.
    pub repaired_cache: bool,
}

impl BootstrapReport {
    /// Number of best-effort steps that failed.
    pub fn warnings(&self) -> usize {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, StepOutcome::Warning(_)))
            .count()
    }
}

/// Runs the bootstrap pipeline for one project.
pub struct Bootstrapper<'a> {
    settings: &'a Settings,
}

impl<'a> Bootstrapper<'a> {
    /// Create a bootstrapper for `settings`.
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Run the full pipeline.
    ///
    /// A missing `Gemfile` is reported before any output or command. Required
    /// step failures return [`BundlekitError::StepFailed`].
    pub fn run(
        &self,
        runner: &mut dyn CommandRunner,
        ui: &mut dyn UserInterface,
    ) -> Result<BootstrapReport> {
        let settings = self.settings;

        if !settings.manifest_path().is_file() {
            return Err(BundlekitError::ManifestNotFound {
                dir: settings.project_root.clone(),
            });
        }

        let mut bundler = Bundler::new(runner, settings);
        let mut pipeline = Pipeline::new();

        ui.show_header("bundlekit bootstrap");
        ui.message(&format!(
            "Working directory: {}",
            settings.project_root.display()
        ));
        let ruby = bundler
            .version_of(&commands::ruby_version())
            .unwrap_or_else(|| "ruby not found".to_string());
        ui.message(&format!("Ruby version: {}", ruby));
        let bundle = bundler
            .version_of(&commands::bundler_version())
            .unwrap_or_else(|| "bundler not found".to_string());
        ui.message(&format!("Bundler version: {}", bundle));

        let resolved = !settings.lockfile_path().is_file();
        if resolved {
            ui.message("No Gemfile.lock found. Performing initial resolve to create lockfile...");
            self.step(&mut pipeline, ui, &mut bundler, BootstrapStep::Resolve)?;
        }

        self.step(&mut pipeline, ui, &mut bundler, BootstrapStep::AddPlatforms)?;
        self.step(&mut pipeline, ui, &mut bundler, BootstrapStep::AddChecksums)?;
        self.step(&mut pipeline, ui, &mut bundler, BootstrapStep::Cache)?;

        let start = Instant::now();
        bundler.export(settings.deployment_env());
        pipeline.record(
            BootstrapStep::DeploymentFlags.name(),
            StepOutcome::Success,
            start,
        );

        let local = self.step(&mut pipeline, ui, &mut bundler, BootstrapStep::LocalInstall)?;
        let repaired_cache = !local.is_success();
        if repaired_cache {
            ui.message(
                "Local cache incomplete. Fetching from network once, then caching and retrying...",
            );
            for step in [
                BootstrapStep::NetworkInstall,
                BootstrapStep::Recache,
                BootstrapStep::RetryLocalInstall,
            ] {
                self.step(&mut pipeline, ui, &mut bundler, step)?;
            }
        }

        self.step(&mut pipeline, ui, &mut bundler, BootstrapStep::Binstubs)?;

        let install_root = settings.install_root();
        ui.show_summary(&pipeline.summary());
        ui.success(&format!(
            "Bootstrap complete. Gems installed under: {}",
            install_root.display()
        ));

        Ok(BootstrapReport {
            install_root,
            records: pipeline.into_records(),
            resolved,
            repaired_cache,
        })
    }

    fn step(
        &self,
        pipeline: &mut Pipeline,
        ui: &mut dyn UserInterface,
        bundler: &mut Bundler<'_>,
        step: BootstrapStep,
    ) -> Result<StepOutcome> {
        match step.command(self.settings) {
            Some(command) => pipeline.run_command(ui, bundler, step.name(), step.policy(), &command),
            None => Ok(StepOutcome::Success),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SettingsOverrides;
    use crate::shell::{MockResponse, MockRunner};
    use crate::ui::{MockUI, StatusKind};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn project(with_lockfile: bool) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("Gemfile"), "source \"https://rubygems.org\"\n").unwrap();
        if with_lockfile {
            fs::write(temp.path().join("Gemfile.lock"), "GEM\n").unwrap();
        }
        temp
    }

    fn settings_for(dir: &Path) -> Settings {
        Settings::with_defaults(dir)
    }

    #[test]
    fn missing_manifest_runs_nothing_and_prints_nothing() {
        let temp = TempDir::new().unwrap();
        let settings = settings_for(temp.path());
        let mut runner = MockRunner::new();
        let mut ui = MockUI::new();

        let err = Bootstrapper::new(&settings)
            .run(&mut runner, &mut ui)
            .unwrap_err();

        assert!(matches!(err, BundlekitError::ManifestNotFound { .. }));
        assert!(err.to_string().starts_with("Gemfile not found in"));
        assert!(runner.invocations().is_empty());
        assert_eq!(ui.line_count(), 0);
    }

    #[test]
    fn full_sequence_without_lockfile() {
        let temp = project(false);
        let settings = settings_for(temp.path());
        let mut runner = MockRunner::new();
        let mut ui = MockUI::new();

        let report = Bootstrapper::new(&settings).run(&mut runner, &mut ui).unwrap();

        assert!(report.resolved);
        assert!(!report.repaired_cache);
        assert_eq!(
            runner.command_lines(),
            vec![
                "ruby -v",
                "bundle -v",
                "bundle install --path vendor/bundle",
                "bundle lock --add-platform ruby x86_64-linux aarch64-linux",
                "bundle lock --add-checksums",
                "bundle cache --all --all-platforms",
                "bundle install --local --path vendor/bundle",
                "bundle binstubs --all --path bin",
            ]
        );
        assert!(ui.has_message("No Gemfile.lock found"));
        assert!(ui.has_success(&format!(
            "Bootstrap complete. Gems installed under: {}",
            temp.path().join("vendor/bundle").display()
        )));
    }

    #[test]
    fn second_run_issues_no_network_install() {
        let temp = project(true);
        let settings = settings_for(temp.path());
        let mut runner = MockRunner::new();
        let mut ui = MockUI::new();

        let report = Bootstrapper::new(&settings).run(&mut runner, &mut ui).unwrap();

        assert!(!report.resolved);
        assert_eq!(runner.count("bundle install --path"), 0);
        assert_eq!(runner.count("bundle install --local"), 1);
    }

    #[test]
    fn missing_tools_are_reported_not_fatal() {
        let temp = project(true);
        let settings = settings_for(temp.path());
        let mut runner = MockRunner::new();
        runner.respond("ruby -v", MockResponse::SpawnError);
        runner.respond("bundle -v", MockResponse::fail(127, ""));
        let mut ui = MockUI::new();

        Bootstrapper::new(&settings).run(&mut runner, &mut ui).unwrap();

        assert!(ui.has_message("Ruby version: ruby not found"));
        assert!(ui.has_message("Bundler version: bundler not found"));
    }

    #[test]
    fn best_effort_failures_become_warnings() {
        let temp = project(true);
        let settings = settings_for(temp.path());
        let mut runner = MockRunner::new();
        runner.respond("bundle lock --add-platform", MockResponse::fail(1, "offline"));
        runner.respond("bundle lock --add-checksums", MockResponse::fail(15, "unknown option"));
        runner.respond("bundle cache", MockResponse::fail(1, "offline"));
        runner.respond("bundle binstubs", MockResponse::fail(1, "no gems"));
        let mut ui = MockUI::new();

        let report = Bootstrapper::new(&settings).run(&mut runner, &mut ui).unwrap();

        assert_eq!(report.warnings(), 4);
        assert!(ui.has_warning("add checksums"));
        assert!(ui.has_success("Bootstrap complete."));
        assert_eq!(ui.summaries()[0].count(StatusKind::Warning), 4);
    }

    #[test]
    fn incomplete_cache_triggers_single_retry() {
        let temp = project(true);
        let settings = settings_for(temp.path());
        let mut runner = MockRunner::new();
        runner.queue(
            "bundle install --local",
            vec![
                MockResponse::fail(7, "Could not find rack-3.1.7 in locally installed gems"),
                MockResponse::ok(),
            ],
        );
        let mut ui = MockUI::new();

        let report = Bootstrapper::new(&settings).run(&mut runner, &mut ui).unwrap();

        assert!(report.repaired_cache);
        assert!(ui.has_message("Local cache incomplete"));
        let lines = runner.command_lines();
        let tail: Vec<&str> = lines[lines.len() - 5..].iter().map(String::as_str).collect();
        assert_eq!(
            tail,
            vec![
                "bundle install --local --path vendor/bundle",
                "bundle install --path vendor/bundle",
                "bundle cache --all --all-platforms",
                "bundle install --local --path vendor/bundle",
                "bundle binstubs --all --path bin",
            ]
        );
    }

    #[test]
    fn failed_retry_is_fatal() {
        let temp = project(true);
        let settings = settings_for(temp.path());
        let mut runner = MockRunner::new();
        runner.respond("bundle install --local", MockResponse::fail(7, "missing gems"));
        let mut ui = MockUI::new();

        let err = Bootstrapper::new(&settings)
            .run(&mut runner, &mut ui)
            .unwrap_err();

        assert!(matches!(err, BundlekitError::StepFailed { ref step, .. } if step == "local install (retry)"));
        assert_eq!(runner.count("bundle install --local"), 2);
        assert!(!runner.was_run("bundle binstubs"));
        assert!(!ui.has_success("Bootstrap complete."));
    }

    #[test]
    fn failed_resolve_is_fatal() {
        let temp = project(false);
        let settings = settings_for(temp.path());
        let mut runner = MockRunner::new();
        runner.respond("bundle install --path", MockResponse::fail(6, "Could not reach rubygems.org"));
        let mut ui = MockUI::new();

        let err = Bootstrapper::new(&settings)
            .run(&mut runner, &mut ui)
            .unwrap_err();

        assert!(matches!(err, BundlekitError::StepFailed { ref step, .. } if step == "resolve"));
        assert!(!runner.was_run("bundle lock"));
    }

    #[test]
    fn deployment_flags_apply_only_after_cache() {
        let temp = project(true);
        let settings = settings_for(temp.path());
        let mut runner = MockRunner::new();
        let mut ui = MockUI::new();

        Bootstrapper::new(&settings).run(&mut runner, &mut ui).unwrap();

        for cmd in runner.invocations() {
            let line = cmd.command_line();
            let deployed = cmd.env.get("BUNDLE_DEPLOYMENT").map(String::as_str);
            if line.starts_with("bundle install --local") || line.starts_with("bundle binstubs") {
                assert_eq!(deployed, Some("true"), "{}", line);
                assert_eq!(cmd.env.get("BUNDLE_FROZEN").map(String::as_str), Some("true"));
            } else {
                assert_eq!(deployed, None, "{}", line);
            }
        }
    }

    #[test]
    fn inherited_deployment_values_are_kept() {
        let temp = project(true);
        let overrides = SettingsOverrides {
            deployment: Some("false".to_string()),
            frozen: Some(String::new()),
            ..Default::default()
        };
        let settings = Settings::from_sources(temp.path(), None, overrides);
        let mut runner = MockRunner::new();
        let mut ui = MockUI::new();

        Bootstrapper::new(&settings).run(&mut runner, &mut ui).unwrap();

        let install = runner
            .invocations()
            .iter()
            .find(|c| c.command_line().starts_with("bundle install --local"))
            .unwrap();
        assert_eq!(install.env.get("BUNDLE_DEPLOYMENT").map(String::as_str), Some("false"));
        assert_eq!(install.env.get("BUNDLE_FROZEN").map(String::as_str), Some("true"));
    }

    #[test]
    fn custom_paths_flow_into_commands() {
        let temp = project(true);
        let overrides = SettingsOverrides {
            bundle_path: Some("/opt/gems".to_string()),
            bundle_bin: Some("exe".to_string()),
            ..Default::default()
        };
        let settings = Settings::from_sources(temp.path(), None, overrides);
        let mut runner = MockRunner::new();
        let mut ui = MockUI::new();

        let report = Bootstrapper::new(&settings).run(&mut runner, &mut ui).unwrap();

        assert_eq!(report.install_root, PathBuf::from("/opt/gems"));
        assert!(runner.was_run("bundle install --local --path /opt/gems"));
        assert!(runner.was_run("bundle binstubs --all --path exe"));
    }

    #[test]
    fn step_policies() {
        assert_eq!(BootstrapStep::Resolve.policy(), StepPolicy::Required);
        assert_eq!(BootstrapStep::RetryLocalInstall.policy(), StepPolicy::Required);
        assert_eq!(BootstrapStep::Cache.policy(), StepPolicy::BestEffort);
        assert!(BootstrapStep::DeploymentFlags.command(&settings_for(Path::new("/srv/app"))).is_none());
    }
}
