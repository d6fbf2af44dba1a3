//! Post-install verification.
//!
//! [`Verifier`] checks, in order, that every installed gem lives under the
//! expected install root, that `bundle doctor` passes, and that no native
//! extension links against unpinned system libraries. Each failure class
//! has its own exit code (see [`VerifyOutcome`]) and ends the run at the
//! point it is found. The gem probe and the cache check are advisory.

pub mod cache;
pub mod linkage;
pub mod paths;
pub mod probe;

use serde::Serialize;
use std::path::PathBuf;

use crate::bundler::{commands, Bundler};
use crate::config::Settings;
use crate::error::Result;
use crate::shell::{CommandResult, CommandRunner, ToolCommand};
use crate::ui::UserInterface;

pub use cache::{inspect_cache, CacheStatus};
pub use linkage::{
    audit_linkage, check_report, denied_prefix, find_shared_objects, parse_ldd, FlaggedLibrary,
    LinkageAudit, LinkageFinding, LinkedLibrary,
};
pub use paths::{audit_paths, PathAudit};
pub use probe::{probe_gem, GemProbe, ProbeResult};

/// Exit status when a gem is installed outside the install root.
pub const EXIT_PATHS_OUTSIDE_ROOT: i32 = 2;
/// Exit status when a native extension links an unpinned library.
pub const EXIT_UNPINNED_LINKAGE: i32 = 3;

/// How verification ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyOutcome {
    /// Every check passed.
    Clean,
    /// Some gem is installed outside the install root.
    PathsOutsideRoot,
    /// Some native extension links a denied library.
    UnpinnedLinkage,
}

impl VerifyOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(self) -> i32 {
        match self {
            Self::Clean => 0,
            Self::PathsOutsideRoot => EXIT_PATHS_OUTSIDE_ROOT,
            Self::UnpinnedLinkage => EXIT_UNPINNED_LINKAGE,
        }
    }
}

/// Everything verification observed.
///
/// Checks that did not run because an earlier one failed are `None`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyReport {
    pub working_directory: PathBuf,
    pub ruby_version: String,
    pub bundler_version: String,
    pub bundle_config: String,
    pub expected_root: PathBuf,
    pub paths: PathAudit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub doctor: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub linkage: Option<LinkageAudit>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe: Option<GemProbe>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CacheStatus>,
    pub outcome: VerifyOutcome,
    pub exit_code: i32,
}

impl VerifyReport {
    fn finish(mut self, outcome: VerifyOutcome) -> Self {
        self.outcome = outcome;
        self.exit_code = outcome.exit_code();
        self
    }
}

/// Runs the verification sequence for one project.
pub struct Verifier<'a> {
    settings: &'a Settings,
}

impl<'a> Verifier<'a> {
    /// Create a verifier for `settings`.
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Run every check in order.
    ///
    /// Returns `Err` only for fatal failures: a toolchain command, `bundle
    /// list` or `bundle doctor` failing. Audit failures are reported through
    /// [`VerifyReport::outcome`].
    pub fn run(
        &self,
        runner: &mut dyn CommandRunner,
        ui: &mut dyn UserInterface,
    ) -> Result<VerifyReport> {
        let settings = self.settings;
        let mut bundler = Bundler::new(runner, settings);

        ui.show_header("bundlekit verify");
        ui.message(&format!(
            "Working directory: {}",
            settings.project_root.display()
        ));

        let ruby = unguarded(&mut bundler, ui, &commands::ruby_version())?;
        let ruby_version = first_line(&ruby.stdout);
        ui.message(&format!("Ruby version: {}", ruby_version));
        let bundle = unguarded(&mut bundler, ui, &commands::bundler_version())?;
        let bundler_version = first_line(&bundle.stdout);
        ui.message(&format!("Bundler version: {}", bundler_version));

        ui.message("Bundler config");
        let bundle_config = unguarded(&mut bundler, ui, &commands::config())?.stdout;
        show_block(ui, &bundle_config);

        let expected_root = settings.install_root();
        ui.message(&format!(
            "Expected install root: {}",
            expected_root.display()
        ));

        ui.message("Installed gem paths:");
        let listing = unguarded(&mut bundler, ui, &commands::list_paths())?.stdout;
        show_block(ui, &listing);

        let paths = audit_paths(&listing, &expected_root);
        tracing::debug!(
            "Checked {} gem paths, {} outside root",
            paths.checked,
            paths.outside.len()
        );
        let paths_clean = paths.is_clean();

        let mut report = VerifyReport {
            working_directory: settings.project_root.clone(),
            ruby_version,
            bundler_version,
            bundle_config,
            expected_root: expected_root.clone(),
            paths,
            doctor: None,
            linkage: None,
            probe: None,
            cache: None,
            outcome: VerifyOutcome::Clean,
            exit_code: 0,
        };

        if !paths_clean {
            ui.error(&format!(
                "Found gems not under {}:",
                expected_root.display()
            ));
            for line in &report.paths.outside {
                ui.raw(line);
            }
            ui.show_hint("Run `bundlekit bootstrap` to reinstall into the install root.");
            return Ok(report.finish(VerifyOutcome::PathsOutsideRoot));
        }
        ui.success(&format!("All gems are under {}", expected_root.display()));

        ui.message("bundle doctor");
        let doctor = unguarded(&mut bundler, ui, &commands::doctor())?.combined_output();
        show_block(ui, &doctor);
        report.doctor = Some(doctor);

        ui.message("Auditing native extension linkage (ldd)");
        let linkage = audit_linkage(&mut bundler, &settings.linkage, &expected_root);
        for artifact in &linkage.unreadable {
            ui.warning(&format!(
                "ldd could not inspect {}; skipping",
                artifact.display()
            ));
        }
        let denied = settings.linkage.deny.join(" or ");
        if !linkage.is_clean() {
            for finding in &linkage.findings {
                ui.error(&format!(
                    "Non-pinned linkage detected in: {}",
                    finding.artifact.display()
                ));
                for lib in &finding.flagged {
                    ui.raw(&format!("\t{} => {}", lib.name, lib.path.display()));
                }
            }
            ui.error(&format!("Found native extensions linked to {}.", denied));
            ui.show_hint("Check your Nix environment and Bundler build flags.");
            report.linkage = Some(linkage);
            return Ok(report.finish(VerifyOutcome::UnpinnedLinkage));
        }
        ui.success(&format!(
            "Native extensions link only to pinned libraries (no {}).",
            denied
        ));
        report.linkage = Some(linkage);

        let gem = settings.probe_gem.clone();
        let result = probe_gem(&mut bundler, &gem);
        match &result {
            ProbeResult::Loaded { info } => {
                ui.message(&format!("{} VERSION_INFO", gem));
                show_block(ui, info);
            }
            ProbeResult::NotInBundle => {
                ui.message(&format!("{} not in bundle; skipping.", gem));
            }
            ProbeResult::Failed { reason } => {
                tracing::debug!("Probe for {} failed: {}", gem, reason);
                ui.message(&format!("{} not in bundle; skipping.", gem));
            }
        }
        report.probe = Some(GemProbe { gem, result });

        let cache = inspect_cache(&settings.cache_dir());
        if cache.is_populated() {
            ui.success(&format!("{} populated.", settings.cache_path));
        } else {
            ui.warning(&format!(
                "{} is empty; consider running: bundle cache --all --all-platforms",
                settings.cache_path
            ));
        }
        report.cache = Some(cache);

        ui.success("Verify complete.");
        Ok(report.finish(VerifyOutcome::Clean))
    }
}

/// Run a command whose failure ends verification, showing its output first.
fn unguarded(
    bundler: &mut Bundler<'_>,
    ui: &mut dyn UserInterface,
    command: &ToolCommand,
) -> Result<CommandResult> {
    let result = bundler.run(command)?;
    if !result.success {
        ui.show_error_block(&command.to_string(), &result.combined_output(), None);
    }
    result.into_checked(command)
}

fn first_line(output: &str) -> String {
    output.lines().next().unwrap_or_default().trim().to_string()
}

fn show_block(ui: &mut dyn UserInterface, text: &str) {
    if !text.trim().is_empty() {
        ui.raw(text);
    }
}
