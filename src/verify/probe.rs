//! Optional diagnostic load of a native gem.

use serde::Serialize;

use crate::bundler::{commands, Bundler, PROBE_NOT_LOADABLE};

/// What the probe found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProbeResult {
    /// The gem loaded; `info` is its version report.
    Loaded { info: String },
    /// The gem is not part of the bundle.
    NotInBundle,
    /// The probe itself could not run.
    Failed { reason: String },
}

impl ProbeResult {
    /// Check if the gem loaded.
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded { .. })
    }
}

/// Probe report for the `--json` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GemProbe {
    pub gem: String,
    #[serde(flatten)]
    pub result: ProbeResult,
}

/// Require `gem` inside the bundle and capture its version report.
///
/// Never fails: every problem is folded into the returned [`ProbeResult`].
pub fn probe_gem(bundler: &mut Bundler<'_>, gem: &str) -> ProbeResult {
    match bundler.run(&commands::probe_gem(gem)) {
        Ok(result) if result.success => ProbeResult::Loaded {
            info: result.stdout.trim().to_string(),
        },
        Ok(result) if result.exit_code == Some(PROBE_NOT_LOADABLE) => ProbeResult::NotInBundle,
        Ok(result) => ProbeResult::Failed {
            reason: match result.exit_code {
                Some(code) => format!("exited with code {}", code),
                None => "terminated by signal".to_string(),
            },
        },
        Err(e) => ProbeResult::Failed {
            reason: e.to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::shell::{MockResponse, MockRunner};

    fn probe_with(response: MockResponse) -> ProbeResult {
        let settings = Settings::with_defaults("/srv/app");
        let mut runner = MockRunner::new();
        runner.respond("bundle exec ruby", response);
        let mut bundler = Bundler::new(&mut runner, &settings);
        probe_gem(&mut bundler, "nokogiri")
    }

    #[test]
    fn loaded_gem_reports_info() {
        let result = probe_with(MockResponse::stdout("{\"libxml\"=>{\"source\"=>\"packaged\"}}\n"));
        assert_eq!(
            result,
            ProbeResult::Loaded {
                info: "{\"libxml\"=>{\"source\"=>\"packaged\"}}".to_string()
            }
        );
    }

    #[test]
    fn load_error_means_not_in_bundle() {
        let result = probe_with(MockResponse::fail(PROBE_NOT_LOADABLE, ""));
        assert_eq!(result, ProbeResult::NotInBundle);
    }

    #[test]
    fn other_failures_are_folded() {
        assert!(matches!(
            probe_with(MockResponse::fail(1, "Could not locate Gemfile")),
            ProbeResult::Failed { .. }
        ));
        assert!(matches!(
            probe_with(MockResponse::SpawnError),
            ProbeResult::Failed { .. }
        ));
    }

    #[test]
    fn json_shape_is_flat() {
        let probe = GemProbe {
            gem: "nokogiri".to_string(),
            result: ProbeResult::NotInBundle,
        };
        let value = serde_json::to_value(&probe).unwrap();
        assert_eq!(value["gem"], "nokogiri");
        assert_eq!(value["status"], "not_in_bundle");
    }
}
