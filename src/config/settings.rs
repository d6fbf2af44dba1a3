//! Resolved settings shared by `bootstrap` and `verify`.
//!
//! Precedence, lowest to highest:
//! 1. Built-in defaults
//! 2. Project config file (`.bundlekit.yml`)
//! 3. Environment variables / CLI flags (see [`SettingsOverrides`])
//!
//! Empty values count as unset at every layer.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::file::ProjectConfig;
use super::paths::expand_path;
use crate::error::Result;

/// Dependency manifest, relative to the project root.
pub const MANIFEST_FILE: &str = "Gemfile";

/// Lockfile, relative to the project root.
pub const LOCKFILE: &str = "Gemfile.lock";

/// Default install root (`BUNDLE_PATH`).
pub const DEFAULT_BUNDLE_PATH: &str = "vendor/bundle";

/// Default binstub directory (`BUNDLE_BIN`).
pub const DEFAULT_BUNDLE_BIN: &str = "bin";

/// Default gem archive cache (`BUNDLE_CACHE_PATH`).
pub const DEFAULT_CACHE_PATH: &str = "vendor/cache";

/// Default gem for the optional diagnostic probe.
pub const DEFAULT_PROBE_GEM: &str = "nokogiri";

/// Default lockfile platforms.
pub const DEFAULT_PLATFORMS: &[&str] = &["ruby", "x86_64-linux", "aarch64-linux"];

/// Default linkage deny prefixes, matched as `/usr/lib*` and `/usr/local*`.
pub const DEFAULT_LINKAGE_DENY: &[&str] = &["/usr/lib", "/usr/local"];

/// Environment variables carrying the deployment flags.
pub const DEPLOYMENT_VARS: [&str; 2] = ["BUNDLE_DEPLOYMENT", "BUNDLE_FROZEN"];

/// Values supplied by the environment or command line.
///
/// The CLI fills this through clap's `env` support, so each field already
/// reflects "flag, else environment variable".
#[derive(Debug, Clone, Default)]
pub struct SettingsOverrides {
    pub bundle_path: Option<String>,
    pub bundle_bin: Option<String>,
    pub cache_path: Option<String>,
    pub probe_gem: Option<String>,
    pub deployment: Option<String>,
    pub frozen: Option<String>,
}

/// Path-prefix rules for the linkage audit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkageRules {
    /// A resolved library path starting with one of these is flagged...
    pub deny: Vec<String>,
    /// ...unless it also starts with one of these.
    pub allow: Vec<String>,
}

impl Default for LinkageRules {
    fn default() -> Self {
        Self {
            deny: DEFAULT_LINKAGE_DENY.iter().map(|s| s.to_string()).collect(),
            allow: Vec::new(),
        }
    }
}

/// Fully resolved settings.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Absolute project directory; every command runs here.
    pub project_root: PathBuf,
    /// Raw install root value, as passed to `--path`.
    pub bundle_path: String,
    /// Raw binstub directory value.
    pub bundle_bin: String,
    /// Raw cache directory value.
    pub cache_path: String,
    /// Platforms added to the lockfile.
    pub platforms: Vec<String>,
    /// Gem loaded by the optional probe.
    pub probe_gem: String,
    /// Linkage audit rules.
    pub linkage: LinkageRules,
    /// Inherited `BUNDLE_DEPLOYMENT`.
    pub deployment: Option<String>,
    /// Inherited `BUNDLE_FROZEN`.
    pub frozen: Option<String>,
}

impl Settings {
    /// Settings with all defaults for `project_root`.
    pub fn with_defaults(project_root: impl Into<PathBuf>) -> Self {
        Self::from_sources(project_root, None, SettingsOverrides::default())
    }

    /// Load `.bundlekit.yml` (if present) and merge it with `overrides`.
    pub fn load(project_root: &Path, overrides: SettingsOverrides) -> Result<Self> {
        let root = absolute_root(project_root)?;
        let file = ProjectConfig::load_optional(&root)?;
        Ok(Self::from_sources(root, file, overrides))
    }

    /// Merge already-loaded sources.
    pub fn from_sources(
        project_root: impl Into<PathBuf>,
        file: Option<ProjectConfig>,
        overrides: SettingsOverrides,
    ) -> Self {
        let file = file.unwrap_or_default();

        let pick = |over: Option<String>, from_file: Option<String>, default: &str| {
            non_empty(over)
                .or_else(|| non_empty(from_file))
                .unwrap_or_else(|| default.to_string())
        };

        let linkage = LinkageRules {
            deny: file
                .linkage
                .deny
                .unwrap_or_else(|| LinkageRules::default().deny),
            allow: file.linkage.allow,
        };

        Self {
            project_root: project_root.into(),
            bundle_path: pick(overrides.bundle_path, file.bundle_path, DEFAULT_BUNDLE_PATH),
            bundle_bin: pick(overrides.bundle_bin, file.bundle_bin, DEFAULT_BUNDLE_BIN),
            cache_path: pick(overrides.cache_path, file.cache_path, DEFAULT_CACHE_PATH),
            platforms: file
                .platforms
                .unwrap_or_else(|| DEFAULT_PLATFORMS.iter().map(|s| s.to_string()).collect()),
            probe_gem: pick(overrides.probe_gem, file.probe_gem, DEFAULT_PROBE_GEM),
            linkage,
            deployment: non_empty(overrides.deployment),
            frozen: non_empty(overrides.frozen),
        }
    }

    /// Absolute install root derived from `bundle_path`.
    pub fn install_root(&self) -> PathBuf {
        expand_path(&self.bundle_path, &self.project_root)
    }

    /// Absolute gem cache directory.
    pub fn cache_dir(&self) -> PathBuf {
        expand_path(&self.cache_path, &self.project_root)
    }

    /// Path of the manifest file.
    pub fn manifest_path(&self) -> PathBuf {
        self.project_root.join(MANIFEST_FILE)
    }

    /// Path of the lockfile.
    pub fn lockfile_path(&self) -> PathBuf {
        self.project_root.join(LOCKFILE)
    }

    /// Environment passed to every Bundler invocation.
    pub fn bundler_env(&self) -> BTreeMap<String, String> {
        let mut env = BTreeMap::new();
        env.insert("BUNDLE_CACHE_PATH".to_string(), self.cache_path.clone());
        env
    }

    /// Stricter deployment flags: the inherited value, else `"true"`.
    pub fn deployment_env(&self) -> BTreeMap<String, String> {
        let values = [&self.deployment, &self.frozen];
        DEPLOYMENT_VARS
            .iter()
            .zip(values)
            .map(|(key, value)| {
                (
                    key.to_string(),
                    value.clone().unwrap_or_else(|| "true".to_string()),
                )
            })
            .collect()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn absolute_root(project_root: &Path) -> Result<PathBuf> {
    if project_root.is_absolute() {
        Ok(project_root.to_path_buf())
    } else {
        Ok(std::path::absolute(project_root)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_conventional_layout() {
        let settings = Settings::with_defaults("/srv/app");
        assert_eq!(settings.bundle_path, "vendor/bundle");
        assert_eq!(settings.bundle_bin, "bin");
        assert_eq!(settings.cache_path, "vendor/cache");
        assert_eq!(settings.probe_gem, "nokogiri");
        assert_eq!(settings.platforms, vec!["ruby", "x86_64-linux", "aarch64-linux"]);
        assert_eq!(settings.linkage.deny, vec!["/usr/lib", "/usr/local"]);
        assert!(settings.linkage.allow.is_empty());
    }

    #[test]
    fn install_root_is_absolute_under_project() {
        let settings = Settings::with_defaults("/srv/app");
        assert_eq!(settings.install_root(), PathBuf::from("/srv/app/vendor/bundle"));
        assert_eq!(settings.cache_dir(), PathBuf::from("/srv/app/vendor/cache"));
    }

    #[test]
    fn overrides_beat_file_beat_defaults() {
        let file = ProjectConfig {
            bundle_path: Some("from-file".to_string()),
            bundle_bin: Some("file-bin".to_string()),
            ..Default::default()
        };
        let overrides = SettingsOverrides {
            bundle_path: Some("from-env".to_string()),
            ..Default::default()
        };

        let settings = Settings::from_sources("/srv/app", Some(file), overrides);

        assert_eq!(settings.bundle_path, "from-env");
        assert_eq!(settings.bundle_bin, "file-bin");
        assert_eq!(settings.cache_path, "vendor/cache");
    }

    #[test]
    fn empty_override_counts_as_unset() {
        let overrides = SettingsOverrides {
            bundle_path: Some(String::new()),
            deployment: Some(String::new()),
            ..Default::default()
        };
        let settings = Settings::from_sources("/srv/app", None, overrides);
        assert_eq!(settings.bundle_path, "vendor/bundle");
        assert_eq!(settings.deployment, None);
    }

    #[test]
    fn deployment_env_defaults_to_true() {
        let settings = Settings::with_defaults("/srv/app");
        let env = settings.deployment_env();
        assert_eq!(env.get("BUNDLE_DEPLOYMENT").map(String::as_str), Some("true"));
        assert_eq!(env.get("BUNDLE_FROZEN").map(String::as_str), Some("true"));
    }

    #[test]
    fn deployment_env_keeps_inherited_values() {
        let overrides = SettingsOverrides {
            deployment: Some("false".to_string()),
            ..Default::default()
        };
        let settings = Settings::from_sources("/srv/app", None, overrides);
        let env = settings.deployment_env();
        assert_eq!(env.get("BUNDLE_DEPLOYMENT").map(String::as_str), Some("false"));
        assert_eq!(env.get("BUNDLE_FROZEN").map(String::as_str), Some("true"));
    }

    #[test]
    fn file_linkage_deny_replaces_defaults() {
        let mut file = ProjectConfig::default();
        file.linkage.deny = Some(vec!["/opt/homebrew".to_string()]);
        file.linkage.allow = vec!["/opt/homebrew/pinned".to_string()];

        let settings = Settings::from_sources("/srv/app", Some(file), SettingsOverrides::default());

        assert_eq!(settings.linkage.deny, vec!["/opt/homebrew"]);
        assert_eq!(settings.linkage.allow, vec!["/opt/homebrew/pinned"]);
    }

    #[test]
    fn load_reads_project_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(".bundlekit.yml"),
            "bundle_path: gems\nplatforms: [ruby]\n",
        )
        .unwrap();

        let settings = Settings::load(temp.path(), SettingsOverrides::default()).unwrap();

        assert_eq!(settings.bundle_path, "gems");
        assert_eq!(settings.platforms, vec!["ruby"]);
        assert_eq!(settings.install_root(), temp.path().join("gems"));
    }

    #[test]
    fn load_propagates_parse_errors() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(".bundlekit.yml"), "platforms: [").unwrap();
        assert!(Settings::load(temp.path(), SettingsOverrides::default()).is_err());
    }
}
