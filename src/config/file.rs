//! Project config file (`.bundlekit.yml`).
//!
//! The file is optional. Every key is optional too; unset keys fall back to
//! environment variables and then to built-in defaults (see
//! [`Settings`](super::Settings)).
//!
//! ```yaml
//! bundle_path: vendor/bundle
//! bundle_bin: bin
//! cache_path: vendor/cache
//! platforms: [ruby, x86_64-linux, aarch64-linux]
//! probe_gem: nokogiri
//! linkage:
//!   deny: [/usr/lib, /usr/local]
//!   allow: [/usr/lib/ld-linux]
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{BundlekitError, Result};

/// File name of the project config, relative to the project root.
pub const CONFIG_FILE_NAME: &str = ".bundlekit.yml";

/// Root structure of `.bundlekit.yml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProjectConfig {
    /// Install root, relative to the project root unless absolute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_path: Option<String>,

    /// Binstub output directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bundle_bin: Option<String>,

    /// Gem archive cache directory.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_path: Option<String>,

    /// Platforms added to the lockfile during bootstrap.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platforms: Option<Vec<String>>,

    /// Gem loaded by the optional diagnostic probe in `verify`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_gem: Option<String>,

    /// Linkage audit prefix rules.
    pub linkage: LinkageConfig,
}

/// `linkage:` section of the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinkageConfig {
    /// Replaces the default deny prefixes when set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deny: Option<Vec<String>>,

    /// Prefixes exempt from the deny list.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allow: Vec<String>,
}

impl ProjectConfig {
    /// Path of the config file for a project.
    pub fn path_for(project_root: &Path) -> PathBuf {
        project_root.join(CONFIG_FILE_NAME)
    }

    /// Load the project config if the file exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigParseError` if the YAML is invalid, and
    /// `ConfigValidationError` if a value is unusable.
    pub fn load_optional(project_root: &Path) -> Result<Option<Self>> {
        let path = Self::path_for(project_root);
        if !path.is_file() {
            tracing::debug!("No project config at {}", path.display());
            return Ok(None);
        }

        let content = fs::read_to_string(&path)?;
        let config = Self::parse(&content, &path)?;
        tracing::debug!("Loaded project config from {}", path.display());
        Ok(Some(config))
    }

    /// Parse and validate config YAML.
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        // An empty file deserializes to null rather than an empty mapping.
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self =
            serde_yaml::from_str(content).map_err(|e| BundlekitError::ConfigParseError {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Check values that parse but cannot be used.
    pub fn validate(&self) -> Result<()> {
        if let Some(platforms) = &self.platforms {
            if platforms.is_empty() {
                return Err(invalid("platforms must not be empty"));
            }
            if platforms.iter().any(|p| p.trim().is_empty()) {
                return Err(invalid("platforms must not contain blank entries"));
            }
        }

        for (key, value) in [
            ("bundle_path", &self.bundle_path),
            ("bundle_bin", &self.bundle_bin),
            ("cache_path", &self.cache_path),
            ("probe_gem", &self.probe_gem),
        ] {
            if value.as_deref().is_some_and(|v| v.trim().is_empty()) {
                return Err(invalid(&format!("{} must not be blank", key)));
            }
        }

        let deny = self.linkage.deny.iter().flatten();
        for prefix in deny.chain(self.linkage.allow.iter()) {
            if !prefix.starts_with('/') {
                return Err(invalid(&format!(
                    "linkage prefix '{}' must be an absolute path",
                    prefix
                )));
            }
        }

        Ok(())
    }
}

fn invalid(message: &str) -> BundlekitError {
    BundlekitError::ConfigValidationError {
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn parse(yaml: &str) -> Result<ProjectConfig> {
        ProjectConfig::parse(yaml, Path::new(".bundlekit.yml"))
    }

    #[test]
    fn parses_full_config() {
        let config = parse(
            r#"
bundle_path: gems
bundle_bin: exe
cache_path: cache/gems
platforms: [ruby, arm64-darwin]
probe_gem: ffi
linkage:
  deny: [/usr/lib]
  allow: [/usr/lib/pinned]
"#,
        )
        .unwrap();

        assert_eq!(config.bundle_path.as_deref(), Some("gems"));
        assert_eq!(config.bundle_bin.as_deref(), Some("exe"));
        assert_eq!(config.cache_path.as_deref(), Some("cache/gems"));
        assert_eq!(
            config.platforms,
            Some(vec!["ruby".to_string(), "arm64-darwin".to_string()])
        );
        assert_eq!(config.probe_gem.as_deref(), Some("ffi"));
        assert_eq!(config.linkage.deny, Some(vec!["/usr/lib".to_string()]));
        assert_eq!(config.linkage.allow, vec!["/usr/lib/pinned".to_string()]);
    }

    #[test]
    fn empty_file_is_default() {
        assert_eq!(parse("").unwrap(), ProjectConfig::default());
        assert_eq!(parse("  \n").unwrap(), ProjectConfig::default());
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = parse("bundle_paht: gems").unwrap_err();
        assert!(matches!(err, BundlekitError::ConfigParseError { .. }));
    }

    #[test]
    fn empty_platforms_are_rejected() {
        let err = parse("platforms: []").unwrap_err();
        assert!(err.to_string().contains("platforms must not be empty"));
    }

    #[test]
    fn blank_bundle_path_is_rejected() {
        let err = parse("bundle_path: ''").unwrap_err();
        assert!(err.to_string().contains("bundle_path"));
    }

    #[test]
    fn relative_linkage_prefix_is_rejected() {
        let err = parse("linkage:\n  allow: [usr/lib]").unwrap_err();
        assert!(err.to_string().contains("absolute path"));
    }

    #[test]
    fn load_optional_missing_file() {
        let temp = TempDir::new().unwrap();
        assert!(ProjectConfig::load_optional(temp.path()).unwrap().is_none());
    }

    #[test]
    fn load_optional_reads_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(CONFIG_FILE_NAME), "probe_gem: pg\n").unwrap();

        let config = ProjectConfig::load_optional(temp.path()).unwrap().unwrap();

        assert_eq!(config.probe_gem.as_deref(), Some("pg"));
    }
}
