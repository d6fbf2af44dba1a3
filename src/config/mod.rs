//! Configuration loading and path derivation.
//!
//! - Project config file in [`file`]
//! - Settings resolution and defaults in [`settings`]
//! - Absolute path derivation in [`paths`]
//!
//! # Example
//!
//! ```
//! use bundlekit::config::{Settings, SettingsOverrides};
//!
//! let overrides = SettingsOverrides {
//!     bundle_path: Some("gems".to_string()),
//!     ..Default::default()
//! };
//! let settings = Settings::from_sources("/srv/app", None, overrides);
//! assert_eq!(settings.install_root().to_string_lossy(), "/srv/app/gems");
//! ```

pub mod file;
pub mod paths;
pub mod settings;

pub use file::{LinkageConfig, ProjectConfig, CONFIG_FILE_NAME};
pub use paths::{expand_path, expand_path_with_home};
pub use settings::{
    LinkageRules, Settings, SettingsOverrides, DEFAULT_BUNDLE_BIN, DEFAULT_BUNDLE_PATH,
    DEFAULT_CACHE_PATH, DEFAULT_LINKAGE_DENY, DEFAULT_PLATFORMS, DEFAULT_PROBE_GEM,
    DEPLOYMENT_VARS, LOCKFILE, MANIFEST_FILE,
};
