//! bundlekit - Vendored, offline-installable Bundler setups.
//!
//! bundlekit bootstraps a Ruby project so that every gem is resolved once,
//! cached as an archive under `vendor/cache`, and installed into a
//! project-local root from that cache alone. It then verifies the result:
//! all gems live under the install root and no native extension links
//! against unpinned system libraries.
//!
//! # Modules
//!
//! - [`bootstrap`] - The bootstrap pipeline
//! - [`bundler`] - Typed wrappers around `bundle`, `ruby` and `ldd`
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - Settings resolution and path derivation
//! - [`error`] - Error types and result aliases
//! - [`shell`] - External command execution
//! - [`steps`] - Step policies, outcomes and the sequential pipeline
//! - [`ui`] - Spinners, themes and terminal output
//! - [`verify`] - Post-install verification checks
//!
//! # Example
//!
//! ```
//! use bundlekit::bootstrap::Bootstrapper;
//! use bundlekit::config::Settings;
//! use bundlekit::shell::MockRunner;
//! use bundlekit::ui::MockUI;
//!
//! // No Gemfile in an empty directory: nothing runs.
//! let dir = std::env::temp_dir().join("bundlekit-doc-no-gemfile");
//! let settings = Settings::with_defaults(&dir);
//! let mut runner = MockRunner::new();
//! let mut ui = MockUI::new();
//!
//! let result = Bootstrapper::new(&settings).run(&mut runner, &mut ui);
//! assert!(result.is_err());
//! assert!(runner.invocations().is_empty());
//! ```

pub mod bootstrap;
pub mod bundler;
pub mod cli;
pub mod config;
pub mod error;
pub mod shell;
pub mod steps;
pub mod ui;
pub mod verify;

pub use error::{BundlekitError, Result};
