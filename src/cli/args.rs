//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros.
//! The main entry point is the [`Cli`] struct.
//!
//! Settings that Bundler itself reads from the environment (`BUNDLE_PATH`,
//! `BUNDLE_BIN`, ...) are accepted both as flags and as those variables.

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use crate::config::SettingsOverrides;

/// bundlekit - Vendored, offline-installable Bundler setups.
#[derive(Debug, Parser)]
#[command(name = "bundlekit")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to project root (overrides current directory)
    #[arg(short, long, global = true)]
    pub project: Option<PathBuf>,

    /// Gem install root, relative to the project root
    #[arg(long, global = true, env = "BUNDLE_PATH")]
    pub bundle_path: Option<String>,

    /// Gem archive cache directory
    #[arg(long, global = true, env = "BUNDLE_CACHE_PATH")]
    pub cache_path: Option<String>,

    /// Show verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Overrides shared by every subcommand.
    pub fn overrides(&self) -> SettingsOverrides {
        SettingsOverrides {
            bundle_path: self.bundle_path.clone(),
            cache_path: self.cache_path.clone(),
            ..Default::default()
        }
    }
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve, cache and install gems into the vendored install root
    Bootstrap(BootstrapArgs),

    /// Check that installed gems are pinned to the install root
    Verify(VerifyArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

/// Arguments for the `bootstrap` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct BootstrapArgs {
    /// Directory for generated binstubs
    #[arg(long, env = "BUNDLE_BIN")]
    pub bundle_bin: Option<String>,

    /// Inherited deployment flag
    #[arg(long, env = "BUNDLE_DEPLOYMENT", hide = true)]
    pub deployment: Option<String>,

    /// Inherited frozen flag
    #[arg(long, env = "BUNDLE_FROZEN", hide = true)]
    pub frozen: Option<String>,
}

impl BootstrapArgs {
    /// Layer these arguments onto `base`.
    pub fn apply(&self, base: SettingsOverrides) -> SettingsOverrides {
        SettingsOverrides {
            bundle_bin: self.bundle_bin.clone(),
            deployment: self.deployment.clone(),
            frozen: self.frozen.clone(),
            ..base
        }
    }
}

/// Arguments for the `verify` command.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct VerifyArgs {
    /// Print a JSON report instead of human-readable output
    #[arg(long)]
    pub json: bool,

    /// Gem to load for the diagnostic probe
    #[arg(long, env = "BUNDLEKIT_PROBE_GEM")]
    pub probe_gem: Option<String>,
}

impl VerifyArgs {
    /// Layer these arguments onto `base`.
    pub fn apply(&self, base: SettingsOverrides) -> SettingsOverrides {
        SettingsOverrides {
            probe_gem: self.probe_gem.clone(),
            ..base
        }
    }
}

/// Arguments for the `completions` command.
#[derive(Debug, Clone, clap::Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    #[arg(value_enum)]
    pub shell: Shell,
}
