//! Error types for bundlekit operations.
//!
//! This module defines [`BundlekitError`], the primary error type used
//! throughout the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Use `BundlekitError` for failures that end a run (exit status 1)
//! - Advisory failures never become errors; they are downgraded to
//!   [`StepOutcome::Warning`](crate::steps::StepOutcome::Warning)
//! - Use `anyhow::Error` (via `BundlekitError::Other`) for unexpected errors

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for bundlekit operations.
#[derive(Debug, Error)]
pub enum BundlekitError {
    /// The project has no dependency manifest.
    #[error("Gemfile not found in {}", dir.display())]
    ManifestNotFound { dir: PathBuf },

    /// Failed to parse the project config file.
    #[error("Failed to parse config at {}: {}", path.display(), message)]
    ConfigParseError { path: PathBuf, message: String },

    /// Invalid configuration values.
    #[error("Invalid configuration: {message}")]
    ConfigValidationError { message: String },

    /// An external command could not be spawned or exited non-zero.
    #[error("Command failed with exit code {code:?}: {command}")]
    CommandFailed { command: String, code: Option<i32> },

    /// A required pipeline step failed.
    #[error("Step '{step}' failed: {message}")]
    StepFailed { step: String, message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for bundlekit operations.
pub type Result<T> = std::result::Result<T, BundlekitError>;
