//! Step classification and results.

use std::fmt;
use std::time::Duration;

use crate::error::{BundlekitError, Result};
use crate::ui::{StatusKind, SummaryRow};

/// How a step's failure is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepPolicy {
    /// Failure ends the run.
    Required,
    /// Failure is downgraded to a warning and the run continues.
    BestEffort,
}

impl StepPolicy {
    /// Classify a failure message under this policy.
    pub fn on_failure(self, message: impl Into<String>) -> StepOutcome {
        match self {
            Self::Required => StepOutcome::Fatal(message.into()),
            Self::BestEffort => StepOutcome::Warning(message.into()),
        }
    }
}

/// Result of a single step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step did what it was asked to.
    Success,
    /// The step failed, but was best-effort.
    Warning(String),
    /// The step failed and the run must stop.
    Fatal(String),
}

impl StepOutcome {
    /// Check if the step succeeded.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success)
    }

    /// Check if the step ends the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Status icon for summaries.
    pub fn status(&self) -> StatusKind {
        match self {
            Self::Success => StatusKind::Success,
            Self::Warning(_) => StatusKind::Warning,
            Self::Fatal(_) => StatusKind::Failed,
        }
    }

    /// Convert a fatal outcome into [`BundlekitError::StepFailed`].
    pub fn check(self, step: &str) -> Result<Self> {
        match self {
            Self::Fatal(message) => Err(BundlekitError::StepFailed {
                step: step.to_string(),
                message,
            }),
            other => Ok(other),
        }
    }
}

impl fmt::Display for StepOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => write!(f, "ok"),
            Self::Warning(msg) => write!(f, "warning: {}", msg),
            Self::Fatal(msg) => write!(f, "failed: {}", msg),
        }
    }
}

/// A step that ran, for the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepRecord {
    pub name: String,
    pub outcome: StepOutcome,
    pub duration: Duration,
}

impl StepRecord {
    /// Summary row for this record.
    pub fn summary_row(&self) -> SummaryRow {
        SummaryRow {
            status: self.outcome.status(),
            name: self.name.clone(),
            duration: self.duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn best_effort_failure_is_warning() {
        let outcome = StepPolicy::BestEffort.on_failure("exit code 1");
        assert_eq!(outcome, StepOutcome::Warning("exit code 1".to_string()));
        assert!(!outcome.is_fatal());
    }

    #[test]
    fn required_failure_is_fatal() {
        let outcome = StepPolicy::Required.on_failure("exit code 1");
        assert!(outcome.is_fatal());
        assert_eq!(outcome.status(), StatusKind::Failed);
    }

    #[test]
    fn check_passes_non_fatal_through() {
        assert_eq!(StepOutcome::Success.check("cache").unwrap(), StepOutcome::Success);
        let warning = StepOutcome::Warning("x".to_string());
        assert_eq!(warning.clone().check("cache").unwrap(), warning);
    }

    #[test]
    fn check_converts_fatal() {
        let err = StepOutcome::Fatal("exit code 5".to_string())
            .check("install")
            .unwrap_err();
        assert!(matches!(err, BundlekitError::StepFailed { .. }));
        assert!(err.to_string().contains("install"));
    }

    #[test]
    fn display_includes_message() {
        assert_eq!(StepOutcome::Success.to_string(), "ok");
        assert_eq!(
            StepOutcome::Warning("no network".to_string()).to_string(),
            "warning: no network"
        );
    }

    #[test]
    fn record_maps_to_summary_row() {
        let record = StepRecord {
            name: "binstubs".to_string(),
            outcome: StepOutcome::Warning("x".to_string()),
            duration: Duration::from_millis(5),
        };
        let row = record.summary_row();
        assert_eq!(row.status, StatusKind::Warning);
        assert_eq!(row.name, "binstubs");
    }
}
