//! End-of-run summary rendering data.

use std::time::Duration;

/// Status icon for a summary row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Warning,
    Failed,
}

impl StatusKind {
    /// Single-character icon.
    pub fn icon(&self) -> &'static str {
        match self {
            Self::Success => "✓",
            Self::Warning => "⚠",
            Self::Failed => "✗",
        }
    }
}

/// One line of the summary box.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRow {
    pub status: StatusKind,
    pub name: String,
    pub duration: Duration,
}

/// Summary shown at the end of `bootstrap`.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub rows: Vec<SummaryRow>,
    pub total_duration: Duration,
}

impl RunSummary {
    /// Number of rows with the given status.
    pub fn count(&self, status: StatusKind) -> usize {
        self.rows.iter().filter(|r| r.status == status).count()
    }

    /// Render the summary box as lines, without styling.
    pub fn render_lines(&self) -> Vec<String> {
        let mut lines = vec!["┌─ Summary ──────────────────────────".to_string()];
        for row in &self.rows {
            lines.push(format!(
                "│ {} {:<24} {}",
                row.status.icon(),
                row.name,
                format_duration(row.duration)
            ));
        }
        lines.push("├────────────────────────────────────".to_string());
        lines.push(format!(
            "│ Total: {} · {} ok · {} warnings",
            format_duration(self.total_duration),
            self.count(StatusKind::Success),
            self.count(StatusKind::Warning),
        ));
        lines.push("└────────────────────────────────────".to_string());
        lines
    }
}

/// Format a duration for display.
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs_f64();
    if secs < 1.0 {
        format!("{}ms", d.as_millis())
    } else if secs < 60.0 {
        format!("{:.1}s", secs)
    } else {
        let mins = secs / 60.0;
        format!("{:.1}m", mins)
    }
}
