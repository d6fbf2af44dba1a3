//! Mock UI implementation for testing.
//!
//! `MockUI` implements the `UserInterface` trait and captures all
//! interactions for later assertion.
//!
//! # Example
//!
//! ```
//! use bundlekit::ui::{MockUI, UserInterface};
//!
//! let mut ui = MockUI::new();
//!
//! ui.message("Working directory: /app");
//! ui.success("Verify complete.");
//!
//! assert!(ui.has_message("Working directory"));
//! assert!(ui.has_success("Verify complete"));
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use super::summary::RunSummary;
use super::{OutputMode, SpinnerHandle, UserInterface};

/// Mock UI implementation for testing.
#[derive(Debug, Default)]
pub struct MockUI {
    mode: OutputMode,
    messages: Vec<String>,
    successes: Vec<String>,
    warnings: Vec<String>,
    errors: Vec<String>,
    raw: Vec<String>,
    headers: Vec<String>,
    hints: Vec<String>,
    spinners: Vec<String>,
    spinner_results: Rc<RefCell<Vec<(SpinnerStatus, String)>>>,
    error_blocks: Vec<(String, String, Option<String>)>,
    summaries: Vec<RunSummary>,
}

impl MockUI {
    /// Create a new MockUI with Normal output mode.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new MockUI with a specific output mode.
    pub fn with_mode(mode: OutputMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    /// Get all captured messages.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    /// Get all captured success messages.
    pub fn successes(&self) -> &[String] {
        &self.successes
    }

    /// Get all captured warning messages.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Get all captured error messages.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Get all captured raw text blocks.
    pub fn raw_output(&self) -> &[String] {
        &self.raw
    }

    /// Get all captured headers.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Get all captured hints.
    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    /// Get all spinner messages that were started.
    pub fn spinners(&self) -> &[String] {
        &self.spinners
    }

    /// How each spinner finished, in order of finishing.
    pub fn spinner_results(&self) -> Vec<(SpinnerStatus, String)> {
        self.spinner_results.borrow().clone()
    }

    /// Get all captured error blocks as (command, output, hint).
    pub fn error_blocks(&self) -> &[(String, String, Option<String>)] {
        &self.error_blocks
    }

    /// Get all captured summaries.
    pub fn summaries(&self) -> &[RunSummary] {
        &self.summaries
    }

    /// Check if a specific message was shown.
    pub fn has_message(&self, msg: &str) -> bool {
        self.messages.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific success was shown.
    pub fn has_success(&self, msg: &str) -> bool {
        self.successes.iter().any(|m| m.contains(msg))
    }

    /// Check if a specific warning was shown, directly or via a spinner.
    pub fn has_warning(&self, msg: &str) -> bool {
        self.warnings.iter().any(|m| m.contains(msg))
            || self
                .spinner_results
                .borrow()
                .iter()
                .any(|(s, m)| *s == SpinnerStatus::Warning && m.contains(msg))
    }

    /// Check if a specific error was shown, directly or via a spinner.
    pub fn has_error(&self, msg: &str) -> bool {
        self.errors.iter().any(|m| m.contains(msg))
            || self
                .spinner_results
                .borrow()
                .iter()
                .any(|(s, m)| *s == SpinnerStatus::Error && m.contains(msg))
    }

    /// Check if some raw block contained the text.
    pub fn has_raw(&self, text: &str) -> bool {
        self.raw.iter().any(|r| r.contains(text))
    }

    /// Total number of lines the UI would have printed.
    pub fn line_count(&self) -> usize {
        self.messages.len()
            + self.successes.len()
            + self.warnings.len()
            + self.errors.len()
            + self.raw.len()
            + self.headers.len()
            + self.hints.len()
            + self.spinners.len()
            + self.error_blocks.len()
            + self.summaries.len()
    }
}

impl UserInterface for MockUI {
    fn output_mode(&self) -> OutputMode {
        self.mode
    }

    fn message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn success(&mut self, msg: &str) {
        self.successes.push(msg.to_string());
    }

    fn warning(&mut self, msg: &str) {
        self.warnings.push(msg.to_string());
    }

    fn error(&mut self, msg: &str) {
        self.errors.push(msg.to_string());
    }

    fn raw(&mut self, text: &str) {
        self.raw.push(text.to_string());
    }

    fn start_spinner(&mut self, message: &str) -> Box<dyn SpinnerHandle> {
        self.spinners.push(message.to_string());
        Box::new(MockSpinner {
            results: Rc::clone(&self.spinner_results),
            messages: Vec::new(),
        })
    }

    fn show_header(&mut self, title: &str) {
        self.headers.push(title.to_string());
    }

    fn show_hint(&mut self, hint: &str) {
        self.hints.push(hint.to_string());
    }

    fn show_error_block(&mut self, command: &str, output: &str, hint: Option<&str>) {
        self.error_blocks.push((
            command.to_string(),
            output.to_string(),
            hint.map(|h| h.to_string()),
        ));
    }

    fn show_summary(&mut self, summary: &RunSummary) {
        self.summaries.push(summary.clone());
    }

    fn is_interactive(&self) -> bool {
        false
    }
}

/// Status of a mock spinner when finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpinnerStatus {
    /// Finished successfully.
    Success,
    /// Finished with a warning.
    Warning,
    /// Finished with error.
    Error,
}

/// Mock spinner that reports its final status back to the owning [`MockUI`].
#[derive(Debug, Default)]
pub struct MockSpinner {
    results: Rc<RefCell<Vec<(SpinnerStatus, String)>>>,
    messages: Vec<String>,
}

impl MockSpinner {
    /// Messages set while spinning.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl SpinnerHandle for MockSpinner {
    fn set_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }

    fn finish_success(&mut self, msg: &str) {
        self.results
            .borrow_mut()
            .push((SpinnerStatus::Success, msg.to_string()));
    }

    fn finish_warning(&mut self, msg: &str) {
        self.results
            .borrow_mut()
            .push((SpinnerStatus::Warning, msg.to_string()));
    }

    fn finish_error(&mut self, msg: &str) {
        self.results
            .borrow_mut()
            .push((SpinnerStatus::Error, msg.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_messages() {
        let mut ui = MockUI::new();
        ui.message("hello");
        ui.success("ok");
        ui.warning("careful");
        ui.error("bad");

        assert_eq!(ui.messages(), ["hello"]);
        assert!(ui.has_success("ok"));
        assert!(ui.has_warning("careful"));
        assert!(ui.has_error("bad"));
        assert_eq!(ui.line_count(), 4);
    }

    #[test]
    fn spinner_results_flow_back() {
        let mut ui = MockUI::new();
        let mut spinner = ui.start_spinner("Caching gems");
        spinner.finish_warning("cache failed");

        assert_eq!(ui.spinners(), ["Caching gems"]);
        assert_eq!(
            ui.spinner_results(),
            vec![(SpinnerStatus::Warning, "cache failed".to_string())]
        );
        assert!(ui.has_warning("cache failed"));
    }

    #[test]
    fn command_output_only_in_verbose() {
        let mut normal = MockUI::new();
        normal.command_output("Bundle complete!");
        assert!(normal.raw_output().is_empty());

        let mut verbose = MockUI::with_mode(OutputMode::Verbose);
        verbose.command_output("Bundle complete!");
        assert!(verbose.has_raw("Bundle complete!"));
    }

    #[test]
    fn captures_error_blocks() {
        let mut ui = MockUI::new();
        ui.show_error_block("bundle install", "boom", Some("check network"));
        assert_eq!(
            ui.error_blocks(),
            [(
                "bundle install".to_string(),
                "boom".to_string(),
                Some("check network".to_string())
            )]
        );
    }
}
