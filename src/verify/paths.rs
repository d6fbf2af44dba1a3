//! Install-root audit of `bundle list --paths` output.

use serde::Serialize;
use std::path::Path;

/// Result of comparing installed gem paths against the expected root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathAudit {
    /// Expected root, as compared.
    pub expected_root: String,
    /// Number of non-empty lines checked.
    pub checked: usize,
    /// Lines that do not start with `expected_root`.
    pub outside: Vec<String>,
}

impl PathAudit {
    /// Check if every path was under the root.
    pub fn is_clean(&self) -> bool {
        self.outside.is_empty()
    }
}

/// Check that every non-empty line of `listing` has `expected_root` as a
/// literal string prefix.
///
/// The comparison is purely textual, so `/app/vendor/bundle2` counts as
/// under `/app/vendor/bundle`.
pub fn audit_paths(listing: &str, expected_root: &Path) -> PathAudit {
    let root = expected_root.to_string_lossy().to_string();
    let mut checked = 0;
    let mut outside = Vec::new();

    for line in listing.lines().filter(|l| !l.is_empty()) {
        checked += 1;
        if !line.starts_with(&root) {
            tracing::debug!("{} is outside {}", line, root);
            outside.push(line.to_string());
        }
    }

    PathAudit {
        expected_root: root,
        checked,
        outside,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOT: &str = "/app/vendor/bundle";

    #[test]
    fn all_under_root_is_clean() {
        let listing = "/app/vendor/bundle/ruby/3.3.0/gems/rack-3.1.7\n\
                       /app/vendor/bundle/ruby/3.3.0/gems/rake-13.2.1\n";
        let audit = audit_paths(listing, Path::new(ROOT));
        assert!(audit.is_clean());
        assert_eq!(audit.checked, 2);
    }

    #[test]
    fn system_gem_is_reported() {
        let listing = "/app/vendor/bundle/ruby/3.3.0/gems/rack-3.1.7\n\
                       /usr/lib/ruby/gems/3.3.0/gems/bundler-2.5.16\n";
        let audit = audit_paths(listing, Path::new(ROOT));
        assert!(!audit.is_clean());
        assert_eq!(
            audit.outside,
            vec!["/usr/lib/ruby/gems/3.3.0/gems/bundler-2.5.16"]
        );
    }

    #[test]
    fn empty_lines_are_skipped() {
        let audit = audit_paths("\n\n/app/vendor/bundle/x\n\n", Path::new(ROOT));
        assert!(audit.is_clean());
        assert_eq!(audit.checked, 1);
    }

    #[test]
    fn empty_listing_is_clean() {
        let audit = audit_paths("", Path::new(ROOT));
        assert!(audit.is_clean());
        assert_eq!(audit.checked, 0);
    }

    #[test]
    fn prefix_is_literal() {
        let audit = audit_paths("/app/vendor/bundle2/gems/x\n", Path::new(ROOT));
        assert!(audit.is_clean());
    }

    #[test]
    fn relative_line_is_outside() {
        let audit = audit_paths("vendor/bundle/gems/x\n", Path::new(ROOT));
        assert_eq!(audit.outside.len(), 1);
    }

    #[test]
    fn whitespace_only_line_is_checked() {
        let audit = audit_paths("  \n", Path::new(ROOT));
        assert_eq!(audit.checked, 1);
        assert!(!audit.is_clean());
    }
}
