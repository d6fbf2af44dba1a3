//! Native extension linkage audit.
//!
//! Every `*.so` under the install root is passed to `ldd`. Each reported
//! dependency whose *resolved path* starts with a deny prefix (and no allow
//! prefix) is flagged. The rest of the `ldd` line is never searched, so a
//! path that merely contains `/usr/lib` somewhere in the middle is fine.

use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use crate::bundler::{commands, Bundler};
use crate::config::LinkageRules;

/// `name [=> target] [(0xaddr)]`; the target may contain spaces.
static LDD_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<name>\S+)(?:\s+=>\s*(?P<target>not found|/[^(]*?)?)?\s*(?:\(0x[0-9a-fA-F]+\))?\s*$",
    )
    .expect("ldd line pattern is valid")
});

/// One dependency from an `ldd` report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedLibrary {
    /// Soname or path as printed by `ldd`.
    pub name: String,
    /// Resolved absolute path, if `ldd` resolved one.
    pub path: Option<PathBuf>,
}

/// Parse `ldd` output into its dependencies.
///
/// Lines that are not dependency entries (`statically linked`,
/// `not a dynamic executable`) are skipped.
pub fn parse_ldd(output: &str) -> Vec<LinkedLibrary> {
    output
        .lines()
        .filter_map(|line| {
            let caps = LDD_LINE.captures(line)?;
            let name = caps.name("name")?.as_str().to_string();
            let target = caps.name("target").map(|m| m.as_str().trim());

            let path = match target {
                Some(t) if t.starts_with('/') => Some(PathBuf::from(t)),
                Some(_) => None,
                None if name.starts_with('/') => Some(PathBuf::from(&name)),
                None => None,
            };

            Some(LinkedLibrary { name, path })
        })
        .collect()
}

/// The deny prefix that `path` falls under, unless an allow prefix exempts it.
///
/// Prefixes are compared against the path string, so `/usr/lib` also covers
/// `/usr/lib64` and `/usr/libexec`.
pub fn denied_prefix<'r>(rules: &'r LinkageRules, path: &Path) -> Option<&'r str> {
    let path = path.to_string_lossy();
    if rules.allow.iter().any(|a| path.starts_with(a.as_str())) {
        return None;
    }
    rules
        .deny
        .iter()
        .find(|d| path.starts_with(d.as_str()))
        .map(String::as_str)
}

/// A dependency that resolved to a denied location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlaggedLibrary {
    pub name: String,
    pub path: PathBuf,
    /// The deny prefix it matched.
    pub rule: String,
}

/// All flagged dependencies of one shared object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkageFinding {
    pub artifact: PathBuf,
    pub flagged: Vec<FlaggedLibrary>,
}

/// Result of auditing every shared object under the install root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkageAudit {
    /// Number of shared objects inspected.
    pub scanned: usize,
    /// Artifacts with at least one flagged dependency.
    pub findings: Vec<LinkageFinding>,
    /// Artifacts `ldd` could not report on.
    pub unreadable: Vec<PathBuf>,
}

impl LinkageAudit {
    /// Check if no artifact was flagged.
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Flag the dependencies in one `ldd` report.
pub fn check_report(rules: &LinkageRules, report: &str) -> Vec<FlaggedLibrary> {
    parse_ldd(report)
        .into_iter()
        .filter_map(|lib| {
            let path = lib.path?;
            let rule = denied_prefix(rules, &path)?.to_string();
            Some(FlaggedLibrary {
                name: lib.name,
                path,
                rule,
            })
        })
        .collect()
}

/// Every regular `*.so` file under `root`, sorted.
///
/// Symlinks are not followed. Unreadable directories and a missing root
/// contribute nothing.
pub fn find_shared_objects(root: &Path) -> Vec<PathBuf> {
    let mut found = Vec::new();
    let mut pending = vec![root.to_path_buf()];

    while let Some(dir) = pending.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::debug!("Skipping {}: {}", dir.display(), e);
                continue;
            }
        };

        for entry in entries.filter_map(|e| e.ok()) {
            let Ok(file_type) = entry.file_type() else {
                continue;
            };
            let path = entry.path();
            if file_type.is_dir() {
                pending.push(path);
            } else if file_type.is_file() && entry.file_name().to_string_lossy().ends_with(".so")
            {
                found.push(path);
            }
        }
    }

    found.sort();
    found
}

/// Run `ldd` on every shared object under `root` and flag denied linkage.
///
/// An `ldd` failure on one artifact is logged and the artifact is recorded
/// as unreadable rather than flagged.
pub fn audit_linkage(bundler: &mut Bundler<'_>, rules: &LinkageRules, root: &Path) -> LinkageAudit {
    let mut audit = LinkageAudit::default();

    for artifact in find_shared_objects(root) {
        audit.scanned += 1;
        let report = match bundler.run(&commands::ldd(&artifact)) {
            Ok(result) if result.success => result.stdout,
            Ok(result) => {
                tracing::warn!(
                    "ldd failed on {} ({:?}): {}",
                    artifact.display(),
                    result.exit_code,
                    result.stderr.trim()
                );
                audit.unreadable.push(artifact);
                continue;
            }
            Err(e) => {
                tracing::warn!("ldd unavailable for {}: {}", artifact.display(), e);
                audit.unreadable.push(artifact);
                continue;
            }
        };

        let flagged = check_report(rules, &report);
        if !flagged.is_empty() {
            audit.findings.push(LinkageFinding { artifact, flagged });
        }
    }

    audit
}
