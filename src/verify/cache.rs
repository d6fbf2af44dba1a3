//! Local gem archive cache check.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// What the cache directory holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    /// Directory inspected.
    pub dir: PathBuf,
    /// Whether the directory exists.
    pub exists: bool,
    /// Number of `*.gem` files directly inside it.
    pub archives: usize,
}

impl CacheStatus {
    /// Check if at least one archive is present.
    pub fn is_populated(&self) -> bool {
        self.archives > 0
    }
}

/// Count `*.gem` archives directly inside `dir`.
///
/// A missing or unreadable directory counts as empty.
pub fn inspect_cache(dir: &Path) -> CacheStatus {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("Cannot read cache dir {}: {}", dir.display(), e);
            return CacheStatus {
                dir: dir.to_path_buf(),
                exists: dir.is_dir(),
                archives: 0,
            };
        }
    };

    let archives = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter(|entry| entry.file_name().to_string_lossy().ends_with(".gem"))
        .count();

    CacheStatus {
        dir: dir.to_path_buf(),
        exists: true,
        archives,
    }
}
