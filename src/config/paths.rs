//! Absolute path derivation.
//!
//! Both `bootstrap` and `verify` derive the expected install root through
//! [`expand_path`], so the same `BUNDLE_PATH` always yields the same root.

use std::path::{Component, Path, PathBuf};

/// Expand `value` into an absolute path the way Ruby's `File.expand_path`
/// does.
///
/// - `~` and `~/rest` expand against `$HOME`
/// - relative paths are joined onto `base`
/// - `.` and `..` components are removed lexically (no symlink resolution)
///
/// # Example
///
/// ```
/// use bundlekit::config::expand_path;
/// use std::path::{Path, PathBuf};
///
/// let root = expand_path("vendor/bundle", Path::new("/srv/app"));
/// assert_eq!(root, PathBuf::from("/srv/app/vendor/bundle"));
///
/// let up = expand_path("../shared/./bundle/", Path::new("/srv/app"));
/// assert_eq!(up, PathBuf::from("/srv/shared/bundle"));
/// ```
pub fn expand_path(value: &str, base: &Path) -> PathBuf {
    let home = std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from);
    expand_path_with_home(value, base, home.as_deref())
}

/// [`expand_path`] with an explicit home directory.
///
/// A `~` prefix is kept literally when `home` is `None`.
pub fn expand_path_with_home(value: &str, base: &Path, home: Option<&Path>) -> PathBuf {
    let raw = match home {
        Some(home) if value == "~" => home.to_path_buf(),
        Some(home) => match value.strip_prefix("~/") {
            Some(rest) => home.join(rest),
            None => PathBuf::from(value),
        },
        None => PathBuf::from(value),
    };

    let joined = if raw.is_absolute() {
        raw
    } else {
        base.join(raw)
    };

    normalize(&joined)
}

/// Remove `.` and `..` components without touching the filesystem.
///
/// `..` never climbs above the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => out.push(component.as_os_str()),
            Component::CurDir => {}
            Component::ParentDir => {
                if out.parent().is_some() {
                    out.pop();
                }
            }
            Component::Normal(part) => out.push(part),
        }
    }
    out
}
