//! Where scans may run: containment checks against the configured base
//! directory and listing of its subdirectories.

use std::path::{Component, Path, PathBuf};

use crate::error::ScanRequestError;

/// Resolves `.` and `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Checks that `requested` names an existing directory inside `base` and
/// returns its canonical form.
///
/// Relative paths are resolved against the working directory. Containment
/// is checked on the normalized path first (so nothing outside `base` is
/// ever stat'ed), then again on the canonical path so symlinks cannot lead
/// out of `base`.
pub fn validate_scan_path(base: &Path, requested: &Path) -> Result<PathBuf, ScanRequestError> {
    let disallowed = || ScanRequestError::Disallowed {
        path: requested.to_path_buf(),
        base: base.to_path_buf(),
    };

    let absolute = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(|_| disallowed())?
            .join(requested)
    };

    let normalized = normalize(&absolute);
    if !normalized.starts_with(normalize(base)) {
        return Err(disallowed());
    }

    if !normalized.is_dir() {
        return Err(ScanRequestError::NotFound(requested.to_path_buf()));
    }

    let canonical = normalized
        .canonicalize()
        .map_err(|_| ScanRequestError::NotFound(requested.to_path_buf()))?;
    let canonical_base = base.canonicalize().map_err(|_| disallowed())?;
    if !canonical.starts_with(&canonical_base) {
        return Err(disallowed());
    }

    Ok(canonical)
}

/// Immediate subdirectories of `base`, sorted. A missing or unreadable
/// base yields no locations.
pub fn list_scan_locations(base: &Path) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(base) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::debug!("No scan locations under {}: {}", base.display(), e);
            return Vec::new();
        }
    };

    let mut locations: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    locations.sort();
    locations
}
