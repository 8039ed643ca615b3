//! Path redaction for span attributes.
//!
//! Scan targets are shared drives with client names in their directory
//! structure. Spans carry the last path component and a hash of the full
//! path; full paths only go to the store and to debug-level messages.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;

/// Last component of `path`, or `"/"` for a root.
pub fn redact_path(path: &Path) -> String {
    match path.file_name() {
        Some(name) => name.to_string_lossy().into_owned(),
        None => "/".to_string(),
    }
}

/// 12 hex digits, stable within one build.
pub fn hash_path(path: &Path) -> String {
    let mut hasher = DefaultHasher::new();
    path.hash(&mut hasher);
    let digest = format!("{:016x}", hasher.finish());
    digest[..12].to_string()
}
