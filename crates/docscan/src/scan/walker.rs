use std::collections::HashSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Case-insensitive extension allow-list.
#[derive(Debug, Clone)]
pub struct ExtensionFilter {
    extensions: HashSet<String>,
}

impl ExtensionFilter {
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
        }
    }

    /// Matches on the file-name suffix, so a file named just `.pdf` counts.
    pub fn matches(&self, path: &Path) -> bool {
        let name = match path.file_name() {
            Some(name) => name.to_string_lossy().to_ascii_lowercase(),
            None => return false,
        };
        match name.rfind('.') {
            Some(dot) => self.extensions.contains(&name[dot + 1..]),
            None => false,
        }
    }
}

#[derive(Debug)]
pub enum WalkEntry {
    /// A regular file with an allowed extension.
    Eligible(PathBuf),
    /// An entry the walk could not read. The walk continues past it.
    Unreadable {
        path: Option<PathBuf>,
        message: String,
    },
}

/// Recursively yields eligible files under `root`, in file-name order
/// within each directory. Symlinks to files are yielded under the link's
/// path; symlinked directories are not descended into.
pub fn walk<'a>(root: &Path, filter: &'a ExtensionFilter) -> impl Iterator<Item = WalkEntry> + 'a {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(move |entry| match entry {
            Ok(entry) => {
                let path = entry.path();
                if path.is_file() && filter.matches(path) {
                    Some(WalkEntry::Eligible(path.to_path_buf()))
                } else {
                    None
                }
            }
            Err(e) => Some(WalkEntry::Unreadable {
                path: e.path().map(Path::to_path_buf),
                message: e.to_string(),
            }),
        })
}
