use std::fmt;

use serde::Serialize;

use crate::classify::ClassifyError;
use crate::db::DatabaseError;
use crate::extract::ExtractError;

/// Why a single file ended up `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    Io,
    Extraction,
    EmptyContent,
    Classification,
    Storage,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Io => "io",
            FailureKind::Extraction => "extraction",
            FailureKind::EmptyContent => "empty_content",
            FailureKind::Classification => "classification",
            FailureKind::Storage => "storage",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl FileFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// `"<kind>: <message>"`, the form stored in a record's `error` column.
impl fmt::Display for FileFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl From<ExtractError> for FileFailure {
    fn from(e: ExtractError) -> Self {
        // A document the backend cannot turn into text counts as empty;
        // `Extraction` is reserved for backend and transport failures.
        let kind = match e {
            ExtractError::EmptyContent
            | ExtractError::Parse(_)
            | ExtractError::UnsupportedFormat(_) => FailureKind::EmptyContent,
            ExtractError::Io { .. } => FailureKind::Io,
            ExtractError::ServiceUnavailable(_) | ExtractError::Timeout(_) => {
                FailureKind::Extraction
            }
        };
        Self::new(kind, e.to_string())
    }
}

impl From<ClassifyError> for FileFailure {
    fn from(e: ClassifyError) -> Self {
        Self::new(FailureKind::Classification, e.to_string())
    }
}

impl From<DatabaseError> for FileFailure {
    fn from(e: DatabaseError) -> Self {
        Self::new(FailureKind::Storage, e.to_string())
    }
}

/// Terminal state of one file within one scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Skipped,
    Processed,
    Failed(FailureKind),
}

/// Counters for a finished scan. Unless `aborted`,
/// `discovered == skipped + attempted` and `attempted == processed + failed`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    pub discovered: usize,
    pub skipped: usize,
    pub processed: usize,
    pub failed: usize,
    pub attempted: usize,
    /// The store became unusable and the remaining files were left alone.
    pub aborted: bool,
}

impl ScanReport {
    pub(crate) fn record(&mut self, status: FileStatus) {
        self.discovered += 1;
        match status {
            FileStatus::Skipped => self.skipped += 1,
            FileStatus::Processed => {
                self.attempted += 1;
                self.processed += 1;
            }
            FileStatus::Failed(_) => {
                self.attempted += 1;
                self.failed += 1;
            }
        }
    }
}
