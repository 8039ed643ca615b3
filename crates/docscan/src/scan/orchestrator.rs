//! Drives one scan: walk, change detection, per-file processing, store
//! writes, and failure bookkeeping.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, info_span, warn};

use crate::db::{DatabaseError, DocumentStore};
use crate::sanitize;

use super::detector::ChangeDetector;
use super::outcome::{FailureKind, FileFailure, FileStatus, ScanReport};
use super::pipeline::FileProcessor;
use super::progress::{ProgressReporter, ScanEvent};
use super::walker::{self, ExtensionFilter, WalkEntry};

/// Tracks store health across a scan so a dead store ends the scan instead
/// of failing every remaining file.
struct StorageHealth {
    consecutive_failures: usize,
    limit: usize,
    fatal: bool,
}

impl StorageHealth {
    fn new(limit: usize) -> Self {
        Self {
            consecutive_failures: 0,
            limit: limit.max(1),
            fatal: false,
        }
    }

    fn observe<T>(&mut self, result: Result<T, DatabaseError>) -> Result<T, DatabaseError> {
        match &result {
            Ok(_) => self.consecutive_failures = 0,
            Err(e) => {
                self.consecutive_failures += 1;
                if e.is_unrecoverable() {
                    self.fatal = true;
                }
            }
        }
        result
    }

    fn should_abort(&self) -> bool {
        self.fatal || self.consecutive_failures >= self.limit
    }
}

pub struct Scanner {
    store: Arc<dyn DocumentStore>,
    processor: FileProcessor,
    filter: ExtensionFilter,
    max_consecutive_storage_failures: usize,
}

impl Scanner {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        processor: FileProcessor,
        filter: ExtensionFilter,
        max_consecutive_storage_failures: usize,
    ) -> Self {
        Self {
            store,
            processor,
            filter,
            max_consecutive_storage_failures,
        }
    }

    /// Scans `root` to completion. Per-file failures are recorded and the
    /// walk moves on; only a failing store stops it early.
    pub fn run(&self, scan_id: &str, root: &Path, progress: &dyn ProgressReporter) -> ScanReport {
        let _span = info_span!("scan",
            scan_id = %scan_id,
            root = %sanitize::redact_path(root),
            root_hash = %sanitize::hash_path(root),
        )
        .entered();

        info!("Scan started");
        progress.report(ScanEvent::Started {
            scan_id: scan_id.to_string(),
            root: root.display().to_string(),
        });

        let mut report = ScanReport::default();
        let mut health = StorageHealth::new(self.max_consecutive_storage_failures);

        for entry in walker::walk(root, &self.filter) {
            let (path, status) = match entry {
                WalkEntry::Eligible(path) => {
                    let status = self.visit(&path, &mut health);
                    (path.display().to_string(), status)
                }
                WalkEntry::Unreadable { path, message } => {
                    let path = self.record_unreadable(path.as_deref(), &message, &mut health);
                    (path, FileStatus::Failed(FailureKind::Io))
                }
            };

            report.record(status);
            progress.report(ScanEvent::File {
                scan_id: scan_id.to_string(),
                path,
                status,
            });

            if health.should_abort() {
                report.aborted = true;
                error!(
                    consecutive_failures = health.consecutive_failures,
                    "Document store unusable, aborting scan"
                );
                break;
            }
        }

        info!(
            discovered = report.discovered,
            skipped = report.skipped,
            processed = report.processed,
            failed = report.failed,
            attempted = report.attempted,
            aborted = report.aborted,
            "Scan finished"
        );
        progress.report(ScanEvent::Finished {
            scan_id: scan_id.to_string(),
            report: report.clone(),
        });

        report
    }

    fn visit(&self, path: &Path, health: &mut StorageHealth) -> FileStatus {
        let _span = info_span!("file",
            file = %sanitize::redact_path(path),
            path_hash = %sanitize::hash_path(path),
        )
        .entered();

        match self.attempt(path, health) {
            Ok(status) => status,
            Err(failure) => {
                warn!(kind = %failure.kind, "File failed: {}", failure.message);
                self.mark_failed(path, &failure, health);
                FileStatus::Failed(failure.kind)
            }
        }
    }

    /// `Discovered -> (Skip | Attempt)`, then `Attempt -> Processed` on success.
    fn attempt(&self, path: &Path, health: &mut StorageHealth) -> Result<FileStatus, FileFailure> {
        let key = path.to_string_lossy();
        let fs_modified = modified_time(path)?;

        let detector = ChangeDetector::new(self.store.as_ref());
        if !health.observe(detector.should_process(&key, fs_modified))? {
            debug!("Unchanged since last scan, skipping");
            return Ok(FileStatus::Skipped);
        }

        let record = self.processor.process(path, fs_modified)?;
        health.observe(self.store.upsert(&record))?;

        debug!(
            category = record.category.as_deref().unwrap_or_default(),
            language = record.language.as_deref().unwrap_or_default(),
            "File processed"
        );
        Ok(FileStatus::Processed)
    }

    fn mark_failed(&self, path: &Path, failure: &FileFailure, health: &mut StorageHealth) {
        let key = path.to_string_lossy();
        if let Err(e) = health.observe(self.store.mark_failed(&key, &failure.to_string())) {
            error!("Failed to record failure for {}: {}", sanitize::redact_path(path), e);
        }
    }

    /// Walk errors are failures of the entry that could not be read. Only
    /// entries that would have been scanned get a `Failed` record.
    fn record_unreadable(
        &self,
        path: Option<&Path>,
        message: &str,
        health: &mut StorageHealth,
    ) -> String {
        warn!("Unreadable entry: {}", message);
        match path {
            Some(path) => {
                if self.filter.matches(path) {
                    let failure = FileFailure::new(FailureKind::Io, message);
                    self.mark_failed(path, &failure, health);
                }
                path.display().to_string()
            }
            None => String::new(),
        }
    }
}

fn modified_time(path: &Path) -> Result<DateTime<Utc>, FileFailure> {
    std::fs::metadata(path)
        .and_then(|m| m.modified())
        .map(DateTime::<Utc>::from)
        .map_err(|e| FileFailure::new(FailureKind::Io, format!("Failed to stat file: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_health_resets_on_success() {
        let mut health = StorageHealth::new(3);
        let _ = health.observe::<()>(Err(DatabaseError::Corrupt {
            column: "status",
            value: "?".into(),
        }));
        let _ = health.observe::<()>(Err(DatabaseError::Corrupt {
            column: "status",
            value: "?".into(),
        }));
        assert!(!health.should_abort());
        let _ = health.observe(Ok(()));
        assert_eq!(health.consecutive_failures, 0);
    }

    #[test]
    fn test_storage_health_limit_and_fatal() {
        let mut health = StorageHealth::new(2);
        for _ in 0..2 {
            let _ = health.observe::<()>(Err(DatabaseError::Corrupt {
                column: "status",
                value: "?".into(),
            }));
        }
        assert!(health.should_abort());

        let mut health = StorageHealth::new(10);
        let _ = health.observe::<()>(Err(DatabaseError::LockPoisoned));
        assert!(health.should_abort());
    }

    #[test]
    fn test_modified_time_missing_file() {
        let failure = modified_time(Path::new("/nonexistent/a.pdf")).unwrap_err();
        assert_eq!(failure.kind, FailureKind::Io);
    }
}
