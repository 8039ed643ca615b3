//! Test harness for isolated scans.
//!
//! The `TestHarness` struct owns a temporary sandbox with:
//! - a scan base directory (`drives/`) and a sibling outside it (`outside/`)
//! - a file-backed database shared by scanners and services it builds

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tempfile::TempDir;

use docscan::classify::StopwordDetector;
use docscan::config::Config;
use docscan::db::{document_repo, StoredDocument};
use docscan::scan::{ExtensionFilter, FileProcessor, NoopProgress, ProgressReporter, Scanner};
use docscan::{Classifier, Database, DocumentStore, Extractor, ScanReport, ScanService};

use super::builders::ConfigBuilder;

pub struct TestHarness {
    temp_dir: TempDir,
    /// Canonical scan base directory.
    pub base_dir: PathBuf,
    /// Directory next to the base, never scannable.
    pub outside_dir: PathBuf,
    pub db_path: PathBuf,
    pub db: Database,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        // macOS temp dirs live behind a symlink; containment checks compare canonical paths.
        let root = temp_dir
            .path()
            .canonicalize()
            .expect("Failed to canonicalize temp directory");

        let base_dir = root.join("drives");
        let outside_dir = root.join("outside");
        std::fs::create_dir_all(&base_dir).expect("Failed to create base dir");
        std::fs::create_dir_all(&outside_dir).expect("Failed to create outside dir");

        let db_path = root.join("docscan.db");
        let db = Database::open(&db_path).expect("Failed to open database");

        Self {
            temp_dir,
            base_dir,
            outside_dir,
            db_path,
            db,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Configuration rooted at this sandbox.
    pub fn config_builder(&self) -> ConfigBuilder {
        ConfigBuilder::new(&self.base_dir).database_path(&self.db_path)
    }

    pub fn config(&self) -> Config {
        self.config_builder().build()
    }

    /// Writes a document below the base directory, creating parents.
    pub fn write_document(&self, relative: &str, content: &str) -> PathBuf {
        write_file(&self.base_dir.join(relative), content.as_bytes())
    }

    pub fn write_empty(&self, relative: &str) -> PathBuf {
        write_file(&self.base_dir.join(relative), b"")
    }

    pub fn write_outside(&self, relative: &str, content: &str) -> PathBuf {
        write_file(&self.outside_dir.join(relative), content.as_bytes())
    }

    /// Moves the file's modification time by `seconds` (negative goes back).
    pub fn shift_modified(&self, path: &Path, seconds: i64) {
        let current = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .expect("Failed to read mtime");
        let delta = Duration::from_secs(seconds.unsigned_abs());
        let shifted: SystemTime = if seconds >= 0 {
            current + delta
        } else {
            current - delta
        };
        std::fs::File::options()
            .write(true)
            .open(path)
            .and_then(|f| f.set_modified(shifted))
            .expect("Failed to set mtime");
    }

    /// A scanner writing to the harness database.
    pub fn scanner(
        &self,
        extractor: Arc<dyn Extractor>,
        classifier: Arc<dyn Classifier>,
    ) -> Scanner {
        self.scanner_with_store(Arc::new(self.db.clone()), extractor, classifier, 5)
    }

    pub fn scanner_with_store(
        &self,
        store: Arc<dyn DocumentStore>,
        extractor: Arc<dyn Extractor>,
        classifier: Arc<dyn Classifier>,
        max_consecutive_storage_failures: usize,
    ) -> Scanner {
        let config = self.config();
        Scanner::new(
            store,
            FileProcessor::new(
                extractor,
                classifier,
                Arc::new(StopwordDetector::new()),
                config.language.prefix_chars,
            ),
            ExtensionFilter::new(&config.extensions),
            max_consecutive_storage_failures,
        )
    }

    /// Runs a full scan of the base directory.
    pub fn scan(&self, scanner: &Scanner) -> ScanReport {
        self.scan_with(scanner, &NoopProgress)
    }

    pub fn scan_with(&self, scanner: &Scanner, progress: &dyn ProgressReporter) -> ScanReport {
        scanner.run("test-scan", &self.base_dir, progress)
    }

    pub fn service(
        &self,
        config: &Config,
        extractor: Arc<dyn Extractor>,
        classifier: Option<Arc<dyn Classifier>>,
    ) -> ScanService {
        ScanService::new(
            config,
            self.db.clone(),
            extractor,
            classifier,
            Arc::new(StopwordDetector::new()),
        )
    }

    pub fn record(&self, path: &Path) -> Option<StoredDocument> {
        document_repo::find_by_path(&self.db, &path.to_string_lossy())
            .expect("Failed to query document")
    }

    pub fn all_records(&self) -> Vec<StoredDocument> {
        document_repo::export_all(&self.db).expect("Failed to export documents")
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

fn write_file(path: &Path, content: &[u8]) -> PathBuf {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent dir");
    }
    std::fs::write(path, content).expect("Failed to write file");
    path.to_path_buf()
}
