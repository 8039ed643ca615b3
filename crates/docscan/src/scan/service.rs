//! Application context: owns the store, extractor, classifier and
//! detector, accepts scan requests and answers queries.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::broadcast;
use tracing::{error, info};

use crate::classify::{Classifier, LanguageDetector, LinearModel, StopwordDetector};
use crate::config::Config;
use crate::db::{
    document_repo, Database, DatabaseError, DocumentStats, DocumentStore, DocumentSummary,
    StoredDocument,
};
use crate::error::{DocscanError, ScanRequestError, WorkerError};
use crate::extract::{build_extractor, Extractor};
use crate::sanitize;

use super::locations::{list_scan_locations, validate_scan_path};
use super::orchestrator::Scanner;
use super::outcome::ScanReport;
use super::pipeline::FileProcessor;
use super::progress::{BroadcastProgress, ScanEvent};
use super::walker::ExtensionFilter;

const EVENT_CAPACITY: usize = 256;

/// A running scan. Dropping the handle detaches the worker; the scan still
/// runs to completion.
pub struct ScanHandle {
    id: String,
    root: PathBuf,
    handle: JoinHandle<ScanReport>,
}

impl ScanHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Canonical root directory being scanned.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the scan completes.
    pub fn join(self) -> Result<ScanReport, WorkerError> {
        self.handle
            .join()
            .map_err(|_| WorkerError::Panicked(self.id))
    }
}

/// One reserved unit of scan concurrency, released on drop.
struct ScanSlot(Arc<AtomicUsize>);

impl ScanSlot {
    fn acquire(active: &Arc<AtomicUsize>, limit: usize) -> Option<Self> {
        active
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < limit).then_some(n + 1))
            .ok()
            .map(|_| Self(Arc::clone(active)))
    }
}

impl Drop for ScanSlot {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

pub struct ScanService {
    db: Database,
    store: Arc<dyn DocumentStore>,
    extractor: Arc<dyn Extractor>,
    classifier: Option<Arc<dyn Classifier>>,
    detector: Arc<dyn LanguageDetector>,
    base_directory: PathBuf,
    filter: ExtensionFilter,
    prefix_chars: usize,
    max_concurrent_scans: usize,
    max_consecutive_storage_failures: usize,
    active_scans: Arc<AtomicUsize>,
    events: Arc<broadcast::Sender<ScanEvent>>,
}

impl ScanService {
    /// Production constructor. A missing or invalid classifier model is
    /// logged and disables scanning; queries keep working.
    pub fn from_config(config: &Config) -> Result<Self, DocscanError> {
        let db = Database::open(&config.database_path)?;
        let extractor = build_extractor(&config.extraction)?;
        let classifier = match LinearModel::load(&config.model_path) {
            Ok(model) => Some(Arc::new(model) as Arc<dyn Classifier>),
            Err(e) => {
                error!("Classifier unavailable, scanning disabled: {}", e);
                None
            }
        };

        Ok(Self::new(
            config,
            db,
            extractor,
            classifier,
            Arc::new(StopwordDetector::new()),
        ))
    }

    pub fn new(
        config: &Config,
        db: Database,
        extractor: Arc<dyn Extractor>,
        classifier: Option<Arc<dyn Classifier>>,
        detector: Arc<dyn LanguageDetector>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            store: Arc::new(db.clone()),
            db,
            extractor,
            classifier,
            detector,
            base_directory: config.scan_base_directory.clone(),
            filter: ExtensionFilter::new(&config.extensions),
            prefix_chars: config.language.prefix_chars,
            max_concurrent_scans: config.scan.max_concurrent_scans,
            max_consecutive_storage_failures: config.scan.max_consecutive_storage_failures,
            active_scans: Arc::new(AtomicUsize::new(0)),
            events: Arc::new(events),
        }
    }

    /// Routes scan writes through `store` instead of the database handle.
    /// Queries still read the database.
    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = store;
        self
    }

    pub fn classifier_ready(&self) -> bool {
        self.classifier.is_some()
    }

    pub fn base_directory(&self) -> &Path {
        &self.base_directory
    }

    pub fn active_scans(&self) -> usize {
        self.active_scans.load(Ordering::SeqCst)
    }

    /// Progress events of every scan started after subscribing.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanEvent> {
        self.events.subscribe()
    }

    /// Validates the request and starts a scan on its own worker thread.
    /// Returns as soon as the worker is running.
    pub fn trigger_scan(&self, requested: &Path) -> Result<ScanHandle, ScanRequestError> {
        let classifier = self
            .classifier
            .as_ref()
            .ok_or(ScanRequestError::ClassifierUnavailable)?;

        let root = validate_scan_path(&self.base_directory, requested)?;

        let slot = ScanSlot::acquire(&self.active_scans, self.max_concurrent_scans).ok_or(
            ScanRequestError::TooManyScans {
                limit: self.max_concurrent_scans,
            },
        )?;

        let scanner = Scanner::new(
            Arc::clone(&self.store),
            FileProcessor::new(
                Arc::clone(&self.extractor),
                Arc::clone(classifier),
                Arc::clone(&self.detector),
                self.prefix_chars,
            ),
            self.filter.clone(),
            self.max_consecutive_storage_failures,
        );
        let progress = BroadcastProgress::new(Arc::clone(&self.events));

        let id = uuid::Uuid::new_v4().to_string();
        let worker_id = id.clone();
        let worker_root = root.clone();
        let handle = thread::Builder::new()
            .name(format!("scan-{}", &id[..8]))
            .spawn(move || {
                let _slot = slot;
                scanner.run(&worker_id, &worker_root, &progress)
            })
            .map_err(WorkerError::SpawnFailed)?;

        info!(
            scan_id = %id,
            root = %sanitize::redact_path(&root),
            "Scan accepted"
        );

        Ok(ScanHandle { id, root, handle })
    }

    pub fn scan_locations(&self) -> Vec<PathBuf> {
        list_scan_locations(&self.base_directory)
    }

    pub fn list_processed(&self) -> Result<Vec<DocumentSummary>, DatabaseError> {
        document_repo::list_processed(&self.db)
    }

    pub fn count_by_category(&self) -> Result<BTreeMap<String, u64>, DatabaseError> {
        document_repo::count_by_category(&self.db)
    }

    pub fn stats(&self) -> Result<DocumentStats, DatabaseError> {
        document_repo::stats(&self.db)
    }

    pub fn export_all(&self) -> Result<Vec<StoredDocument>, DatabaseError> {
        document_repo::export_all(&self.db)
    }

    /// Writes the full table as CSV and returns the number of rows written.
    pub fn export_csv<W: Write>(&self, writer: W) -> Result<usize, DocscanError> {
        let documents = self.export_all()?;
        crate::export::write_csv(&documents, writer)?;
        Ok(documents.len())
    }
}
