//! Test doubles for the extractor, classifier and store seams.

#![allow(dead_code)]

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex};

use chrono::{DateTime, Utc};

use docscan::classify::{ClassifyError, Prediction};
use docscan::db::{DatabaseError, DocumentRecord, Watermark};
use docscan::extract::{DocumentMetadata, ExtractError};
use docscan::{Classifier, Database, DocumentStore, Extraction, Extractor};

/// Treats every file as UTF-8 text. Zero-byte files are empty content, and
/// failures can be scripted per file name.
#[derive(Default)]
pub struct ScriptedExtractor {
    failures: Mutex<HashMap<String, String>>,
    metadata: Mutex<HashMap<String, DocumentMetadata>>,
    calls: Mutex<Vec<PathBuf>>,
}

impl ScriptedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes extraction of `file_name` fail with an unavailable-service error.
    pub fn fail_on(&self, file_name: &str, message: &str) {
        self.failures
            .lock()
            .unwrap()
            .insert(file_name.to_string(), message.to_string());
    }

    pub fn clear_failures(&self) {
        self.failures.lock().unwrap().clear();
    }

    pub fn with_metadata(
        &self,
        file_name: &str,
        created_at: Option<DateTime<Utc>>,
        author: Option<&str>,
    ) {
        self.metadata.lock().unwrap().insert(
            file_name.to_string(),
            DocumentMetadata {
                created_at,
                author: author.map(str::to_string),
            },
        );
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

impl Extractor for ScriptedExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractError> {
        self.calls.lock().unwrap().push(path.to_path_buf());
        let name = file_name(path);

        if let Some(message) = self.failures.lock().unwrap().get(&name) {
            return Err(ExtractError::ServiceUnavailable(message.clone()));
        }

        let bytes = std::fs::read(path).map_err(|e| ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        if bytes.is_empty() {
            return Err(ExtractError::EmptyContent);
        }

        Ok(Extraction {
            text: String::from_utf8_lossy(&bytes).into_owned(),
            metadata: self
                .metadata
                .lock()
                .unwrap()
                .get(&name)
                .cloned()
                .unwrap_or_default(),
        })
    }
}

/// Picks the first label whose keyword occurs in the text.
pub struct KeywordClassifier {
    rules: Vec<(&'static str, &'static str, f64)>,
    fallback: (&'static str, f64),
}

impl KeywordClassifier {
    pub fn new(
        rules: Vec<(&'static str, &'static str, f64)>,
        fallback: (&'static str, f64),
    ) -> Self {
        Self { rules, fallback }
    }

    /// Classifies everything as `label` with `confidence`.
    pub fn constant(label: &'static str, confidence: f64) -> Self {
        Self::new(vec![], (label, confidence))
    }
}

impl Classifier for KeywordClassifier {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifyError> {
        let lower = text.to_lowercase();
        let (label, confidence) = self
            .rules
            .iter()
            .find(|(keyword, _, _)| lower.contains(keyword))
            .map(|(_, label, confidence)| (*label, *confidence))
            .unwrap_or(self.fallback);
        Ok(Prediction {
            label: label.to_string(),
            confidence,
        })
    }
}

/// Blocks every extraction until `open` is called.
#[derive(Default)]
pub struct GatedExtractor {
    open: Mutex<bool>,
    opened: Condvar,
    inner: ScriptedExtractor,
}

impl GatedExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&self) {
        *self.open.lock().unwrap() = true;
        self.opened.notify_all();
    }
}

impl Extractor for GatedExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractError> {
        let mut open = self.open.lock().unwrap();
        while !*open {
            open = self.opened.wait(open).unwrap();
        }
        drop(open);
        self.inner.extract(path)
    }
}

/// Wraps a real database and fails the first `failures` upserts.
pub struct FlakyStore {
    db: Database,
    remaining_failures: AtomicUsize,
}

impl FlakyStore {
    pub fn new(db: Database, failures: usize) -> Self {
        Self {
            db,
            remaining_failures: AtomicUsize::new(failures),
        }
    }
}

impl DocumentStore for FlakyStore {
    fn find_watermark(&self, path: &str) -> Result<Option<Watermark>, DatabaseError> {
        self.db.find_watermark(path)
    }

    fn upsert(&self, record: &DocumentRecord) -> Result<(), DatabaseError> {
        let failed = self
            .remaining_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(DatabaseError::Corrupt {
                column: "content",
                value: "simulated write failure".to_string(),
            });
        }
        self.db.upsert(record)
    }

    fn mark_failed(&self, path: &str, error: &str) -> Result<(), DatabaseError> {
        self.db.mark_failed(path, error)
    }
}

/// A store whose every call fails, either recoverably or with a poisoned lock.
pub struct BrokenStore {
    poisoned: bool,
    pub calls: AtomicUsize,
}

impl BrokenStore {
    pub fn recoverable() -> Self {
        Self {
            poisoned: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn poisoned() -> Self {
        Self {
            poisoned: true,
            calls: AtomicUsize::new(0),
        }
    }

    fn fail<T>(&self) -> Result<T, DatabaseError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.poisoned {
            Err(DatabaseError::LockPoisoned)
        } else {
            Err(DatabaseError::Corrupt {
                column: "status",
                value: "simulated read failure".to_string(),
            })
        }
    }
}

impl DocumentStore for BrokenStore {
    fn find_watermark(&self, _path: &str) -> Result<Option<Watermark>, DatabaseError> {
        self.fail()
    }

    fn upsert(&self, _record: &DocumentRecord) -> Result<(), DatabaseError> {
        self.fail()
    }

    fn mark_failed(&self, _path: &str, _error: &str) -> Result<(), DatabaseError> {
        self.fail()
    }
}
