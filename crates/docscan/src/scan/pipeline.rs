//! Per-file work: extract, normalize, tag language, classify.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info_span;

use crate::classify::{detect_language, Classifier, LanguageDetector, Prediction};
use crate::db::{DocumentRecord, DocumentStatus};
use crate::extract::Extractor;

use super::outcome::{FailureKind, FileFailure};

pub struct FileProcessor {
    extractor: Arc<dyn Extractor>,
    classifier: Arc<dyn Classifier>,
    detector: Arc<dyn LanguageDetector>,
    prefix_chars: usize,
}

impl FileProcessor {
    pub fn new(
        extractor: Arc<dyn Extractor>,
        classifier: Arc<dyn Classifier>,
        detector: Arc<dyn LanguageDetector>,
        prefix_chars: usize,
    ) -> Self {
        Self {
            extractor,
            classifier,
            detector,
            prefix_chars,
        }
    }

    /// Builds the `Processed` record for a file whose filesystem
    /// modification time is `fs_modified`.
    pub fn process(
        &self,
        path: &Path,
        fs_modified: DateTime<Utc>,
    ) -> Result<DocumentRecord, FileFailure> {
        let extraction = {
            let _step = info_span!("extract").entered();
            self.extractor.extract(path)?
        };

        let content = extraction.text.trim().to_string();
        if content.is_empty() {
            return Err(FileFailure::from(crate::extract::ExtractError::EmptyContent));
        }

        let language = {
            let _step = info_span!("detect_language").entered();
            detect_language(self.detector.as_ref(), &content, self.prefix_chars)
        };

        let prediction = {
            let _step = info_span!("classify").entered();
            self.classify(&content)?
        };

        Ok(DocumentRecord {
            path: path.to_string_lossy().into_owned(),
            created_at: extraction.metadata.created_at,
            modified_at: Some(fs_modified),
            author: extraction.metadata.author,
            content: Some(content),
            language: Some(language),
            category: Some(prediction.label),
            confidence: Some(prediction.confidence),
            status: DocumentStatus::Processed,
            error: None,
        })
    }

    /// A panicking classifier fails the file, not the scan.
    fn classify(&self, text: &str) -> Result<Prediction, FileFailure> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.classifier.classify(text))) {
            Ok(result) => Ok(result?),
            Err(_) => Err(FileFailure::new(
                FailureKind::Classification,
                "classifier panicked",
            )),
        }
    }
}
