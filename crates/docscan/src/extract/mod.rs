//! Text extraction: file path in, plain text plus origin metadata out.
//!
//! Two backends implement [`Extractor`]: [`TikaExtractor`] streams files to
//! an Apache Tika server, [`LocalExtractor`] parses pdf/docx/xlsx in-process.
//! Neither retries. A failed file is retried by the next scan.

pub mod error;
pub mod local;
pub mod metadata;
pub mod tika;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ExtractionBackend, ExtractionConfig};

pub use error::ExtractError;
pub use local::LocalExtractor;
pub use metadata::DocumentMetadata;
pub use tika::TikaExtractor;

/// Output of a successful extraction. `text` is never blank.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub text: String,
    pub metadata: DocumentMetadata,
}

pub trait Extractor: Send + Sync {
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractError>;
}

/// Builds the extractor selected in the configuration.
pub fn build_extractor(config: &ExtractionConfig) -> Result<Arc<dyn Extractor>, ExtractError> {
    match config.backend {
        ExtractionBackend::Tika => Ok(Arc::new(TikaExtractor::new(
            &config.tika_url,
            Duration::from_secs(config.timeout_secs),
            config.fetch_metadata,
        )?)),
        ExtractionBackend::Local => Ok(Arc::new(LocalExtractor::new())),
    }
}

/// Size of the file at `path`; zero-byte files are rejected as empty before
/// any backend is involved.
pub(crate) fn non_empty_len(path: &Path) -> Result<u64, ExtractError> {
    let len = std::fs::metadata(path)
        .map_err(|e| ExtractError::Io {
            path: path.to_path_buf(),
            source: e,
        })?
        .len();
    if len == 0 {
        return Err(ExtractError::EmptyContent);
    }
    Ok(len)
}

/// Rejects whitespace-only text.
pub(crate) fn require_text(text: String) -> Result<String, ExtractError> {
    if text.trim().is_empty() {
        Err(ExtractError::EmptyContent)
    } else {
        Ok(text)
    }
}
