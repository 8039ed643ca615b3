//! In-process extraction for formats with a pure-Rust parser.

mod ooxml;
mod pdf;

use std::path::Path;

use super::{non_empty_len, require_text, ExtractError, Extraction, Extractor};
use crate::sanitize::redact_path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Xlsx,
    Doc,
    Xls,
    Wpd,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "xlsx" => Some(Self::Xlsx),
            "doc" => Some(Self::Doc),
            "xls" => Some(Self::Xls),
            "wpd" => Some(Self::Wpd),
            _ => None,
        }
    }
}

pub struct LocalExtractor;

impl LocalExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LocalExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor for LocalExtractor {
    fn extract(&self, path: &Path) -> Result<Extraction, ExtractError> {
        let _span = tracing::info_span!("extract.local", file = %redact_path(path)).entered();

        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let format = DocumentFormat::from_extension(extension)
            .ok_or_else(|| ExtractError::UnsupportedFormat(extension.to_string()))?;

        non_empty_len(path)?;

        let extraction = match format {
            DocumentFormat::Pdf => pdf::extract(path)?,
            DocumentFormat::Docx => ooxml::extract_docx(path)?,
            DocumentFormat::Xlsx => ooxml::extract_xlsx(path)?,
            // Legacy binary formats need the Tika backend.
            DocumentFormat::Doc | DocumentFormat::Xls | DocumentFormat::Wpd => {
                return Err(ExtractError::UnsupportedFormat(extension.to_string()))
            }
        };

        Ok(Extraction {
            text: require_text(extraction.text)?,
            metadata: extraction.metadata,
        })
    }
}
