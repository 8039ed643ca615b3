use std::path::Path;

use lopdf::{Dictionary, Document, Object};

use crate::extract::metadata::{parse_timestamp, DocumentMetadata};
use crate::extract::{ExtractError, Extraction};

pub(super) fn extract(path: &Path) -> Result<Extraction, ExtractError> {
    let bytes = std::fs::read(path).map_err(|e| ExtractError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;

    let doc = Document::load_mem(&bytes)
        .map_err(|e| ExtractError::Parse(format!("Failed to load PDF: {}", e)))?;

    let mut text = String::new();
    for (page_num, _) in doc.get_pages() {
        match doc.extract_text(&[page_num]) {
            Ok(page_text) => {
                text.push_str(&page_text);
                text.push('\n');
            }
            Err(e) => tracing::debug!("Skipping unreadable page {}: {}", page_num, e),
        }
    }

    Ok(Extraction {
        text,
        metadata: read_info(&doc),
    })
}

fn read_info(doc: &Document) -> DocumentMetadata {
    let Some(info) = info_dictionary(doc) else {
        return DocumentMetadata::default();
    };

    DocumentMetadata {
        created_at: info_string(info, b"CreationDate").and_then(|s| parse_timestamp(&s)),
        author: info_string(info, b"Author").filter(|s| !s.trim().is_empty()),
    }
}

fn info_dictionary(doc: &Document) -> Option<&Dictionary> {
    match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn info_string(info: &Dictionary, key: &[u8]) -> Option<String> {
    match info.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        _ => None,
    }
}

/// Text strings are UTF-16BE when they carry a byte order mark, otherwise
/// single-byte (treated as Latin-1).
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    bytes.iter().map(|&b| b as char).collect()
}
