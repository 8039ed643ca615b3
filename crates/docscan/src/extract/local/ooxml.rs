//! Office Open XML (docx, xlsx): zip archives of XML parts.

use std::fs::File;
use std::io::{Read, Seek};
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use zip::ZipArchive;

use crate::extract::metadata::{parse_timestamp, DocumentMetadata};
use crate::extract::{ExtractError, Extraction};

const CORE_PROPERTIES: &str = "docProps/core.xml";
const SHARED_STRINGS: &str = "xl/sharedStrings.xml";

pub(super) fn extract_docx(path: &Path) -> Result<Extraction, ExtractError> {
    let mut archive = open_archive(path)?;
    let xml = read_part(&mut archive, "word/document.xml")?;
    let text = collect_text(&xml, b"t", b"p")?;
    Ok(Extraction {
        text,
        metadata: read_core_properties(&mut archive),
    })
}

pub(super) fn extract_xlsx(path: &Path) -> Result<Extraction, ExtractError> {
    let mut archive = open_archive(path)?;
    // A workbook with only numeric cells has no shared strings part.
    let text = if archive.file_names().any(|name| name == SHARED_STRINGS) {
        let xml = read_part(&mut archive, SHARED_STRINGS)?;
        collect_text(&xml, b"t", b"si")?
    } else {
        String::new()
    };
    Ok(Extraction {
        text,
        metadata: read_core_properties(&mut archive),
    })
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>, ExtractError> {
    let file = File::open(path).map_err(|e| ExtractError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    ZipArchive::new(file)
        .map_err(|e| ExtractError::Parse(format!("Failed to open archive: {}", e)))
}

fn read_part<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    name: &str,
) -> Result<String, ExtractError> {
    let mut part = archive
        .by_name(name)
        .map_err(|e| ExtractError::Parse(format!("Missing {}: {}", name, e)))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| ExtractError::Parse(format!("Failed to read {}: {}", name, e)))?;
    Ok(xml)
}

/// Concatenates the text of every `text_tag` element, ending each
/// `block_tag` element with a newline.
fn collect_text(xml: &str, text_tag: &[u8], block_tag: &[u8]) -> Result<String, ExtractError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut text = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) if e.local_name().as_ref() == text_tag => in_text = true,
            Ok(Event::End(ref e)) => {
                let local_name = e.local_name();
                if local_name.as_ref() == text_tag {
                    in_text = false;
                } else if local_name.as_ref() == block_tag {
                    text.push('\n');
                }
            }
            Ok(Event::Text(e)) if in_text => {
                text.push_str(&e.unescape().unwrap_or_default());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Parse(format!("XML parsing error: {}", e))),
            _ => {}
        }
    }

    Ok(text)
}

/// Reads `dc:creator` and `dcterms:created`. Missing or malformed core
/// properties yield empty metadata.
fn read_core_properties<R: Read + Seek>(archive: &mut ZipArchive<R>) -> DocumentMetadata {
    let Ok(xml) = read_part(archive, CORE_PROPERTIES) else {
        return DocumentMetadata::default();
    };

    let mut reader = Reader::from_str(&xml);
    reader.config_mut().trim_text(true);

    let mut metadata = DocumentMetadata::default();
    let mut current: Option<Vec<u8>> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => current = Some(e.local_name().as_ref().to_vec()),
            Ok(Event::End(_)) => current = None,
            Ok(Event::Text(e)) => {
                let value = e.unescape().unwrap_or_default().trim().to_string();
                if value.is_empty() {
                    continue;
                }
                match current.as_deref() {
                    Some(b"creator") => metadata.author = Some(value),
                    Some(b"created") => metadata.created_at = parse_timestamp(&value),
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!("Ignoring malformed core properties: {}", e);
                return DocumentMetadata::default();
            }
            _ => {}
        }
    }

    metadata
}
