//! CSV export of the full documents table.

use std::io::Write;

use serde::Serialize;

use crate::db::document_repo::format_timestamp;
use crate::db::StoredDocument;

const HEADERS: [&str; 11] = [
    "id",
    "filename",
    "created_date",
    "modified_date",
    "created_by",
    "content",
    "language",
    "predicted_category",
    "confidence_score",
    "status",
    "error",
];

#[derive(Serialize)]
struct CsvRow<'a> {
    id: i64,
    filename: &'a str,
    created_date: Option<String>,
    modified_date: Option<String>,
    created_by: Option<&'a str>,
    content: Option<&'a str>,
    language: Option<&'a str>,
    predicted_category: Option<&'a str>,
    confidence_score: Option<f64>,
    status: &'static str,
    error: Option<&'a str>,
}

impl<'a> From<&'a StoredDocument> for CsvRow<'a> {
    fn from(doc: &'a StoredDocument) -> Self {
        let r = &doc.record;
        Self {
            id: doc.id,
            filename: &r.path,
            created_date: r.created_at.as_ref().map(format_timestamp),
            modified_date: r.modified_at.as_ref().map(format_timestamp),
            created_by: r.author.as_deref(),
            content: r.content.as_deref(),
            language: r.language.as_deref(),
            predicted_category: r.category.as_deref(),
            confidence_score: r.confidence,
            status: r.status.as_str(),
            error: r.error.as_deref(),
        }
    }
}

/// Writes a header row and one row per document. Absent values are empty
/// fields.
pub fn write_csv<W: Write>(documents: &[StoredDocument], writer: W) -> Result<(), csv::Error> {
    let mut csv = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv.write_record(HEADERS)?;
    for doc in documents {
        csv.serialize(CsvRow::from(doc))?;
    }
    csv.flush()?;
    Ok(())
}
