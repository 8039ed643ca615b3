//! Document repository: the `documents` table keyed by unique file path.
//!
//! Every mutation is a single statement, so it commits on its own and is
//! visible to readers either completely or not at all.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::Serialize;

use super::{Database, DatabaseError};

/// Terminal processing state of a stored document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentStatus {
    Processed,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Processed => "Processed",
            DocumentStatus::Failed => "Failed",
        }
    }
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DocumentStatus {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Processed" => Ok(DocumentStatus::Processed),
            "Failed" => Ok(DocumentStatus::Failed),
            other => Err(DatabaseError::Corrupt {
                column: "status",
                value: other.to_string(),
            }),
        }
    }
}

/// The last known processing outcome for one file path.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentRecord {
    pub path: String,
    pub created_at: Option<DateTime<Utc>>,
    pub modified_at: Option<DateTime<Utc>>,
    pub author: Option<String>,
    pub content: Option<String>,
    pub language: Option<String>,
    pub category: Option<String>,
    pub confidence: Option<f64>,
    pub status: DocumentStatus,
    pub error: Option<String>,
}

/// A record together with its surrogate row id.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredDocument {
    pub id: i64,
    #[serde(flatten)]
    pub record: DocumentRecord,
}

impl StoredDocument {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        let status: String = row.get("status")?;
        Ok(Self {
            id: row.get("id")?,
            record: DocumentRecord {
                path: row.get("filename")?,
                created_at: parse_timestamp_column(row.get("created_date")?),
                modified_at: parse_timestamp_column(row.get("modified_date")?),
                author: row.get("created_by")?,
                content: row.get("content")?,
                language: row.get("language")?,
                category: row.get("predicted_category")?,
                confidence: row.get("confidence_score")?,
                status: status.parse().map_err(|e: DatabaseError| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
                error: row.get("error")?,
            },
        })
    }
}

/// Listing entry for processed documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentSummary {
    pub path: String,
    pub category: Option<String>,
    pub confidence: Option<f64>,
    pub language: Option<String>,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Totals over processed documents.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentStats {
    pub total_documents: u64,
    pub by_category: BTreeMap<String, u64>,
}

/// What change detection needs to know about a stored path.
#[derive(Debug, Clone, PartialEq)]
pub struct Watermark {
    pub status: DocumentStatus,
    pub modified_at: Option<DateTime<Utc>>,
}

/// Formats a timestamp for storage. Fixed-width UTC with nanoseconds, so
/// string order matches time order and equality survives a round trip.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Stored timestamps are RFC 3339, but rows written by earlier builds carry
/// naive ISO timestamps, read as UTC.
fn parse_timestamp_column(value: Option<String>) -> Option<DateTime<Utc>> {
    let raw = value?;
    let parsed = crate::extract::metadata::parse_timestamp(&raw);
    if parsed.is_none() {
        log::warn!("Ignoring unparseable stored timestamp '{}'", raw);
    }
    parsed
}

/// Inserts a record, or replaces the mutable fields of the existing row for
/// the same path. `created_date` and `created_by` keep their stored values
/// when the new record has none.
pub fn upsert(db: &Database, record: &DocumentRecord) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO documents (filename, created_date, modified_date, created_by, content,
             language, predicted_category, confidence_score, status, error)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(filename) DO UPDATE SET
               created_date = COALESCE(excluded.created_date, documents.created_date),
               created_by = COALESCE(excluded.created_by, documents.created_by),
               modified_date = excluded.modified_date,
               content = excluded.content,
               language = excluded.language,
               predicted_category = excluded.predicted_category,
               confidence_score = excluded.confidence_score,
               status = excluded.status,
               error = excluded.error",
            params![
                record.path,
                record.created_at.as_ref().map(format_timestamp),
                record.modified_at.as_ref().map(format_timestamp),
                record.author,
                record.content,
                record.language,
                record.category,
                record.confidence,
                record.status.as_str(),
                record.error,
            ],
        )?;
        Ok(())
    })
}

/// Records a failed attempt. Content and classification are cleared;
/// origin metadata and the modification watermark are left as stored.
pub fn mark_failed(db: &Database, path: &str, error: &str) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO documents (filename, status, error) VALUES (?1, 'Failed', ?2)
             ON CONFLICT(filename) DO UPDATE SET
               status = 'Failed',
               error = excluded.error,
               content = NULL,
               language = NULL,
               predicted_category = NULL,
               confidence_score = NULL",
            params![path, error],
        )?;
        Ok(())
    })
}

/// Returns the stored modification timestamp, `None` if the path was never processed.
pub fn get_modified_at(db: &Database, path: &str) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    Ok(find_watermark(db, path)?.and_then(|w| w.modified_at))
}

/// Returns status and modification timestamp for a path.
pub fn find_watermark(db: &Database, path: &str) -> Result<Option<Watermark>, DatabaseError> {
    db.with_conn(|conn| {
        let row: Option<(String, Option<String>)> = conn
            .query_row(
                "SELECT status, modified_date FROM documents WHERE filename = ?1",
                params![path],
                |r| Ok((r.get(0)?, r.get(1)?)),
            )
            .optional()?;

        match row {
            Some((status, modified)) => Ok(Some(Watermark {
                status: status.parse()?,
                modified_at: parse_timestamp_column(modified),
            })),
            None => Ok(None),
        }
    })
}

/// Point lookup by path.
pub fn find_by_path(db: &Database, path: &str) -> Result<Option<StoredDocument>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM documents WHERE filename = ?1")?;
        let found = stmt
            .query_row(params![path], StoredDocument::from_row)
            .optional()?;
        Ok(found)
    })
}

/// Processed documents, most recently modified first.
pub fn list_processed(db: &Database) -> Result<Vec<DocumentSummary>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT filename, predicted_category, confidence_score, language, modified_date
             FROM documents WHERE status = 'Processed'
             ORDER BY modified_date DESC, id DESC",
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(DocumentSummary {
                    path: row.get(0)?,
                    category: row.get(1)?,
                    confidence: row.get(2)?,
                    language: row.get(3)?,
                    modified_at: parse_timestamp_column(row.get(4)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}

/// Number of processed documents per category.
pub fn count_by_category(db: &Database) -> Result<BTreeMap<String, u64>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT COALESCE(predicted_category, 'unknown'), COUNT(id)
             FROM documents WHERE status = 'Processed'
             GROUP BY predicted_category",
        )?;
        let mut counts = BTreeMap::new();
        for row in stmt.query_map([], |r| Ok((r.get::<_, String>(0)?, r.get::<_, u64>(1)?)))? {
            let (category, count) = row?;
            *counts.entry(category).or_insert(0) += count;
        }
        Ok(counts)
    })
}

/// Total processed documents plus the per-category breakdown.
pub fn stats(db: &Database) -> Result<DocumentStats, DatabaseError> {
    let by_category = count_by_category(db)?;
    let total_documents = db.with_conn(|conn| {
        let total: u64 = conn.query_row(
            "SELECT COUNT(id) FROM documents WHERE status = 'Processed'",
            [],
            |r| r.get(0),
        )?;
        Ok(total)
    })?;
    Ok(DocumentStats {
        total_documents,
        by_category,
    })
}

/// Full table snapshot in row-id order.
pub fn export_all(db: &Database) -> Result<Vec<StoredDocument>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare("SELECT * FROM documents ORDER BY id")?;
        let rows = stmt
            .query_map([], StoredDocument::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
