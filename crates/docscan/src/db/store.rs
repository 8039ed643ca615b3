//! The store operations a scan depends on, behind a trait so scans can run
//! against test doubles.

use super::document_repo::{self, DocumentRecord, Watermark};
use super::{Database, DatabaseError};

pub trait DocumentStore: Send + Sync {
    fn find_watermark(&self, path: &str) -> Result<Option<Watermark>, DatabaseError>;
    fn upsert(&self, record: &DocumentRecord) -> Result<(), DatabaseError>;
    fn mark_failed(&self, path: &str, error: &str) -> Result<(), DatabaseError>;
}

impl DocumentStore for Database {
    fn find_watermark(&self, path: &str) -> Result<Option<Watermark>, DatabaseError> {
        document_repo::find_watermark(self, path)
    }

    fn upsert(&self, record: &DocumentRecord) -> Result<(), DatabaseError> {
        document_repo::upsert(self, record)
    }

    fn mark_failed(&self, path: &str, error: &str) -> Result<(), DatabaseError> {
        document_repo::mark_failed(self, path, error)
    }
}
