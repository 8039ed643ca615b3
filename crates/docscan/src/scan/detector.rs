//! Change detection: is the stored outcome for a path still valid?

use chrono::{DateTime, Utc};

use crate::db::{DatabaseError, DocumentStatus, DocumentStore, Watermark};

/// Skip only a `Processed` record whose watermark is at or after the
/// file's current modification time. Missing records, `Failed` records and
/// stale or missing watermarks all need processing.
pub fn needs_processing(watermark: Option<&Watermark>, fs_modified: DateTime<Utc>) -> bool {
    match watermark {
        Some(Watermark {
            status: DocumentStatus::Processed,
            modified_at: Some(stored),
        }) => *stored < fs_modified,
        _ => true,
    }
}

pub struct ChangeDetector<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    pub fn should_process(
        &self,
        path: &str,
        fs_modified: DateTime<Utc>,
    ) -> Result<bool, DatabaseError> {
        let watermark = self.store.find_watermark(path)?;
        Ok(needs_processing(watermark.as_ref(), fs_modified))
    }
}
