use std::sync::Arc;

use serde::Serialize;
use tokio::sync::broadcast;

use super::outcome::{FileStatus, ScanReport};

/// Events emitted while a scan runs. Each file the scan touches produces
/// exactly one `File` event carrying its terminal status.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScanEvent {
    Started {
        scan_id: String,
        root: String,
    },
    File {
        scan_id: String,
        path: String,
        status: FileStatus,
    },
    Finished {
        scan_id: String,
        report: ScanReport,
    },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ScanEvent);
}

/// No-op reporter for unit tests.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ScanEvent) {}
}

/// Forwards events to every subscriber of a broadcast channel.
pub struct BroadcastProgress {
    sender: Arc<broadcast::Sender<ScanEvent>>,
}

impl BroadcastProgress {
    pub fn new(sender: Arc<broadcast::Sender<ScanEvent>>) -> Self {
        Self { sender }
    }
}

impl ProgressReporter for BroadcastProgress {
    fn report(&self, event: ScanEvent) {
        // No subscribers is the normal case.
        let _ = self.sender.send(event);
    }
}
