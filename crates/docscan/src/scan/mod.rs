//! Incremental scanning: walk a tree, skip unchanged files, process and
//! record the rest.

pub mod detector;
pub mod locations;
pub mod orchestrator;
pub mod outcome;
pub mod pipeline;
pub mod progress;
pub mod service;
pub mod walker;

pub use detector::{needs_processing, ChangeDetector};
pub use locations::{list_scan_locations, validate_scan_path};
pub use orchestrator::Scanner;
pub use outcome::{FailureKind, FileFailure, FileStatus, ScanReport};
pub use pipeline::FileProcessor;
pub use progress::{BroadcastProgress, NoopProgress, ProgressReporter, ScanEvent};
pub use service::{ScanHandle, ScanService};
pub use walker::ExtensionFilter;
