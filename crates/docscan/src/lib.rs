pub mod classify;
pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod extract;
pub mod logging;
pub mod sanitize;
pub mod scan;

pub use classify::{Classifier, LanguageDetector, LinearModel, Prediction, StopwordDetector};
pub use config::{load_config, Config};
pub use db::{Database, DocumentRecord, DocumentStatus, DocumentStore};
pub use error::{ConfigError, DocscanError, Result, ScanRequestError, WorkerError};
pub use extract::{Extraction, Extractor, LocalExtractor, TikaExtractor};
pub use scan::{FailureKind, FileStatus, ScanEvent, ScanHandle, ScanReport, ScanService};
