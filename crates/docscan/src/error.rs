use std::path::PathBuf;

use thiserror::Error;

/// Top-level error of the binary and of `ScanService` construction.
#[derive(Error, Debug)]
pub enum DocscanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Classifier error: {0}")]
    Classify(#[from] crate::classify::ClassifyError),

    #[error("Extraction backend error: {0}")]
    Extract(#[from] crate::extract::ExtractError),

    #[error("Scan request rejected: {0}")]
    ScanRequest(#[from] ScanRequestError),

    #[error("Worker error: {0}")]
    Worker(#[from] WorkerError),

    #[error("Export failed: {0}")]
    Export(#[from] csv::Error),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Invalid configuration: {message}")]
    Validation { message: String },

    #[error("Config does not match schema: {errors}")]
    SchemaValidation { errors: String },
}

/// Reasons a scan trigger is refused before any worker starts.
#[derive(Error, Debug)]
pub enum ScanRequestError {
    #[error("Classifier model not loaded, cannot scan")]
    ClassifierUnavailable,

    #[error("Disallowed path '{path}'. Must be inside {base}")]
    Disallowed { path: PathBuf, base: PathBuf },

    #[error("Path '{0}' does not exist or is not a directory")]
    NotFound(PathBuf),

    #[error("Too many scans running (limit {limit})")]
    TooManyScans { limit: usize },

    #[error(transparent)]
    Worker(#[from] WorkerError),
}

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to spawn scan worker: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Scan worker {0} panicked")]
    Panicked(String),
}

pub type Result<T> = std::result::Result<T, DocscanError>;
