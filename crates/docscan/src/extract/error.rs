use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExtractError {
    /// Backend unreachable, or it answered with a non-success status.
    #[error("Extraction service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("No text could be extracted")]
    EmptyContent,

    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to read document '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Extraction timed out after {0}s")]
    Timeout(u64),

    #[error("Failed to parse document: {0}")]
    Parse(String),
}
