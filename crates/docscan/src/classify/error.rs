use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Classifier model could not be loaded from '{path}': {source}")]
    ModelNotLoaded {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid classifier model: {0}")]
    InvalidModel(String),

    #[error("Prediction failed: {0}")]
    Prediction(String),
}

/// Reasons language detection gives up on a text.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum LanguageError {
    #[error("Text too short to detect language ({words} words)")]
    TooShort { words: usize },

    #[error("No language features found")]
    NoFeatures,

    #[error("Ambiguous language between '{0}' and '{1}'")]
    Ambiguous(&'static str, &'static str),
}
