//! Language tagging and category prediction for extracted text.

pub mod error;
pub mod language;
pub mod model;

use serde::Serialize;

pub use error::{ClassifyError, LanguageError};
pub use language::{detect_language, LanguageDetector, StopwordDetector, UNKNOWN_LANGUAGE};
pub use model::LinearModel;

/// A predicted label and its posterior probability.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prediction {
    pub label: String,
    /// Maximum class probability, in `[0, 1]`.
    pub confidence: f64,
}

/// Maps text to a category. Implementations must be deterministic for a
/// given loaded model.
pub trait Classifier: Send + Sync {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifyError>;
}
