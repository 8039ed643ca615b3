//! Linear text classifier over TF-IDF features, loaded from a JSON artifact.
//!
//! The artifact carries everything needed to reproduce a trained
//! `TfidfVectorizer` + `LogisticRegression` pipeline at inference time:
//!
//! ```json
//! {
//!   "format": "docscan-linear-v1",
//!   "labels": ["Contract Law", "Litigation"],
//!   "ngram_range": [1, 2],
//!   "vocabulary": { "lease": 0, "breach of": 1 },
//!   "idf": [1.69, 1.69],
//!   "coef": [[0.8, -0.3]],
//!   "intercept": [0.1]
//! }
//! ```
//!
//! Binary models may carry a single coefficient row (the positive class is
//! `labels[1]`); multiclass models carry one row per label.

use std::collections::HashMap;
use std::path::Path;

use regex::Regex;
use serde::Deserialize;

use super::{ClassifyError, Classifier, Prediction};

pub const MODEL_FORMAT: &str = "docscan-linear-v1";

/// Words of two or more word characters.
const TOKEN_PATTERN: &str = r"\b\w\w+\b";

#[derive(Debug, Deserialize)]
struct ModelArtifact {
    format: String,
    labels: Vec<String>,
    #[serde(default = "default_ngram_range")]
    ngram_range: (usize, usize),
    #[serde(default = "default_true")]
    lowercase: bool,
    #[serde(default)]
    sublinear_tf: bool,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
}

fn default_ngram_range() -> (usize, usize) {
    (1, 1)
}

fn default_true() -> bool {
    true
}

#[derive(Debug)]
pub struct LinearModel {
    labels: Vec<String>,
    ngram_range: (usize, usize),
    lowercase: bool,
    sublinear_tf: bool,
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    token_pattern: Regex,
}

impl LinearModel {
    pub fn load(path: &Path) -> Result<Self, ClassifyError> {
        let json = std::fs::read_to_string(path).map_err(|e| ClassifyError::ModelNotLoaded {
            path: path.to_path_buf(),
            source: e,
        })?;
        let model = Self::from_json(&json)?;
        tracing::info!(
            labels = model.labels.len(),
            features = model.idf.len(),
            "Loaded classifier model from {}",
            path.display()
        );
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self, ClassifyError> {
        let artifact: ModelArtifact = serde_json::from_str(json)
            .map_err(|e| ClassifyError::InvalidModel(format!("Malformed artifact: {}", e)))?;
        Self::from_artifact(artifact)
    }

    fn from_artifact(a: ModelArtifact) -> Result<Self, ClassifyError> {
        let invalid = |msg: String| Err(ClassifyError::InvalidModel(msg));

        if a.format != MODEL_FORMAT {
            return invalid(format!("Unsupported format '{}'", a.format));
        }
        if a.labels.len() < 2 {
            return invalid("At least two labels are required".to_string());
        }
        let (min_n, max_n) = a.ngram_range;
        if min_n == 0 || min_n > max_n {
            return invalid(format!("Invalid ngram_range ({}, {})", min_n, max_n));
        }
        let features = a.idf.len();
        if let Some((term, index)) = a.vocabulary.iter().find(|(_, i)| **i >= features) {
            return invalid(format!(
                "Vocabulary term '{}' has index {} beyond {} features",
                term, index, features
            ));
        }
        let single_row_binary = a.labels.len() == 2 && a.coef.len() == 1;
        if !single_row_binary && a.coef.len() != a.labels.len() {
            return invalid(format!(
                "Expected {} coefficient rows, found {}",
                a.labels.len(),
                a.coef.len()
            ));
        }
        if let Some(row) = a.coef.iter().find(|row| row.len() != features) {
            return invalid(format!(
                "Coefficient row has {} entries, expected {}",
                row.len(),
                features
            ));
        }
        if a.intercept.len() != a.coef.len() {
            return invalid(format!(
                "Expected {} intercepts, found {}",
                a.coef.len(),
                a.intercept.len()
            ));
        }

        let token_pattern = Regex::new(TOKEN_PATTERN)
            .map_err(|e| ClassifyError::InvalidModel(format!("Token pattern: {}", e)))?;

        Ok(Self {
            labels: a.labels,
            ngram_range: a.ngram_range,
            lowercase: a.lowercase,
            sublinear_tf: a.sublinear_tf,
            vocabulary: a.vocabulary,
            idf: a.idf,
            coef: a.coef,
            intercept: a.intercept,
            token_pattern,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// L2-normalised sparse TF-IDF vector.
    fn features(&self, text: &str) -> HashMap<usize, f64> {
        let text = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };
        let tokens: Vec<&str> = self
            .token_pattern
            .find_iter(&text)
            .map(|m| m.as_str())
            .collect();

        let mut counts: HashMap<usize, f64> = HashMap::new();
        let (min_n, max_n) = self.ngram_range;
        for n in min_n..=max_n {
            for gram in tokens.windows(n) {
                if let Some(&index) = self.vocabulary.get(&gram.join(" ")) {
                    *counts.entry(index).or_insert(0.0) += 1.0;
                }
            }
        }

        for (index, value) in counts.iter_mut() {
            let tf = if self.sublinear_tf {
                1.0 + value.ln()
            } else {
                *value
            };
            *value = tf * self.idf[*index];
        }

        let norm = counts.values().map(|v| v * v).sum::<f64>().sqrt();
        if norm > 0.0 {
            counts.values_mut().for_each(|v| *v /= norm);
        }
        counts
    }

    /// Class probabilities, in label order.
    pub fn predict_proba(&self, text: &str) -> Vec<f64> {
        let x = self.features(text);
        let scores: Vec<f64> = self
            .coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| b + x.iter().map(|(&i, v)| row[i] * v).sum::<f64>())
            .collect();

        if scores.len() == 1 {
            let positive = 1.0 / (1.0 + (-scores[0]).exp());
            return vec![1.0 - positive, positive];
        }

        let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exps.iter().sum();
        exps.into_iter().map(|e| e / total).collect()
    }

    /// Most probable label. The first label wins ties.
    pub fn predict(&self, text: &str) -> &str {
        let probabilities = self.predict_proba(text);
        &self.labels[argmax(&probabilities)]
    }
}

fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

impl Classifier for LinearModel {
    fn classify(&self, text: &str) -> Result<Prediction, ClassifyError> {
        let probabilities = self.predict_proba(text);
        if probabilities.iter().any(|p| !p.is_finite()) {
            return Err(ClassifyError::Prediction(
                "Model produced non-finite probabilities".to_string(),
            ));
        }
        let best = argmax(&probabilities);
        Ok(Prediction {
            label: self.labels[best].clone(),
            confidence: probabilities[best],
        })
    }
}
