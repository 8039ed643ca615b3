//! Language detection from function-word frequencies.
//!
//! Every language has a short list of very common words (articles,
//! prepositions, pronouns) that show up in any text of a few sentences.
//! Counting hits against each list is enough to tag document-length text.

use std::collections::HashSet;

use super::LanguageError;

/// Stored when detection gives up on a text.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

const MIN_WORDS: usize = 3;
const MIN_HITS: usize = 2;

pub trait LanguageDetector: Send + Sync {
    /// Returns an ISO 639-1 code.
    fn detect(&self, text: &str) -> Result<String, LanguageError>;
}

struct LanguageProfile {
    code: &'static str,
    stopwords: &'static [&'static str],
}

const PROFILES: &[LanguageProfile] = &[
    LanguageProfile {
        code: "en",
        stopwords: &[
            "the", "and", "of", "to", "is", "for", "this", "that", "with", "are", "was", "be",
            "by", "on", "shall", "which", "from", "have", "has", "not", "or", "it", "its",
            "were", "been", "will", "their", "any",
        ],
    },
    LanguageProfile {
        code: "id",
        stopwords: &[
            "yang", "dan", "di", "ini", "itu", "dengan", "untuk", "dari", "dalam", "tidak",
            "akan", "pada", "adalah", "oleh", "telah", "harus", "atau", "kepada", "sebagai",
            "para", "tersebut", "bahwa", "ke", "juga",
        ],
    },
    LanguageProfile {
        code: "de",
        stopwords: &[
            "der", "die", "das", "und", "ist", "nicht", "mit", "den", "dem", "ein", "eine",
            "zu", "auf", "für", "sich", "auch", "wird", "werden", "von", "des", "im", "oder",
            "wurde", "nach",
        ],
    },
    LanguageProfile {
        code: "fr",
        stopwords: &[
            "le", "la", "les", "et", "des", "du", "une", "est", "dans", "pour", "que", "qui",
            "sur", "pas", "par", "au", "aux", "ce", "cette", "sont", "avec", "être", "il",
            "ou",
        ],
    },
    LanguageProfile {
        code: "es",
        stopwords: &[
            "el", "los", "las", "del", "y", "es", "por", "con", "para", "una", "su", "lo",
            "como", "más", "pero", "sus", "al", "fue", "este", "esta", "son", "entre", "sin",
            "sobre",
        ],
    },
    LanguageProfile {
        code: "nl",
        stopwords: &[
            "de", "het", "een", "en", "van", "ik", "te", "dat", "niet", "zijn", "op", "aan",
            "met", "voor", "er", "maar", "om", "ook", "dit", "wordt", "deze", "bij", "naar",
            "geen",
        ],
    },
    LanguageProfile {
        code: "pt",
        stopwords: &[
            "os", "as", "um", "uma", "não", "com", "ao", "dos", "das", "na", "no",
            "pelo", "pela", "são", "foi", "ser", "isso", "seu", "sua", "também", "mais",
            "quando", "muito",
        ],
    },
    LanguageProfile {
        code: "it",
        stopwords: &[
            "il", "gli", "della", "delle", "di", "che", "è", "non", "per", "sono", "nel",
            "nella", "alla", "dei", "degli", "questo", "questa", "anche", "come", "ma",
            "essere", "hanno", "stato", "tra",
        ],
    },
];

pub struct StopwordDetector {
    profiles: Vec<(&'static str, HashSet<&'static str>)>,
}

impl StopwordDetector {
    pub fn new() -> Self {
        let profiles = PROFILES
            .iter()
            .map(|p| (p.code, p.stopwords.iter().copied().collect()))
            .collect();
        Self { profiles }
    }
}

impl Default for StopwordDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector for StopwordDetector {
    fn detect(&self, text: &str) -> Result<String, LanguageError> {
        let words: Vec<String> = text
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .map(str::to_lowercase)
            .collect();
        if words.len() < MIN_WORDS {
            return Err(LanguageError::TooShort { words: words.len() });
        }

        let mut scores: Vec<(&'static str, usize)> = self
            .profiles
            .iter()
            .map(|(code, stopwords)| {
                let hits = words
                    .iter()
                    .filter(|w| stopwords.contains(w.as_str()))
                    .count();
                (*code, hits)
            })
            .collect();
        // Stable sort keeps profile order among equal scores.
        scores.sort_by(|a, b| b.1.cmp(&a.1));

        let (best, best_hits) = scores[0];
        if best_hits < MIN_HITS {
            return Err(LanguageError::NoFeatures);
        }
        if let Some(&(runner_up, hits)) = scores.get(1) {
            if hits == best_hits {
                return Err(LanguageError::Ambiguous(best, runner_up));
            }
        }
        Ok(best.to_string())
    }
}

/// Detects the language of the first `prefix_chars` characters of `text`,
/// falling back to [`UNKNOWN_LANGUAGE`] instead of failing.
pub fn detect_language(detector: &dyn LanguageDetector, text: &str, prefix_chars: usize) -> String {
    let prefix = match text.char_indices().nth(prefix_chars) {
        Some((end, _)) => &text[..end],
        None => text,
    };
    match detector.detect(prefix) {
        Ok(code) => code,
        Err(e) => {
            tracing::debug!("Language detection fell back to unknown: {}", e);
            UNKNOWN_LANGUAGE.to_string()
        }
    }
}
