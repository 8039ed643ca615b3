use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Document formats picked up by a scan when no `extensions` list is configured.
pub const DEFAULT_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "xls", "xlsx", "wpd"];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    #[serde(default = "default_scan_base")]
    pub scan_base_directory: PathBuf,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database_path: default_database_path(),
            model_path: default_model_path(),
            scan_base_directory: default_scan_base(),
            extensions: default_extensions(),
            extraction: ExtractionConfig::default(),
            language: LanguageConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

fn default_database_path() -> PathBuf {
    crate::db::default_database_path().unwrap_or_else(|| PathBuf::from("docscan.db"))
}

fn default_model_path() -> PathBuf {
    PathBuf::from("model.json")
}

fn default_scan_base() -> PathBuf {
    PathBuf::from("/scan-targets")
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionBackend {
    /// Networked Apache Tika server.
    Tika,
    /// In-process extraction (pdf, docx, xlsx only).
    Local,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    #[serde(default = "default_backend")]
    pub backend: ExtractionBackend,
    #[serde(default = "default_tika_url")]
    pub tika_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_true")]
    pub fetch_metadata: bool,
}

fn default_backend() -> ExtractionBackend {
    ExtractionBackend::Tika
}

fn default_tika_url() -> String {
    "http://localhost:9998".to_string()
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            tika_url: default_tika_url(),
            timeout_secs: default_timeout_secs(),
            fetch_metadata: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Number of leading characters handed to language detection.
    #[serde(default = "default_prefix_chars")]
    pub prefix_chars: usize,
}

fn default_prefix_chars() -> usize {
    500
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            prefix_chars: default_prefix_chars(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default = "default_max_concurrent_scans")]
    pub max_concurrent_scans: usize,
    /// Consecutive store errors after which a scan gives up on the remaining files.
    #[serde(default = "default_max_storage_failures")]
    pub max_consecutive_storage_failures: usize,
}

fn default_max_concurrent_scans() -> usize {
    4
}

fn default_max_storage_failures() -> usize {
    5
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            max_concurrent_scans: default_max_concurrent_scans(),
            max_consecutive_storage_failures: default_max_storage_failures(),
        }
    }
}
