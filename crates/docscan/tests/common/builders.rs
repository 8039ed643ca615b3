//! Builder patterns for creating test configurations programmatically.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use docscan::config::{Config, ExtractionBackend};

/// Builder for `Config` instances pointing at a test sandbox.
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Defaults suitable for tests: local extraction, one-second timeouts.
    pub fn new(base: &Path) -> Self {
        let mut config = Config::default();
        config.scan_base_directory = base.to_path_buf();
        config.database_path = base.join("docscan.db");
        config.model_path = base.join("model.json");
        config.extraction.backend = ExtractionBackend::Local;
        config.extraction.timeout_secs = 1;
        Self { config }
    }

    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_path = path.into();
        self
    }

    pub fn model_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.model_path = path.into();
        self
    }

    pub fn extensions(mut self, extensions: &[&str]) -> Self {
        self.config.extensions = extensions.iter().map(|e| e.to_string()).collect();
        self
    }

    pub fn prefix_chars(mut self, chars: usize) -> Self {
        self.config.language.prefix_chars = chars;
        self
    }

    pub fn max_concurrent_scans(mut self, limit: usize) -> Self {
        self.config.scan.max_concurrent_scans = limit;
        self
    }

    pub fn max_consecutive_storage_failures(mut self, limit: usize) -> Self {
        self.config.scan.max_consecutive_storage_failures = limit;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

/// Path of the bundled four-label legal model.
pub fn fixture_model_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join("legal-model.json")
}
