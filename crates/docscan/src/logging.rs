//! Subscriber setup for the binary. Library code only emits events.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use crate::error::DocscanError;

const DEFAULT_LOG_FILTER: &str = "docscan=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Installs the global subscriber (stderr, `RUST_LOG` aware) and routes
/// `log` records from the storage layer into it.
pub fn init_logging(format: LogFormat) -> Result<(), DocscanError> {
    tracing_log::LogTracer::init().map_err(|e| DocscanError::Logging(e.to_string()))?;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let result = match format {
        LogFormat::Text => tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr)),
        ),
        LogFormat::Json => tracing::subscriber::set_global_default(
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr)),
        ),
    };
    result.map_err(|e| DocscanError::Logging(e.to_string()))
}
