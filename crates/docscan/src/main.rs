//! docscan: incremental document scanner.
//!
//! Usage:
//!     docscan --config docscan.json scan /scan-targets/clients --follow
//!     docscan stats

use std::fs::File;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::broadcast::error::TryRecvError;
use tracing::{error, warn};

use docscan::logging::{init_logging, LogFormat};
use docscan::scan::{ScanEvent, ScanHandle};
use docscan::db::DocumentSummary;
use docscan::{load_config, Config, DocscanError, ScanService};

const FOLLOW_POLL: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "docscan", version, about = "Extract, classify and record office documents")]
struct Cli {
    /// Configuration file (JSON). Defaults apply when omitted.
    #[arg(short, long, global = true, env = "DOCSCAN_CONFIG")]
    config: Option<PathBuf>,

    /// Log output format on stderr
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Scan a directory under the configured base and wait for it to finish
    Scan {
        /// Directory to scan
        path: PathBuf,

        /// Print each file's outcome as the scan progresses
        #[arg(short, long)]
        follow: bool,
    },

    /// List processed documents, most recently modified first
    List,

    /// Show document counts per category (JSON)
    Stats,

    /// Export every record as CSV
    Export {
        /// Output file (stdout when omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List scan locations under the base directory
    Locations,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_logging(cli.log_format) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), DocscanError> {
    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => Config::default(),
    };
    let service = ScanService::from_config(&config)?;

    match cli.command {
        Commands::Scan { path, follow } => scan(&service, path, follow),
        Commands::List => {
            write_list(&mut io::stdout().lock(), &service.list_processed()?)?;
            Ok(())
        }
        Commands::Stats => {
            print_json(&service.stats()?);
            Ok(())
        }
        Commands::Export { output } => {
            let rows = match output {
                Some(path) => {
                    let file = File::create(&path).map_err(csv::Error::from)?;
                    service.export_csv(file)?
                }
                None => service.export_csv(io::stdout().lock())?,
            };
            tracing::info!("Exported {} records", rows);
            Ok(())
        }
        Commands::Locations => {
            for location in service.scan_locations() {
                println!("{}", location.display());
            }
            Ok(())
        }
    }
}

/// One tab-separated line per document; stops at the first failed write.
fn write_list<W: Write>(out: &mut W, docs: &[DocumentSummary]) -> io::Result<()> {
    for doc in docs {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            doc.path,
            doc.category.as_deref().unwrap_or("-"),
            doc.confidence
                .map(|c| format!("{:.2}", c))
                .unwrap_or_else(|| "-".to_string()),
            doc.language.as_deref().unwrap_or("-"),
            doc.modified_at
                .map(|t| t.to_rfc3339())
                .unwrap_or_else(|| "-".to_string()),
        )?;
    }
    out.flush()
}

fn scan(service: &ScanService, path: PathBuf, follow: bool) -> Result<(), DocscanError> {
    // Subscribe first so no event of this scan is missed.
    let mut events = service.subscribe();
    let handle = service.trigger_scan(&path)?;
    eprintln!("Scan {} started for {}", handle.id(), handle.root().display());

    if follow {
        follow_scan(&handle, &mut events);
    }

    let report = handle.join()?;
    print_json(&report);
    Ok(())
}

fn follow_scan(
    handle: &ScanHandle,
    events: &mut tokio::sync::broadcast::Receiver<ScanEvent>,
) {
    loop {
        match events.try_recv() {
            Ok(event) => print_event(handle.id(), &event),
            Err(TryRecvError::Empty) if handle.is_finished() => {
                while let Ok(event) = events.try_recv() {
                    print_event(handle.id(), &event);
                }
                return;
            }
            Err(TryRecvError::Empty) => thread::sleep(FOLLOW_POLL),
            Err(TryRecvError::Lagged(missed)) => {
                warn!("Progress output fell behind, {} events dropped", missed)
            }
            Err(TryRecvError::Closed) => return,
        }
    }
}

fn print_event(scan_id: &str, event: &ScanEvent) {
    if let ScanEvent::File {
        scan_id: id,
        path,
        status,
    } = event
    {
        if id == scan_id {
            println!("{:?}\t{}", status, path);
        }
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => error!("Failed to serialize output: {}", e),
    }
}
