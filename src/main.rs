//! cosmos2xlsx - Cosmos DB to Excel exporter
//!
//! Connects to a Cosmos DB account through its MongoDB API and writes every
//! requested collection to `<collection>.xlsx` in the output directory.
//!
//! # Usage
//!
//! ```bash
//! # Export every collection of a database into the current directory
//! cosmos2xlsx -c "mongodb://..." -d shop
//!
//! # Export two collections with a fixed column list
//! cosmos2xlsx -c "mongodb://..." -d shop -t orders customers -p id name -o exports
//! ```
//!
//! Exit status is 0 when every collection succeeded, 1 on a fatal error and
//! 2 when at least one collection failed.

use std::sync::Arc;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::Level;

use cosmos2xlsx::cli::{CliArgs, CliInterface};
use cosmos2xlsx::connection::ConnectionManager;
use cosmos2xlsx::error::Result;
use cosmos2xlsx::export::{
    ExportCoordinator, ExportReport, MongoSource, OutcomeStatus, ProgressTracker, XlsxSinkFactory,
};

/// Every collection exported or skipped
const EXIT_SUCCESS: i32 = 0;
/// Nothing could be exported
const EXIT_FATAL: i32 = 1;
/// At least one collection failed
const EXIT_PARTIAL: i32 = 2;

/// Application entry point
#[tokio::main]
async fn main() {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            let code = if e.use_stderr() { EXIT_FATAL } else { EXIT_SUCCESS };
            std::process::exit(code);
        }
    };

    let code = match run(args).await {
        Ok(report) => exit_code(&report),
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_FATAL
        }
    };

    std::process::exit(code);
}

/// Main application logic
///
/// 1. Load configuration and apply argument overrides
/// 2. Initialize logging
/// 3. Connect and verify the account
/// 4. Run the export with Ctrl+C cancellation
///
/// # Returns
/// * `Result<ExportReport>` - Per-collection outcomes, or a fatal error
async fn run(args: CliArgs) -> Result<ExportReport> {
    let cli = CliInterface::from_args(args)?;
    initialize_logging(&cli);

    let uri = cli.connection_string()?;
    let request = cli.export_request()?;
    cli.print_banner(&uri);

    let mut conn_manager = ConnectionManager::new(uri, cli.config().connection.clone());
    let client = conn_manager.connect(&request.database).await?;

    let cancel_token = CancellationToken::new();
    let cancel_token_clone = cancel_token.clone();
    let ctrl_c_handle = tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                eprintln!("Cancelling export...");
                cancel_token_clone.cancel();
            }
            Err(err) => {
                eprintln!("Failed to listen for Ctrl+C: {}", err);
            }
        }
    });

    let export_config = &cli.config().export;
    let coordinator = ExportCoordinator::new(
        Arc::new(MongoSource::new(client, export_config.batch_size)),
        Arc::new(XlsxSinkFactory),
        Arc::new(ProgressTracker::new(export_config.progress)),
    )
    .with_autofit(export_config.autofit)
    .with_cancellation(cancel_token);

    let result = coordinator.run(&request).await;
    ctrl_c_handle.abort();

    let report = result?;
    if !cli.args().quiet {
        print_summary(&report);
    }

    Ok(report)
}

/// Print one line per collection
fn print_summary(report: &ExportReport) {
    for outcome in &report.outcomes {
        match &outcome.status {
            OutcomeStatus::Exported { path, rows } => {
                println!("{}: {} rows -> {}", outcome.collection, rows, path.display());
            }
            OutcomeStatus::Skipped => {
                println!("{}: empty, skipped", outcome.collection);
            }
            OutcomeStatus::Failed { stage, message } => {
                println!("{}: failed while {:?}: {}", outcome.collection, stage, message);
            }
        }
    }
}

/// Map a finished run to the process exit status
fn exit_code(report: &ExportReport) -> i32 {
    if report.has_failures() {
        EXIT_PARTIAL
    } else {
        EXIT_SUCCESS
    }
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level: Level = cli.config().logging.level.to_tracing_level();

    // Build subscriber with level filter
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr);

    // Configure timestamps
    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }
}
