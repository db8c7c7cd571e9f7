//! Command-line interface for cosmos2xlsx
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading and command-line overrides
//! - Resolution of the connection string, output directory and export request

use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, LogLevel};
use crate::connection::redact_uri;
use crate::error::{ConfigError, Result};
use crate::export::ExportRequest;

/// Export document collections to Excel workbooks
#[derive(Parser, Debug)]
#[command(
    name = "cosmos2xlsx",
    version,
    about = "Export Cosmos DB collections to Excel workbooks",
    long_about = "Exports every document of one or more Cosmos DB (MongoDB API) collections
into one .xlsx workbook per collection, with one column per document property."
)]
pub struct CliArgs {
    /// Connection string of the account
    ///
    /// Falls back to `connection.connection_string` from the config file.
    #[arg(short = 'c', long, value_name = "URI")]
    pub connection_string: Option<String>,

    /// Database holding the collections
    #[arg(short = 'd', long, value_name = "NAME")]
    pub database: String,

    /// Collections to export (default: all collections of the database)
    #[arg(short = 't', long, value_name = "NAME", num_args = 1..)]
    pub containers: Vec<String>,

    /// Output directory (default: current directory)
    #[arg(short = 'o', long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Columns to export, in order (default: every property found)
    #[arg(short = 'p', long, value_name = "NAME", num_args = 1..)]
    pub columns: Vec<String>,

    /// Configuration file path
    #[arg(long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Documents requested per page
    #[arg(long, value_name = "N")]
    pub batch_size: Option<u32>,

    /// Connection timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Keep default column widths
    #[arg(long)]
    pub no_autofit: bool,

    /// Hide the progress spinner
    #[arg(long)]
    pub no_progress: bool,

    /// Quiet mode (errors only)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (trace logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration with command-line overrides applied
    config: Config,
}

impl CliInterface {
    /// Create a CLI interface from parsed arguments
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or a configuration error
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let config = Self::load_config(&args)?;
        Ok(Self { args, config })
    }

    /// Load configuration from file and merge with arguments
    ///
    /// # Arguments
    /// * `args` - Command-line arguments
    ///
    /// # Returns
    /// * `Result<Config>` - Validated configuration or error
    fn load_config(args: &CliArgs) -> Result<Config> {
        let mut config = Config::load_from_file(args.config_file.as_deref())?;
        Self::apply_args_to_config(&mut config, args);
        config.validate()?;
        Ok(config)
    }

    /// Apply CLI arguments to configuration
    ///
    /// Overrides configuration values with CLI arguments where provided
    fn apply_args_to_config(config: &mut Config, args: &CliArgs) {
        Self::apply_logging_args(config, args);
        Self::apply_connection_args(config, args);
        Self::apply_export_args(config, args);
    }

    /// Apply logging-related CLI arguments to configuration
    fn apply_logging_args(config: &mut Config, args: &CliArgs) {
        config.logging.level = if args.very_verbose {
            LogLevel::Trace
        } else if args.verbose {
            LogLevel::Debug
        } else if args.quiet {
            LogLevel::Error
        } else {
            config.logging.level
        };
    }

    /// Apply connection-related CLI arguments to configuration
    fn apply_connection_args(config: &mut Config, args: &CliArgs) {
        if let Some(uri) = &args.connection_string {
            config.connection.connection_string = Some(uri.clone());
        }

        if let Some(timeout) = args.timeout {
            config.connection.timeout = timeout;
        }
    }

    /// Apply export-related CLI arguments to configuration
    fn apply_export_args(config: &mut Config, args: &CliArgs) {
        if let Some(batch_size) = args.batch_size {
            config.export.batch_size = batch_size;
        }

        if args.no_autofit {
            config.export.autofit = false;
        }

        if args.no_progress || args.quiet {
            config.export.progress = false;
        }
    }

    /// Get the connection string
    ///
    /// Command line first, then the config file.
    ///
    /// # Returns
    /// * `Result<String>` - Connection string, or a missing field error
    pub fn connection_string(&self) -> Result<String> {
        self.config
            .connection
            .connection_string
            .clone()
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingField("connection_string".to_string()).into())
    }

    /// Get the output directory, defaulting to the working directory
    pub fn output_dir(&self) -> Result<PathBuf> {
        match &self.args.output {
            Some(dir) => Ok(dir.clone()),
            None => Ok(std::env::current_dir()?),
        }
    }

    /// Build the export request described by the arguments
    pub fn export_request(&self) -> Result<ExportRequest> {
        Ok(ExportRequest {
            database: self.args.database.clone(),
            collections: self.args.containers.clone(),
            columns: self.args.columns.clone(),
            output_dir: self.output_dir()?,
        })
    }

    /// Get the configuration
    ///
    /// # Returns
    /// * `&Config` - Reference to configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the CLI arguments
    ///
    /// # Returns
    /// * `&CliArgs` - Reference to arguments
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Print the target account with credentials hidden
    pub fn print_banner(&self, uri: &str) {
        if !self.args.quiet {
            println!("Connecting to: {}", redact_uri(uri));
            println!("Using cosmos2xlsx: {}", env!("CARGO_PKG_VERSION"));
        }
    }
}
