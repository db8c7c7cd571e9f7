//! Cosmos DB to Excel exporter
//!
//! Exports schema-less document collections into spreadsheets: one workbook
//! per collection, one row per document and one column per property found in
//! any document of the collection.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `config`: Configuration management
//! - `connection`: MongoDB API connection management
//! - `error`: Error types and handling
//! - `export`: Read, unify and write pipeline
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cosmos2xlsx::{config::Config, connection::ConnectionManager};
//! use cosmos2xlsx::export::{
//!     ExportCoordinator, ExportRequest, MongoSource, SilentObserver, XlsxSinkFactory,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::default();
//!     let mut manager = ConnectionManager::new(
//!         "mongodb://localhost:27017".to_string(),
//!         config.connection,
//!     );
//!     let client = manager.connect("shop").await?;
//!
//!     let coordinator = ExportCoordinator::new(
//!         Arc::new(MongoSource::new(client, config.export.batch_size)),
//!         Arc::new(XlsxSinkFactory),
//!         Arc::new(SilentObserver),
//!     );
//!     let request = ExportRequest {
//!         database: "shop".to_string(),
//!         output_dir: "exports".into(),
//!         ..Default::default()
//!     };
//!
//!     let report = coordinator.run(&request).await?;
//!     println!("{} workbooks written", report.exported_count());
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod connection;
pub mod error;
pub mod export;

// Re-export commonly used types
pub use config::Config;
pub use connection::ConnectionManager;
pub use error::{ExportError, Result};
pub use export::{ExportCoordinator, ExportReport, ExportRequest};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
///
/// # Returns
/// * `&str` - Version string
pub fn version() -> &'static str {
    VERSION
}
