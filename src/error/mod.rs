//! Error handling for export runs.
//!
//! Errors fall into three layers that the coordinator treats differently:
//! - connection and configuration errors abort the whole run
//! - source and sink errors are confined to the collection being exported
//! - value rendering never produces an error at all (see `export::normalize`)
//!
//! Driver errors are rendered through [`driver::ErrorInfo`] so log lines carry
//! the server's code name instead of the driver's verbose debug output.

pub mod driver;
pub mod kinds;

pub use driver::ErrorInfo;
pub use kinds::{ConfigError, ConnectionError, ExportError, Result, SinkError, SourceError};
