//! Collection to spreadsheet export
//!
//! Every collection goes through the same pipeline:
//!
//! 1. **PaginatedReader**: drains the collection page by page from a [`DocumentSource`]
//! 2. **unify**: resolves the ordered [`ColumnSet`] (override or union of all keys)
//! 3. **SheetWriter**: lays out header and rows and saves the workbook through a [`SinkFactory`]
//!
//! The **ExportCoordinator** runs the pipeline for each requested collection,
//! isolates per-collection failures and reports progress to a
//! [`ProgressObserver`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use cosmos2xlsx::export::{
//!     ExportCoordinator, ExportRequest, MongoSource, ProgressTracker, XlsxSinkFactory,
//! };
//!
//! # async fn run(client: mongodb::Client) -> cosmos2xlsx::Result<()> {
//! let coordinator = ExportCoordinator::new(
//!     Arc::new(MongoSource::new(client, 1000)),
//!     Arc::new(XlsxSinkFactory),
//!     Arc::new(ProgressTracker::new(true)),
//! );
//!
//! let request = ExportRequest {
//!     database: "shop".to_string(),
//!     output_dir: "exports".into(),
//!     ..Default::default()
//! };
//! let report = coordinator.run(&request).await?;
//! println!("{} workbooks written", report.exported_count());
//! # Ok(())
//! # }
//! ```

pub mod coordinator;
pub mod normalize;
pub mod progress;
pub mod reader;
pub mod schema;
pub mod sink;
pub mod source;
pub mod writer;

#[cfg(test)]
mod testing;

pub use coordinator::{
    CollectionOutcome, CollectionState, ExportCoordinator, ExportReport, ExportRequest,
    OutcomeStatus,
};
pub use normalize::{CellConverter, PlainCellConverter, normalize, normalize_optional};
pub use progress::{ExportEvent, ProgressObserver, ProgressTracker, SilentObserver};
pub use reader::PaginatedReader;
pub use schema::{ColumnSet, unify};
pub use sink::{SheetSink, SinkFactory, XlsxSinkFactory};
pub use source::{DocumentSource, MongoSource, PageStream};
pub use writer::{SheetWriter, WriteOutcome};
