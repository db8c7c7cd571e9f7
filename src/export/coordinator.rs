//! Export coordinator for orchestrating export runs
//!
//! For every requested collection the coordinator reads all documents,
//! resolves the column set and writes the sheet. A failure in one collection
//! is recorded and the run moves on to the next one; only errors that affect
//! the run as a whole (output directory, collection listing) are returned.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::Result;

use super::normalize::{CellConverter, PlainCellConverter};
use super::progress::{ExportEvent, ProgressObserver};
use super::reader::PaginatedReader;
use super::schema::unify;
use super::sink::SinkFactory;
use super::source::DocumentSource;
use super::writer::{SheetWriter, WriteOutcome};

/// Pipeline state of one collection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionState {
    Pending,
    Reading,
    Unifying,
    Writing,
    Done,
    Failed,
}

/// What to export and where
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    /// Database holding the collections
    pub database: String,
    /// Collections to export; empty means every collection in the database
    pub collections: Vec<String>,
    /// Columns to export; empty means every property found
    pub columns: Vec<String>,
    /// Directory receiving one workbook per collection
    pub output_dir: PathBuf,
}

/// Terminal status of one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Workbook written
    Exported { path: PathBuf, rows: usize },
    /// Collection was empty, no file created
    Skipped,
    /// Collection-scoped failure
    Failed {
        stage: CollectionState,
        message: String,
    },
}

/// Outcome for one requested collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionOutcome {
    pub collection: String,
    pub status: OutcomeStatus,
}

impl CollectionOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, OutcomeStatus::Failed { .. })
    }
}

/// Result of an export run
#[derive(Debug, Clone, Default)]
pub struct ExportReport {
    /// One entry per collection, in request order
    pub outcomes: Vec<CollectionOutcome>,
    /// Time taken for the run
    pub elapsed_ms: u64,
}

impl ExportReport {
    /// Whether any collection failed
    pub fn has_failures(&self) -> bool {
        self.outcomes.iter().any(CollectionOutcome::is_failure)
    }

    pub fn failures(&self) -> impl Iterator<Item = &CollectionOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    pub fn exported_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Exported { .. }))
            .count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Skipped))
            .count()
    }
}

/// Coordinator for export runs
pub struct ExportCoordinator {
    /// Where documents come from
    source: Arc<dyn DocumentSource>,
    /// Where sheets go
    sinks: Arc<dyn SinkFactory>,
    /// Receiver of progress events
    observer: Arc<dyn ProgressObserver>,
    /// Value renderer for cells
    converter: Box<dyn CellConverter>,
    /// Auto-size columns after writing
    autofit: bool,
    /// Cancellation token for aborting the run
    cancel_token: Option<CancellationToken>,
}

impl ExportCoordinator {
    /// Create a new export coordinator
    pub fn new(
        source: Arc<dyn DocumentSource>,
        sinks: Arc<dyn SinkFactory>,
        observer: Arc<dyn ProgressObserver>,
    ) -> Self {
        Self {
            source,
            sinks,
            observer,
            converter: Box::new(PlainCellConverter::new()),
            autofit: true,
            cancel_token: None,
        }
    }

    /// Replace the cell value renderer
    pub fn with_converter(mut self, converter: Box<dyn CellConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// Enable or disable column auto-sizing
    pub fn with_autofit(mut self, autofit: bool) -> Self {
        self.autofit = autofit;
        self
    }

    /// Set cancellation token for this run
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Execute the export run
    ///
    /// # Returns
    /// * `Result<ExportReport>` - Per-collection outcomes, or a run-level error
    pub async fn run(&self, request: &ExportRequest) -> Result<ExportReport> {
        let start_time = Instant::now();

        tokio::fs::create_dir_all(&request.output_dir).await?;

        let collections = self.resolve_collections(request).await?;
        self.observer.on_progress(&ExportEvent::CollectionsResolved {
            collections: collections.clone(),
        });

        let mut outcomes = Vec::with_capacity(collections.len());
        for collection in &collections {
            if self.is_cancelled() {
                debug!("Skipping '{}' after cancellation", collection);
                outcomes.push(self.fail(
                    collection,
                    CollectionState::Pending,
                    "cancelled".to_string(),
                ));
                continue;
            }

            let outcome = self.export_collection(request, collection).await;
            if let OutcomeStatus::Exported { path, .. } = &outcome.status {
                if let Some(previous) = previous_writer(&outcomes, path) {
                    warn!(
                        "Collection '{}' replaced the workbook of '{}' at {}",
                        collection,
                        previous,
                        path.display()
                    );
                }
            }
            outcomes.push(outcome);
        }

        let report = ExportReport {
            outcomes,
            elapsed_ms: start_time.elapsed().as_millis() as u64,
        };

        info!(
            "Export finished: {} exported, {} skipped, {} failed in {} ms",
            report.exported_count(),
            report.skipped_count(),
            report.failures().count(),
            report.elapsed_ms
        );

        Ok(report)
    }

    /// Requested names verbatim, or every collection of the database
    async fn resolve_collections(&self, request: &ExportRequest) -> Result<Vec<String>> {
        if !request.collections.is_empty() {
            return Ok(request.collections.clone());
        }

        self.observer.on_progress(&ExportEvent::ListingCollections {
            database: request.database.clone(),
        });
        self.source.list_collections(&request.database).await
    }

    /// Run one collection through read, unify and write
    async fn export_collection(
        &self,
        request: &ExportRequest,
        collection: &str,
    ) -> CollectionOutcome {
        self.transition(collection, CollectionState::Reading);

        let mut reader =
            PaginatedReader::new(self.source.as_ref(), self.observer.as_ref(), &request.database);
        if let Some(token) = self.cancel_token.as_ref() {
            reader = reader.with_cancellation(token);
        }

        let docs = match reader.read(collection).await {
            Ok(docs) => docs,
            Err(e) => return self.fail(collection, CollectionState::Reading, e.to_string()),
        };

        self.transition(collection, CollectionState::Unifying);
        let columns = unify(&docs, Some(request.columns.as_slice()));
        self.observer.on_progress(&ExportEvent::ColumnsResolved {
            collection: collection.to_string(),
            columns: columns.len(),
        });

        self.transition(collection, CollectionState::Writing);
        let writer = SheetWriter::new(
            self.sinks.as_ref(),
            self.converter.as_ref(),
            self.observer.as_ref(),
        )
        .with_autofit(self.autofit);

        let status = match writer.write(collection, &docs, &columns, &request.output_dir) {
            Ok(WriteOutcome::Written { path, rows }) => OutcomeStatus::Exported { path, rows },
            Ok(WriteOutcome::SkippedEmpty) => OutcomeStatus::Skipped,
            Err(e) => return self.fail(collection, CollectionState::Writing, e.to_string()),
        };

        self.transition(collection, CollectionState::Done);
        CollectionOutcome {
            collection: collection.to_string(),
            status,
        }
    }

    fn transition(&self, collection: &str, state: CollectionState) {
        self.observer.on_progress(&ExportEvent::StateChanged {
            collection: collection.to_string(),
            state,
        });
    }

    fn fail(&self, collection: &str, stage: CollectionState, message: String) -> CollectionOutcome {
        self.observer.on_progress(&ExportEvent::CollectionFailed {
            collection: collection.to_string(),
            stage,
            message: message.clone(),
        });
        self.transition(collection, CollectionState::Failed);

        CollectionOutcome {
            collection: collection.to_string(),
            status: OutcomeStatus::Failed { stage, message },
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel_token
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// Collection that already wrote a workbook to `path` during this run
fn previous_writer<'a>(outcomes: &'a [CollectionOutcome], path: &Path) -> Option<&'a str> {
    outcomes.iter().find_map(|outcome| match &outcome.status {
        OutcomeStatus::Exported { path: written, .. } if written == path => {
            Some(outcome.collection.as_str())
        }
        _ => None,
    })
}
