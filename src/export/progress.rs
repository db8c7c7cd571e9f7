//! Progress reporting for export runs
//!
//! The coordinator, reader and writer report what they do through a
//! [`ProgressObserver`]. The default [`ProgressTracker`] turns events into
//! `tracing` log lines and a spinner while pages are being read; tests plug in
//! a recording observer instead of capturing process output.

use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, info};

use super::coordinator::CollectionState;

/// Something that happened during an export run
#[derive(Debug, Clone, PartialEq)]
pub enum ExportEvent {
    /// Enumerating collections because none were requested explicitly
    ListingCollections { database: String },
    /// Final list of collections to export
    CollectionsResolved { collections: Vec<String> },
    /// A collection moved to a new pipeline state
    StateChanged {
        collection: String,
        state: CollectionState,
    },
    /// One page of documents arrived from the source
    PageFetched {
        collection: String,
        page: u32,
        documents: usize,
        total: u64,
    },
    /// Columns chosen for a collection
    ColumnsResolved { collection: String, columns: usize },
    /// Collection had no documents, nothing written
    CollectionSkipped { collection: String },
    /// Worksheet persisted
    SheetSaved {
        collection: String,
        path: PathBuf,
        rows: usize,
    },
    /// Collection-scoped failure
    CollectionFailed {
        collection: String,
        stage: CollectionState,
        message: String,
    },
}

/// Receiver for export events
pub trait ProgressObserver: Send + Sync {
    fn on_progress(&self, event: &ExportEvent);
}

/// Observer that ignores every event
#[derive(Debug, Default)]
pub struct SilentObserver;

impl ProgressObserver for SilentObserver {
    fn on_progress(&self, _event: &ExportEvent) {}
}

/// Console progress tracker
///
/// Logs every event and, when enabled, shows a spinner with the running
/// document count while a collection is being read.
pub struct ProgressTracker {
    /// Whether to display a spinner
    enable_bar: bool,
    /// Spinner and start time of the collection currently being read
    bar: Mutex<Option<(ProgressBar, Instant)>>,
}

impl ProgressTracker {
    /// Create a new progress tracker
    ///
    /// # Arguments
    /// * `enable_bar` - Whether to display a spinner while reading
    pub fn new(enable_bar: bool) -> Self {
        Self {
            enable_bar,
            bar: Mutex::new(None),
        }
    }

    fn start_bar(&self, collection: &str) {
        if !self.enable_bar {
            return;
        }

        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix} {pos} documents {msg}")
        {
            bar.set_style(style);
        }
        bar.set_prefix(collection.to_string());

        if let Ok(mut guard) = self.bar.lock() {
            *guard = Some((bar, Instant::now()));
        }
    }

    fn update_bar(&self, total: u64) {
        if let Ok(guard) = self.bar.lock() {
            if let Some((bar, started)) = guard.as_ref() {
                bar.set_position(total);

                let elapsed = started.elapsed().as_secs_f64();
                if elapsed > 0.0 {
                    let speed = total as f64 / elapsed;
                    bar.set_message(format!("({:.0} docs/sec)", speed));
                }
            }
        }
    }

    fn finish_bar(&self) {
        if let Ok(mut guard) = self.bar.lock() {
            if let Some((bar, _)) = guard.take() {
                bar.finish_and_clear();
            }
        }
    }
}

impl ProgressObserver for ProgressTracker {
    fn on_progress(&self, event: &ExportEvent) {
        match event {
            ExportEvent::ListingCollections { database } => {
                info!("Getting all collections from database '{}'", database);
            }
            ExportEvent::CollectionsResolved { collections } => {
                info!(
                    "Exporting {} collection(s): {}",
                    collections.len(),
                    collections.join(", ")
                );
            }
            ExportEvent::StateChanged { collection, state } => {
                debug!("Collection '{}' -> {:?}", collection, state);
                match state {
                    CollectionState::Reading => {
                        info!("Exporting collection: {}", collection);
                        self.start_bar(collection);
                    }
                    CollectionState::Unifying => self.finish_bar(),
                    _ => {}
                }
            }
            ExportEvent::PageFetched {
                collection,
                page,
                documents,
                total,
            } => {
                debug!(
                    "Collection '{}': page {} with {} documents ({} so far)",
                    collection, page, documents, total
                );
                self.update_bar(*total);
            }
            ExportEvent::ColumnsResolved {
                collection,
                columns,
            } => {
                debug!("Collection '{}': {} column(s)", collection, columns);
            }
            ExportEvent::CollectionSkipped { collection } => {
                info!("Collection '{}' is empty. Skipping.", collection);
            }
            ExportEvent::SheetSaved {
                collection,
                path,
                rows,
            } => {
                info!(
                    "Collection '{}': {} row(s) saved to {}",
                    collection,
                    rows,
                    path.display()
                );
            }
            ExportEvent::CollectionFailed {
                collection,
                stage,
                message,
            } => {
                self.finish_bar();
                error!(
                    "Error exporting collection '{}' while {:?}: {}",
                    collection, stage, message
                );
            }
        }
    }
}
