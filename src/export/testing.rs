//! In-memory source, sink and observer used by the export tests

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mongodb::bson::Document;

use crate::error::{Result, SinkError, SourceError};

use super::progress::{ExportEvent, ProgressObserver};
use super::sink::{CellStyle, SheetSink, SinkFactory};
use super::source::{DocumentSource, PageStream};

/// Source serving fixed pages per collection
#[derive(Default)]
pub struct MockSource {
    collections: Vec<(String, Vec<Vec<Document>>)>,
    fail_open: HashSet<String>,
    fail_after_first_page: HashSet<String>,
    fail_listing: bool,
    opened: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(mut self, name: &str, pages: Vec<Vec<Document>>) -> Self {
        self.collections.push((name.to_string(), pages));
        self
    }

    pub fn failing_open(mut self, name: &str) -> Self {
        self.fail_open.insert(name.to_string());
        self
    }

    pub fn failing_after_first_page(mut self, name: &str) -> Self {
        self.fail_after_first_page.insert(name.to_string());
        self
    }

    pub fn failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Collections opened so far, in order
    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentSource for MockSource {
    async fn list_collections(&self, database: &str) -> Result<Vec<String>> {
        if self.fail_listing {
            return Err(SourceError::ListFailed {
                database: database.to_string(),
                message: "listing refused".to_string(),
            }
            .into());
        }
        Ok(self.collections.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn open_pages(&self, _database: &str, collection: &str) -> Result<Box<dyn PageStream>> {
        self.opened.lock().unwrap().push(collection.to_string());

        if self.fail_open.contains(collection) {
            return Err(SourceError::QueryFailed {
                collection: collection.to_string(),
                message: "connection reset".to_string(),
            }
            .into());
        }

        let pages = self
            .collections
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, pages)| pages.clone())
            .unwrap_or_default();

        Ok(Box::new(MockPages {
            collection: collection.to_string(),
            pages: pages.into_iter().collect(),
            served: 0,
            fail_after_first: self.fail_after_first_page.contains(collection),
        }))
    }
}

struct MockPages {
    collection: String,
    pages: std::collections::VecDeque<Vec<Document>>,
    served: usize,
    fail_after_first: bool,
}

#[async_trait]
impl PageStream for MockPages {
    async fn next_page(&mut self) -> Result<Option<Vec<Document>>> {
        if self.fail_after_first && self.served == 1 {
            return Err(SourceError::QueryFailed {
                collection: self.collection.clone(),
                message: "cursor killed".to_string(),
            }
            .into());
        }
        self.served += 1;
        Ok(self.pages.pop_front())
    }

    async fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Snapshot of a sheet written through [`RecordingSinkFactory`]
#[derive(Debug, Clone, Default)]
pub struct RecordedSheet {
    pub name: String,
    pub cells: BTreeMap<(u32, u16), (String, CellStyle)>,
    pub autofitted: bool,
    pub saved_to: Option<PathBuf>,
}

impl RecordedSheet {
    pub fn text(&self, row: u32, col: u16) -> Option<&str> {
        self.cells.get(&(row, col)).map(|(text, _)| text.as_str())
    }

    pub fn style(&self, row: u32, col: u16) -> Option<CellStyle> {
        self.cells.get(&(row, col)).map(|(_, style)| *style)
    }

    pub fn row_text(&self, row: u32) -> Vec<&str> {
        self.cells
            .range((row, 0)..=(row, u16::MAX))
            .map(|(_, (text, _))| text.as_str())
            .collect()
    }
}

/// Sink factory keeping every sheet in memory
#[derive(Default)]
pub struct RecordingSinkFactory {
    sheets: Arc<Mutex<Vec<RecordedSheet>>>,
    fail_save: HashSet<String>,
}

impl RecordingSinkFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_save(mut self, sheet: &str) -> Self {
        self.fail_save.insert(sheet.to_string());
        self
    }

    /// Last saved sheet with the given name
    pub fn sheet(&self, name: &str) -> Option<RecordedSheet> {
        self.sheets
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|sheet| sheet.name == name)
            .cloned()
    }

    pub fn saved_paths(&self) -> Vec<PathBuf> {
        self.sheets
            .lock()
            .unwrap()
            .iter()
            .filter_map(|sheet| sheet.saved_to.clone())
            .collect()
    }
}

impl SinkFactory for RecordingSinkFactory {
    fn extension(&self) -> &str {
        "xlsx"
    }

    fn create_sheet(&self, name: &str) -> Result<Box<dyn SheetSink>> {
        Ok(Box::new(RecordingSheet {
            sheet: RecordedSheet {
                name: name.to_string(),
                ..Default::default()
            },
            fail_save: self.fail_save.contains(name),
            sheets: Arc::clone(&self.sheets),
        }))
    }
}

struct RecordingSheet {
    sheet: RecordedSheet,
    fail_save: bool,
    sheets: Arc<Mutex<Vec<RecordedSheet>>>,
}

impl SheetSink for RecordingSheet {
    fn write_cell(&mut self, row: u32, col: u16, value: &str, style: CellStyle) -> Result<()> {
        self.sheet.cells.insert((row, col), (value.to_string(), style));
        Ok(())
    }

    fn autofit(&mut self) {
        self.sheet.autofitted = true;
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        if self.fail_save {
            return Err(SinkError::SaveFailed {
                path: path.display().to_string(),
                message: "disk full".to_string(),
            }
            .into());
        }
        self.sheet.saved_to = Some(path.to_path_buf());
        self.sheets.lock().unwrap().push(self.sheet.clone());
        Ok(())
    }
}

/// Observer collecting every event
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ExportEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ExportEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressObserver for RecordingObserver {
    fn on_progress(&self, event: &ExportEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}
