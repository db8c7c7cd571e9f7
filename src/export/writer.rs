//! Sheet writer
//!
//! Lays out one collection as a worksheet: a bold header row in column-set
//! order followed by one row per document. Absent properties leave the cell
//! blank. Empty collections produce no file at all.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use mongodb::bson::Document;
use tracing::{debug, warn};

use crate::error::Result;

use super::normalize::CellConverter;
use super::progress::{ExportEvent, ProgressObserver};
use super::schema::ColumnSet;
use super::sink::{
    CellStyle, MAX_CELL_TEXT_LEN, SinkFactory, file_name_for, sanitize_sheet_name,
};

/// Result of writing one collection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Workbook persisted at `path` with `rows` data rows
    Written { path: PathBuf, rows: usize },
    /// Collection had no documents; nothing was created
    SkippedEmpty,
}

/// Writes collections into workbooks through a sink factory
pub struct SheetWriter<'a> {
    sinks: &'a dyn SinkFactory,
    converter: &'a dyn CellConverter,
    observer: &'a dyn ProgressObserver,
    autofit: bool,
}

impl<'a> SheetWriter<'a> {
    pub fn new(
        sinks: &'a dyn SinkFactory,
        converter: &'a dyn CellConverter,
        observer: &'a dyn ProgressObserver,
    ) -> Self {
        Self {
            sinks,
            converter,
            observer,
            autofit: true,
        }
    }

    /// Enable or disable column auto-sizing
    pub fn with_autofit(mut self, autofit: bool) -> Self {
        self.autofit = autofit;
        self
    }

    /// Write one collection to `output_dir/<collection>.<extension>`
    ///
    /// # Arguments
    /// * `collection` - Collection name, used for the sheet and the file
    /// * `docs` - Documents in output row order
    /// * `columns` - Columns in output order
    /// * `output_dir` - Existing directory receiving the file
    ///
    /// # Returns
    /// * `Result<WriteOutcome>` - Where the file went, or that it was skipped
    pub fn write(
        &self,
        collection: &str,
        docs: &[Document],
        columns: &ColumnSet,
        output_dir: &Path,
    ) -> Result<WriteOutcome> {
        if docs.is_empty() {
            self.observer.on_progress(&ExportEvent::CollectionSkipped {
                collection: collection.to_string(),
            });
            return Ok(WriteOutcome::SkippedEmpty);
        }

        let sheet_name = sanitize_sheet_name(collection);
        if sheet_name != collection {
            debug!("Sheet for '{}' named '{}'", collection, sheet_name);
        }

        let mut sheet = self.sinks.create_sheet(&sheet_name)?;

        for (col, name) in columns.iter().enumerate() {
            sheet.write_cell(0, column_index(col)?, name, CellStyle::Header)?;
        }

        for (index, doc) in docs.iter().enumerate() {
            let row = row_index(index)?;
            for (col, name) in columns.iter().enumerate() {
                let text = self.converter.convert_optional(doc.get(name));
                if text.is_empty() {
                    continue;
                }

                let text = fit_cell_text(&text);
                if let Cow::Owned(_) = text {
                    warn!(
                        "Collection '{}': value of '{}' in row {} truncated to {} characters",
                        collection,
                        name,
                        row + 1,
                        MAX_CELL_TEXT_LEN
                    );
                }
                sheet.write_cell(row, column_index(col)?, &text, CellStyle::Plain)?;
            }
        }

        if self.autofit {
            sheet.autofit();
        }

        let path = output_dir.join(file_name_for(collection, self.sinks.extension()));
        sheet.save(&path)?;

        self.observer.on_progress(&ExportEvent::SheetSaved {
            collection: collection.to_string(),
            path: path.clone(),
            rows: docs.len(),
        });

        Ok(WriteOutcome::Written {
            path,
            rows: docs.len(),
        })
    }
}

/// Cut text to the cell limit on a character boundary
fn fit_cell_text(text: &str) -> Cow<'_, str> {
    match text.char_indices().nth(MAX_CELL_TEXT_LEN) {
        Some((byte_end, _)) => Cow::Owned(text[..byte_end].to_string()),
        None => Cow::Borrowed(text),
    }
}

/// Zero-based data row index (row 0 holds the headers)
fn row_index(index: usize) -> Result<u32> {
    u32::try_from(index + 1)
        .map_err(|_| format!("row {} exceeds the worksheet row limit", index + 1).into())
}

fn column_index(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| format!("column {} exceeds the worksheet column limit", col).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::export::normalize::PlainCellConverter;
    use crate::export::testing::{RecordingObserver, RecordingSinkFactory};
    use mongodb::bson::doc;

    fn write_with(
        factory: &RecordingSinkFactory,
        observer: &RecordingObserver,
        docs: &[Document],
        columns: &ColumnSet,
    ) -> Result<WriteOutcome> {
        let converter = PlainCellConverter::new();
        SheetWriter::new(factory, &converter, observer).write(
            "people",
            docs,
            columns,
            Path::new("out"),
        )
    }

    #[test]
    fn test_header_row_identity() {
        let factory = RecordingSinkFactory::new();
        let observer = RecordingObserver::new();
        let docs = vec![doc! { "name": "Alice", "age": 30 }];
        let columns = ColumnSet::derive(&docs);

        write_with(&factory, &observer, &docs, &columns).unwrap();

        let sheet = factory.sheet("people").unwrap();
        assert_eq!(sheet.row_text(0), vec!["age", "name"]);
        assert_eq!(sheet.style(0, 0), Some(CellStyle::Header));
        assert_eq!(sheet.style(0, 1), Some(CellStyle::Header));
        assert_eq!(sheet.style(1, 0), Some(CellStyle::Plain));
    }

    #[test]
    fn test_scalar_cells() {
        let factory = RecordingSinkFactory::new();
        let observer = RecordingObserver::new();
        let docs = vec![
            doc! { "x": true },
            doc! { "x": null },
            doc! { "x": 3.5 },
            doc! { "x": { "a": 1 } },
        ];
        let columns = ColumnSet::from_override(&["x"]);

        write_with(&factory, &observer, &docs, &columns).unwrap();

        let sheet = factory.sheet("people").unwrap();
        assert_eq!(sheet.text(1, 0), Some("true"));
        assert_eq!(sheet.text(2, 0), None);
        assert_eq!(sheet.text(3, 0), Some("3.5"));

        let nested: serde_json::Value = serde_json::from_str(sheet.text(4, 0).unwrap()).unwrap();
        assert_eq!(nested, serde_json::json!({ "a": 1 }));
    }

    #[test]
    fn test_missing_property_is_blank() {
        let factory = RecordingSinkFactory::new();
        let observer = RecordingObserver::new();
        let docs = vec![doc! { "a": 1 }, doc! { "b": 2 }];
        let columns = ColumnSet::from_override(&["a", "b", "never"]);

        write_with(&factory, &observer, &docs, &columns).unwrap();

        let sheet = factory.sheet("people").unwrap();
        assert_eq!(sheet.text(1, 0), Some("1"));
        assert_eq!(sheet.text(1, 1), None);
        assert_eq!(sheet.text(2, 0), None);
        assert_eq!(sheet.text(2, 1), Some("2"));
        assert_eq!(sheet.text(1, 2), None);
        assert_eq!(sheet.text(2, 2), None);
        assert_eq!(sheet.row_text(0), vec!["a", "b", "never"]);
    }

    #[test]
    fn test_rows_follow_document_order() {
        let factory = RecordingSinkFactory::new();
        let observer = RecordingObserver::new();
        let docs = vec![doc! { "n": 3 }, doc! { "n": 1 }, doc! { "n": 2 }];
        let columns = ColumnSet::derive(&docs);

        let outcome = write_with(&factory, &observer, &docs, &columns).unwrap();

        let sheet = factory.sheet("people").unwrap();
        assert_eq!(sheet.text(1, 0), Some("3"));
        assert_eq!(sheet.text(2, 0), Some("1"));
        assert_eq!(sheet.text(3, 0), Some("2"));
        assert!(sheet.autofitted);
        assert_eq!(
            outcome,
            WriteOutcome::Written {
                path: Path::new("out").join("people.xlsx"),
                rows: 3
            }
        );
    }

    #[test]
    fn test_empty_collection_is_skipped() {
        let factory = RecordingSinkFactory::new();
        let observer = RecordingObserver::new();
        let columns = ColumnSet::derive(&[]);

        let outcome = write_with(&factory, &observer, &[], &columns).unwrap();

        assert_eq!(outcome, WriteOutcome::SkippedEmpty);
        assert!(factory.sheet("people").is_none());
        assert_eq!(
            observer.events(),
            vec![ExportEvent::CollectionSkipped {
                collection: "people".to_string()
            }]
        );
    }

    #[test]
    fn test_documents_without_columns_give_header_only_sheet() {
        let factory = RecordingSinkFactory::new();
        let observer = RecordingObserver::new();
        let docs = vec![doc! {}, doc! {}];
        let columns = ColumnSet::derive(&docs);

        let outcome = write_with(&factory, &observer, &docs, &columns).unwrap();

        assert!(matches!(outcome, WriteOutcome::Written { rows: 2, .. }));
        let sheet = factory.sheet("people").unwrap();
        assert!(sheet.cells.is_empty());
        assert!(sheet.saved_to.is_some());
    }

    #[test]
    fn test_autofit_can_be_disabled() {
        let factory = RecordingSinkFactory::new();
        let observer = RecordingObserver::new();
        let converter = PlainCellConverter::new();
        let docs = vec![doc! { "a": 1 }];
        let columns = ColumnSet::derive(&docs);

        SheetWriter::new(&factory, &converter, &observer)
            .with_autofit(false)
            .write("people", &docs, &columns, Path::new("out"))
            .unwrap();

        assert!(!factory.sheet("people").unwrap().autofitted);
    }

    #[test]
    fn test_save_failure_is_error() {
        let factory = RecordingSinkFactory::new().failing_save("people");
        let observer = RecordingObserver::new();
        let docs = vec![doc! { "a": 1 }];
        let columns = ColumnSet::derive(&docs);

        assert!(write_with(&factory, &observer, &docs, &columns).is_err());
        assert!(observer.events().is_empty());
    }

    #[test]
    fn test_fit_cell_text() {
        assert!(matches!(fit_cell_text("short"), Cow::Borrowed("short")));

        let long = "é".repeat(MAX_CELL_TEXT_LEN + 5);
        let fitted = fit_cell_text(&long);
        assert_eq!(fitted.chars().count(), MAX_CELL_TEXT_LEN);
    }

    #[test]
    fn test_sheet_name_is_sanitized() {
        let factory = RecordingSinkFactory::new();
        let observer = RecordingObserver::new();
        let converter = PlainCellConverter::new();
        let docs = vec![doc! { "a": 1 }];
        let columns = ColumnSet::derive(&docs);

        let outcome = SheetWriter::new(&factory, &converter, &observer)
            .write("logs:2024/01", &docs, &columns, Path::new("out"))
            .unwrap();

        assert!(factory.sheet("logs_2024_01").is_some());
        assert_eq!(
            outcome,
            WriteOutcome::Written {
                path: Path::new("out").join("logs:2024_01.xlsx"),
                rows: 1
            }
        );
    }
}
