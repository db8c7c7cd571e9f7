//! Spreadsheet sink abstractions
//!
//! A [`SinkFactory`] creates one [`SheetSink`] per collection. The sink takes
//! cell writes by row/column, can auto-size its columns and persists itself as
//! a single-sheet workbook. [`XlsxSinkFactory`] produces `.xlsx` files through
//! `rust_xlsxwriter`.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::debug;

use crate::error::{Result, SinkError};

/// Maximum sheet name length accepted by Excel
pub const MAX_SHEET_NAME_LEN: usize = 31;

/// Maximum number of characters Excel stores in one cell
pub const MAX_CELL_TEXT_LEN: usize = 32_767;

/// Presentation style of a cell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStyle {
    /// Regular data cell
    Plain,
    /// Header cell, rendered bold
    Header,
}

/// One worksheet under construction
pub trait SheetSink: Send {
    /// Write text at a zero-based row and column
    fn write_cell(&mut self, row: u32, col: u16, value: &str, style: CellStyle) -> Result<()>;

    /// Size columns to fit their content
    fn autofit(&mut self);

    /// Persist the sheet as a workbook at `path`, replacing any existing file
    fn save(&mut self, path: &Path) -> Result<()>;
}

/// Creates sheets and names the file extension they are saved with
pub trait SinkFactory: Send + Sync {
    /// File extension without the leading dot
    fn extension(&self) -> &str;

    /// Create an empty sheet with the given (already sanitized) name
    fn create_sheet(&self, name: &str) -> Result<Box<dyn SheetSink>>;
}

/// Factory for `.xlsx` workbooks
#[derive(Debug, Default, Clone, Copy)]
pub struct XlsxSinkFactory;

impl SinkFactory for XlsxSinkFactory {
    fn extension(&self) -> &str {
        "xlsx"
    }

    fn create_sheet(&self, name: &str) -> Result<Box<dyn SheetSink>> {
        let mut worksheet = Worksheet::new();
        worksheet.set_name(name)?;

        Ok(Box::new(XlsxSheet {
            worksheet: Some(worksheet),
            header_format: Format::new().set_bold(),
        }))
    }
}

/// Worksheet backed by `rust_xlsxwriter`
pub struct XlsxSheet {
    /// Taken when the sheet is moved into a workbook on save
    worksheet: Option<Worksheet>,
    header_format: Format,
}

impl SheetSink for XlsxSheet {
    fn write_cell(&mut self, row: u32, col: u16, value: &str, style: CellStyle) -> Result<()> {
        let worksheet = self
            .worksheet
            .as_mut()
            .ok_or_else(|| SinkError::WriteFailed("sheet already saved".to_string()))?;
        match style {
            CellStyle::Header => {
                worksheet.write_string_with_format(row, col, value, &self.header_format)?;
            }
            CellStyle::Plain => {
                worksheet.write_string(row, col, value)?;
            }
        }
        Ok(())
    }

    fn autofit(&mut self) {
        if let Some(worksheet) = self.worksheet.as_mut() {
            worksheet.autofit();
        }
    }

    fn save(&mut self, path: &Path) -> Result<()> {
        let worksheet = self
            .worksheet
            .take()
            .ok_or_else(|| SinkError::WriteFailed("sheet already saved".to_string()))?;

        let mut workbook = Workbook::new();
        workbook.push_worksheet(worksheet);
        workbook.save(path).map_err(|e| SinkError::SaveFailed {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        debug!("Saved workbook to {}", path.display());
        Ok(())
    }
}

/// Make a collection name acceptable as an Excel sheet name
///
/// Replaces `[ ] : * ? / \`, strips surrounding apostrophes, cuts the name to
/// 31 characters and avoids the reserved name `History`.
pub fn sanitize_sheet_name(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| match c {
            '[' | ']' | ':' | '*' | '?' | '/' | '\\' => '_',
            other => other,
        })
        .collect();

    let trimmed = replaced.trim_matches('\'');
    let mut sheet: String = trimmed.chars().take(MAX_SHEET_NAME_LEN).collect();

    // Truncation can expose a trailing apostrophe
    while sheet.ends_with('\'') {
        sheet.pop();
    }

    if sheet.is_empty() {
        return "Sheet1".to_string();
    }

    if sheet.eq_ignore_ascii_case("history") {
        sheet.push('_');
    }

    sheet
}

/// File name for a collection's workbook, kept inside the output directory
pub fn file_name_for(collection: &str, extension: &str) -> String {
    let stem: String = collection
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{stem}.{extension}")
}
