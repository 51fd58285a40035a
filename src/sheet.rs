//! Decoding of uploaded files into header-keyed rows.
//!
//! The normalizers only ever see a [`RawSheet`]: the first sheet's header
//! labels plus its data rows, where every cell is either text or empty.
//! Backends implement [`SpreadsheetReader`]; CSV/TSV go through the `csv`
//! crate and workbooks through `calamine` (behind the `excel` feature).

use std::collections::HashMap;
use std::path::Path;

use tracing::warn;

use crate::error::{IngestError, Result, RowIssue};

/// A single decoded cell. Numbers and dates arrive as their text rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    Empty,
}

impl CellValue {
    pub fn from_text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            CellValue::Empty
        } else {
            CellValue::Text(value)
        }
    }

    /// Trimmed text, or `""` for an empty cell.
    pub fn trimmed(&self) -> &str {
        match self {
            CellValue::Text(text) => text.trim(),
            CellValue::Empty => "",
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, CellValue::Empty)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// Sheet row number, counting the header row as 1.
    pub number: usize,
    pub cells: Vec<CellValue>,
}

impl RawRow {
    /// Cell under column `index`; short rows read as empty.
    pub fn cell(&self, index: usize) -> &CellValue {
        self.cells.get(index).unwrap_or(&CellValue::Empty)
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(CellValue::is_empty)
    }
}

/// The first sheet of a decoded file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawSheet {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
    /// Rows the backend itself could not decode.
    pub skipped: Vec<RowIssue>,
}

impl RawSheet {
    pub fn new(headers: Vec<String>) -> Self {
        Self {
            headers: dedupe_headers(headers),
            rows: Vec::new(),
            skipped: Vec::new(),
        }
    }

    /// Appends a data row. Rows with no content are dropped.
    pub fn push_row(&mut self, number: usize, cells: Vec<CellValue>) {
        let row = RawRow { number, cells };
        if !row.is_blank() {
            self.rows.push(row);
        }
    }

    pub fn skip_row(&mut self, row: usize, reason: impl Into<String>) {
        let issue = RowIssue {
            row,
            reason: reason.into(),
        };
        warn!(row = issue.row, reason = %issue.reason, "skipping undecodable row");
        self.skipped.push(issue);
    }

    /// Checks that `row` fits under the header row.
    pub fn check_shape(&self, row: &RawRow) -> std::result::Result<(), String> {
        let extra = &row.cells[self.headers.len().min(row.cells.len())..];
        if extra.iter().any(|cell| !cell.is_empty()) {
            return Err(format!(
                "row has {} cells but the header row has {} columns",
                row.cells.len(),
                self.headers.len()
            ));
        }
        Ok(())
    }
}

/// Blank labels become `__EMPTY`, repeated labels get `_1`, `_2`, ... so
/// every column keeps a distinct key.
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: HashMap<String, usize> = HashMap::new();
    headers
        .into_iter()
        .map(|header| {
            let base = if header.trim().is_empty() {
                "__EMPTY".to_string()
            } else {
                header.trim().to_string()
            };
            let count = seen.entry(base.clone()).or_insert(0);
            let label = if *count == 0 {
                base.clone()
            } else {
                format!("{base}_{count}")
            };
            *count += 1;
            label
        })
        .collect()
}

/// Turns file bytes into the first sheet's rows.
pub trait SpreadsheetReader: Send + Sync {
    /// Returns `None` when the file has no sheets at all.
    fn read_first_sheet(&self, bytes: &[u8]) -> Result<Option<RawSheet>>;
}

/// Delimited text backend.
#[derive(Debug, Clone, Copy)]
pub struct CsvReader {
    delimiter: u8,
}

impl CsvReader {
    pub fn comma() -> Self {
        Self { delimiter: b',' }
    }

    pub fn tab() -> Self {
        Self { delimiter: b'\t' }
    }
}

impl Default for CsvReader {
    fn default() -> Self {
        Self::comma()
    }
}

impl SpreadsheetReader for CsvReader {
    fn read_first_sheet(&self, bytes: &[u8]) -> Result<Option<RawSheet>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|err| IngestError::Unreadable(err.to_string()))?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        if headers.iter().all(|h| h.trim().is_empty()) {
            return Ok(Some(RawSheet::default()));
        }

        let mut sheet = RawSheet::new(headers);
        for (index, result) in reader.records().enumerate() {
            let number = index + 2;
            match result {
                Ok(record) => {
                    let cells = record.iter().map(CellValue::from_text).collect();
                    sheet.push_row(number, cells);
                }
                Err(err) => sheet.skip_row(number, err.to_string()),
            }
        }

        Ok(Some(sheet))
    }
}

#[cfg(feature = "excel")]
pub use workbook::WorkbookReader;

#[cfg(feature = "excel")]
mod workbook {
    use std::io::Cursor;

    use calamine::{open_workbook_auto_from_rs, Data, Reader};

    use super::{CellValue, RawSheet, SpreadsheetReader};
    use crate::error::{IngestError, Result};

    /// `.xlsx`, `.xlsm`, `.xlsb`, `.xls` and `.ods` backend.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct WorkbookReader;

    impl SpreadsheetReader for WorkbookReader {
        fn read_first_sheet(&self, bytes: &[u8]) -> Result<Option<RawSheet>> {
            let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes))
                .map_err(|err| IngestError::Unreadable(err.to_string()))?;

            let Some(first) = workbook.sheet_names().first().cloned() else {
                return Ok(None);
            };

            let range = workbook
                .worksheet_range(&first)
                .map_err(|err| IngestError::Unreadable(err.to_string()))?;

            let mut rows = range.rows();
            let Some(header_row) = rows.next() else {
                return Ok(Some(RawSheet::default()));
            };

            let mut sheet = RawSheet::new(header_row.iter().map(cell_text).collect());
            for (index, row) in rows.enumerate() {
                let cells = row.iter().map(|c| CellValue::from_text(cell_text(c))).collect();
                sheet.push_row(index + 2, cells);
            }

            Ok(Some(sheet))
        }
    }

    fn cell_text(cell: &Data) -> String {
        match cell {
            Data::String(s) => s.clone(),
            Data::Float(f) => {
                if f.fract() == 0.0 && f.abs() < 1e15 {
                    format!("{}", *f as i64)
                } else {
                    f.to_string()
                }
            }
            Data::Int(i) => i.to_string(),
            Data::Bool(b) => b.to_string(),
            Data::Empty | Data::Error(_) => String::new(),
            Data::DateTime(d) => d.to_string(),
            Data::DateTimeIso(s) | Data::DurationIso(s) => s.clone(),
        }
    }
}

/// Picks a backend from the file extension.
pub fn reader_for_path(path: &Path) -> Result<Box<dyn SpreadsheetReader>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default();

    match extension.as_str() {
        "csv" => Ok(Box::new(CsvReader::comma())),
        "tsv" => Ok(Box::new(CsvReader::tab())),
        _ => workbook_reader(&extension),
    }
}

#[cfg(feature = "excel")]
fn workbook_reader(_extension: &str) -> Result<Box<dyn SpreadsheetReader>> {
    Ok(Box::new(WorkbookReader))
}

#[cfg(not(feature = "excel"))]
fn workbook_reader(extension: &str) -> Result<Box<dyn SpreadsheetReader>> {
    let label = if extension.is_empty() {
        "workbook".to_string()
    } else {
        format!(".{extension}")
    };
    Err(IngestError::LibraryUnavailable(label))
}
