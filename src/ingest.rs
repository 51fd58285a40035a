//! Upload entry point: bytes in, a complete dataset or one error out.

use std::path::Path;

use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::detect::detect_format;
use crate::error::{IngestError, Result, RowIssue};
use crate::models::{FormatKind, ParsedData};
use crate::normalize::normalizer_for;
use crate::sheet::{reader_for_path, SpreadsheetReader};

/// A successful import. Rows listed in `skipped` were left out of `data`.
#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub id: Uuid,
    pub format: FormatKind,
    pub data: ParsedData,
    pub skipped: Vec<RowIssue>,
}

/// Decodes and normalises one upload. Either the whole dataset comes back
/// or nothing does.
pub fn ingest_bytes(reader: &dyn SpreadsheetReader, bytes: &[u8]) -> Result<ImportOutcome> {
    let id = Uuid::new_v4();
    let span = info_span!("import", %id);
    let _guard = span.enter();

    let sheet = reader
        .read_first_sheet(bytes)?
        .ok_or(IngestError::EmptyWorkbook)?;
    if sheet.rows.is_empty() {
        return Err(IngestError::EmptyData);
    }

    let normalizer = normalizer_for(detect_format(&sheet.headers));
    let format = normalizer.kind();
    info!(%format, rows = sheet.rows.len(), "detected sheet format");

    let normalized = normalizer.normalize(&sheet)?;
    if normalized.data.students.is_empty() {
        return Err(IngestError::NoValidRecords);
    }

    let mut skipped = sheet.skipped;
    skipped.extend(normalized.skipped);
    skipped.sort_by_key(|issue| issue.row);
    if !skipped.is_empty() {
        warn!(count = skipped.len(), "import finished with skipped rows");
    }

    info!(
        students = normalized.data.students.len(),
        semesters = normalized.data.semesters.len(),
        subjects = normalized.data.subjects.len(),
        "import complete"
    );

    Ok(ImportOutcome {
        id,
        format,
        data: normalized.data,
        skipped,
    })
}

/// Reads `path` and imports it off the async runtime's worker threads.
pub async fn ingest_file(path: &Path) -> Result<ImportOutcome> {
    let reader = reader_for_path(path)?;
    let bytes = tokio::fs::read(path).await?;

    tokio::task::spawn_blocking(move || ingest_bytes(reader.as_ref(), &bytes))
        .await
        .map_err(|err| IngestError::Interrupted(err.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ColumnCategory;
    use crate::sheet::{CsvReader, RawSheet};

    struct NoSheets;

    impl SpreadsheetReader for NoSheets {
        fn read_first_sheet(&self, _bytes: &[u8]) -> Result<Option<RawSheet>> {
            Ok(None)
        }
    }

    #[test]
    fn workbook_without_sheets_fails() {
        let err = ingest_bytes(&NoSheets, b"").unwrap_err();
        assert!(matches!(err, IngestError::EmptyWorkbook));
    }

    #[test]
    fn header_only_sheet_is_empty_data() {
        let err = ingest_bytes(&CsvReader::comma(), b"Roll,Maths\n").unwrap_err();
        assert!(matches!(err, IngestError::EmptyData));

        let err = ingest_bytes(&CsvReader::comma(), b"").unwrap_err();
        assert!(matches!(err, IngestError::EmptyData));
    }

    #[test]
    fn all_rows_without_roll_is_no_valid_records() {
        let err = ingest_bytes(&CsvReader::comma(), b"Roll,Name,Maths\n,Alice,50\n").unwrap_err();
        assert!(matches!(err, IngestError::NoValidRecords));
    }

    #[test]
    fn dispatches_to_long_format() {
        let csv = b"HTNO,SUBCODE,SUBNAME,GRADE_LETTER\n201,CS101,Comp Sci,F\n201,CS102,Maths,A\n";
        let outcome = ingest_bytes(&CsvReader::comma(), csv).expect("import");
        assert_eq!(outcome.format, FormatKind::Long);
        assert_eq!(outcome.data.students.len(), 1);
        assert_eq!(outcome.data.students[0].backlog_subjects, vec!["CS101"]);
    }

    #[test]
    fn grade_point_without_letter_is_missing_column() {
        let err = ingest_bytes(&CsvReader::comma(), b"HTNO,SUBCODE,GRADE_POINT\n201,CS101,0\n")
            .unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumn {
                category: ColumnCategory::GradeLetter
            }
        ));
    }

    #[test]
    fn skipped_rows_are_reported_in_row_order() {
        let csv = b"Roll,Maths\n1,50\n2,60,extra\n3,20\n";
        let outcome = ingest_bytes(&CsvReader::comma(), csv).expect("import");
        assert_eq!(outcome.format, FormatKind::Wide);
        assert_eq!(outcome.data.students.len(), 2);
        assert_eq!(outcome.skipped.len(), 1);
        assert_eq!(outcome.skipped[0].row, 3);
    }
}
