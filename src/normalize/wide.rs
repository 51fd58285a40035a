use std::collections::BTreeMap;

use tracing::debug;

use super::{department_of, optional_text, semester_of, walk_rows, Normalized, Normalizer, StudentBook};
use crate::columns::{
    is_fail_grade, parse_number, Column, DEPARTMENT, PASS_MARK, ROLL, SEMESTER, STUDENT_NAME,
    WIDE_METADATA_HEADERS,
};
use crate::error::{ColumnCategory, IngestError, Result};
use crate::models::{FormatKind, ParsedData, SubjectResult, SubjectStatus};
use crate::sheet::{CellValue, RawSheet};

/// One row per student, one column per subject. Cells hold either a
/// numeric score or a pass/fail style text grade.
#[derive(Debug, Clone, Copy, Default)]
pub struct WideFormatNormalizer;

struct WideColumns {
    roll: Column,
    name: Option<Column>,
    semester: Option<Column>,
    department: Option<Column>,
    subjects: Vec<Column>,
}

impl WideColumns {
    fn resolve(headers: &[String]) -> Result<Self> {
        let roll = ROLL
            .resolve(headers, &[])
            .ok_or_else(|| IngestError::missing(ColumnCategory::RollNumber))?;
        let mut taken = vec![roll.clone()];

        let name = STUDENT_NAME.resolve(headers, &taken);
        taken.extend(name.clone());
        let semester = SEMESTER.resolve(headers, &taken);
        taken.extend(semester.clone());
        let department = DEPARTMENT.resolve(headers, &taken);
        taken.extend(department.clone());

        let subjects: Vec<Column> = headers
            .iter()
            .enumerate()
            .filter(|(index, header)| {
                let lower = header.trim().to_lowercase();
                !taken.iter().any(|c| c.index == *index)
                    && !lower.is_empty()
                    && !lower.starts_with("__empty")
                    && !WIDE_METADATA_HEADERS.contains(&lower.as_str())
            })
            .map(|(index, header)| Column {
                index,
                header: header.clone(),
            })
            .collect();

        if subjects.is_empty() {
            return Err(IngestError::missing(ColumnCategory::Subject));
        }

        debug!(
            roll = %roll.header,
            name = ?name.as_ref().map(|c| &c.header),
            semester = ?semester.as_ref().map(|c| &c.header),
            department = ?department.as_ref().map(|c| &c.header),
            subjects = subjects.len(),
            "resolved wide-format columns"
        );

        Ok(Self {
            roll,
            name,
            semester,
            department,
            subjects,
        })
    }
}

/// Outcome of one subject cell, or `None` when the cell is empty.
pub(crate) fn classify_cell(cell: &CellValue) -> Option<SubjectResult> {
    let value = cell.trimmed();
    if value.is_empty() {
        return None;
    }

    if let Some(marks) = parse_number(value) {
        let status = if marks >= PASS_MARK {
            SubjectStatus::Pass
        } else {
            SubjectStatus::Fail
        };
        return Some(SubjectResult {
            marks: Some(marks),
            status,
        });
    }

    let status = if is_fail_grade(value) || value.to_uppercase().contains("FAIL") {
        SubjectStatus::Fail
    } else {
        SubjectStatus::Pass
    };
    Some(SubjectResult {
        marks: None,
        status,
    })
}

impl Normalizer for WideFormatNormalizer {
    fn kind(&self) -> FormatKind {
        FormatKind::Wide
    }

    fn normalize(&self, sheet: &RawSheet) -> Result<Normalized> {
        let columns = WideColumns::resolve(&sheet.headers)?;
        let mut book = StudentBook::default();
        let mut skipped = Vec::new();

        walk_rows(sheet, &mut skipped, |row| {
            let roll_number = row.cell(columns.roll.index).trimmed();
            if roll_number.is_empty() {
                return Ok(());
            }

            let semester = semester_of(row, columns.semester.as_ref());
            let record = book.entry(
                roll_number,
                &semester,
                || optional_text(row, columns.name.as_ref()),
                || department_of(row, columns.department.as_ref()),
            );

            for subject in &columns.subjects {
                if let Some(result) = classify_cell(row.cell(subject.index)) {
                    record.record(&subject.header, result);
                }
            }
            Ok(())
        });

        // Column labels double as identifiers; no names are known.
        let students = book.finish();
        let catalog: BTreeMap<String, String> = students
            .iter()
            .flat_map(|s| s.subject_results.keys())
            .map(|subject| (subject.clone(), String::new()))
            .collect();

        Ok(Normalized {
            data: ParsedData::from_students(students, catalog),
            skipped,
        })
    }
}
