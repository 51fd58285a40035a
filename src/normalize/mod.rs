//! Reduction of either sheet layout into [`ParsedData`].

mod long;
mod wide;

use std::collections::{BTreeMap, HashMap};

use tracing::warn;

use crate::columns::{Column, DEFAULT_SEMESTER};
use crate::error::{Result, RowIssue};
use crate::models::{FormatKind, ParsedData, StudentRecord, SubjectResult, SubjectStatus};
use crate::sheet::{RawRow, RawSheet};

pub use long::LongFormatNormalizer;
pub use wide::WideFormatNormalizer;

/// Output of a successful normalisation.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub data: ParsedData,
    pub skipped: Vec<RowIssue>,
}

pub trait Normalizer {
    fn kind(&self) -> FormatKind;

    /// Fails only on dataset-level problems; bad rows are skipped and
    /// reported in [`Normalized::skipped`].
    fn normalize(&self, sheet: &RawSheet) -> Result<Normalized>;
}

pub fn normalizer_for(kind: FormatKind) -> Box<dyn Normalizer> {
    match kind {
        FormatKind::Wide => Box::new(WideFormatNormalizer),
        FormatKind::Long => Box::new(LongFormatNormalizer),
    }
}

/// Runs `parse` over every row, collecting per-row failures instead of
/// aborting.
fn walk_rows<F>(sheet: &RawSheet, skipped: &mut Vec<RowIssue>, mut parse: F)
where
    F: FnMut(&RawRow) -> std::result::Result<(), String>,
{
    for row in &sheet.rows {
        let outcome = sheet.check_shape(row).and_then(|()| parse(row));
        if let Err(reason) = outcome {
            warn!(row = row.number, %reason, "skipping row");
            skipped.push(RowIssue {
                row: row.number,
                reason,
            });
        }
    }
}

/// Accumulates the subject outcomes of one (roll, semester) pair.
struct RecordBuilder {
    roll_number: String,
    student_name: String,
    semester: String,
    department: Option<String>,
    order: Vec<String>,
    results: HashMap<String, SubjectResult>,
}

impl RecordBuilder {
    fn record(&mut self, subject: &str, result: SubjectResult) {
        if self.results.insert(subject.to_string(), result).is_none() {
            self.order.push(subject.to_string());
        }
    }

    fn finish(self) -> StudentRecord {
        let backlog_subjects: Vec<String> = self
            .order
            .iter()
            .filter(|s| self.results[s.as_str()].status.is_fail())
            .cloned()
            .collect();
        let overall_status = if backlog_subjects.is_empty() {
            SubjectStatus::Pass
        } else {
            SubjectStatus::Fail
        };

        StudentRecord {
            roll_number: self.roll_number,
            student_name: self.student_name,
            semester: self.semester,
            department: self.department,
            subject_results: self.results.into_iter().collect::<BTreeMap<_, _>>(),
            overall_status,
            backlog_subjects,
        }
    }
}

/// Student records keyed by (roll, semester), in first-appearance order.
#[derive(Default)]
struct StudentBook {
    index: HashMap<(String, String), usize>,
    builders: Vec<RecordBuilder>,
}

impl StudentBook {
    /// Builder for the pair, created from the first row that mentions it.
    fn entry(
        &mut self,
        roll_number: &str,
        semester: &str,
        student_name: impl FnOnce() -> String,
        department: impl FnOnce() -> Option<String>,
    ) -> &mut RecordBuilder {
        let key = (roll_number.to_string(), semester.to_string());
        let slot = match self.index.get(&key) {
            Some(&slot) => slot,
            None => {
                self.builders.push(RecordBuilder {
                    roll_number: key.0.clone(),
                    student_name: student_name(),
                    semester: key.1.clone(),
                    department: department(),
                    order: Vec::new(),
                    results: HashMap::new(),
                });
                self.index.insert(key, self.builders.len() - 1);
                self.builders.len() - 1
            }
        };
        &mut self.builders[slot]
    }

    fn finish(self) -> Vec<StudentRecord> {
        self.builders.into_iter().map(RecordBuilder::finish).collect()
    }
}

/// Trimmed cell text under an optional column.
fn optional_text(row: &RawRow, column: Option<&Column>) -> String {
    column
        .map(|c| row.cell(c.index).trimmed().to_string())
        .unwrap_or_default()
}

fn semester_of(row: &RawRow, column: Option<&Column>) -> String {
    let semester = optional_text(row, column);
    if semester.is_empty() {
        DEFAULT_SEMESTER.to_string()
    } else {
        semester
    }
}

fn department_of(row: &RawRow, column: Option<&Column>) -> Option<String> {
    Some(optional_text(row, column)).filter(|d| !d.is_empty())
}
