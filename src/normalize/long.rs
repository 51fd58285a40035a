use std::collections::BTreeMap;

use tracing::debug;

use super::{department_of, optional_text, semester_of, walk_rows, Normalized, Normalizer, StudentBook};
use crate::columns::{
    is_fail_grade, parse_number, resolve_grade_letter, Column, DEPARTMENT, GRADE_POINT,
    HALL_TICKET, SEMESTER, STUDENT_NAME, SUBJECT_CODE, SUBJECT_NAME,
};
use crate::error::{ColumnCategory, IngestError, Result};
use crate::models::{FormatKind, ParsedData, SubjectResult, SubjectStatus};
use crate::sheet::RawSheet;

/// One row per student per subject, as exported by result portals:
/// hall ticket, subject code/name and a grade letter on every row.
#[derive(Debug, Clone, Copy, Default)]
pub struct LongFormatNormalizer;

struct LongColumns {
    hall_ticket: Column,
    grade_letter: Column,
    grade_point: Option<Column>,
    subject_code: Option<Column>,
    subject_name: Option<Column>,
    name: Option<Column>,
    semester: Option<Column>,
    department: Option<Column>,
}

impl LongColumns {
    fn resolve(headers: &[String]) -> Result<Self> {
        let hall_ticket = HALL_TICKET
            .resolve(headers, &[])
            .ok_or_else(|| IngestError::missing(ColumnCategory::HallTicket))?;
        let grade_letter = resolve_grade_letter(headers)
            .ok_or_else(|| IngestError::missing(ColumnCategory::GradeLetter))?;
        let mut taken = vec![hall_ticket.clone(), grade_letter.clone()];

        let grade_point = GRADE_POINT.resolve(headers, &taken);
        taken.extend(grade_point.clone());
        let subject_code = SUBJECT_CODE.resolve(headers, &taken);
        taken.extend(subject_code.clone());
        let subject_name = SUBJECT_NAME.resolve(headers, &taken);
        taken.extend(subject_name.clone());
        let name = STUDENT_NAME.resolve(headers, &taken);
        taken.extend(name.clone());
        let semester = SEMESTER.resolve(headers, &taken);
        taken.extend(semester.clone());
        let department = DEPARTMENT.resolve(headers, &taken);

        debug!(
            hall_ticket = %hall_ticket.header,
            grade_letter = %grade_letter.header,
            subject_code = ?subject_code.as_ref().map(|c| &c.header),
            subject_name = ?subject_name.as_ref().map(|c| &c.header),
            "resolved long-format columns"
        );

        Ok(Self {
            hall_ticket,
            grade_letter,
            grade_point,
            subject_code,
            subject_name,
            name,
            semester,
            department,
        })
    }
}

impl Normalizer for LongFormatNormalizer {
    fn kind(&self) -> FormatKind {
        FormatKind::Long
    }

    fn normalize(&self, sheet: &RawSheet) -> Result<Normalized> {
        let columns = LongColumns::resolve(&sheet.headers)?;
        let mut book = StudentBook::default();
        let mut catalog: BTreeMap<String, String> = BTreeMap::new();
        let mut skipped = Vec::new();

        walk_rows(sheet, &mut skipped, |row| {
            let roll_number = row.cell(columns.hall_ticket.index).trimmed();
            if roll_number.is_empty() {
                return Ok(());
            }

            let code = optional_text(row, columns.subject_code.as_ref());
            let subject_name = optional_text(row, columns.subject_name.as_ref());
            let subject = if code.is_empty() { &subject_name } else { &code };
            if subject.is_empty() {
                return Ok(());
            }

            if !code.is_empty() {
                if subject_name.is_empty() {
                    catalog.entry(code.clone()).or_default();
                } else {
                    catalog.insert(code.clone(), subject_name.clone());
                }
            }

            let grade = row.cell(columns.grade_letter.index).trimmed();
            let semester = semester_of(row, columns.semester.as_ref());
            let record = book.entry(
                roll_number,
                &semester,
                || optional_text(row, columns.name.as_ref()),
                || department_of(row, columns.department.as_ref()),
            );
            if grade.is_empty() {
                return Ok(());
            }

            let status = if is_fail_grade(grade) {
                SubjectStatus::Fail
            } else {
                SubjectStatus::Pass
            };
            let marks = columns
                .grade_point
                .as_ref()
                .and_then(|c| parse_number(row.cell(c.index).trimmed()));
            record.record(subject, SubjectResult { marks, status });
            Ok(())
        });

        Ok(Normalized {
            data: ParsedData::from_students(book.finish(), catalog),
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::CellValue;

    fn sheet(headers: &[&str], rows: &[&[&str]]) -> RawSheet {
        let mut sheet = RawSheet::new(headers.iter().map(|h| h.to_string()).collect());
        for (index, row) in rows.iter().enumerate() {
            let cells = row.iter().map(|c| CellValue::from_text(*c)).collect();
            sheet.push_row(index + 2, cells);
        }
        sheet
    }

    #[test]
    fn rows_group_into_one_record_with_catalog() {
        let sheet = sheet(
            &["HTNO", "SUBCODE", "SUBNAME", "GRADE_LETTER"],
            &[
                &["201", "CS101", "Comp Sci", "F"],
                &["201", "CS102", "Maths", "A"],
            ],
        );
        let out = LongFormatNormalizer.normalize(&sheet).expect("normalize");

        assert_eq!(out.data.students.len(), 1);
        let student = &out.data.students[0];
        assert_eq!(student.roll_number, "201");
        assert_eq!(student.student_name, "");
        assert_eq!(student.subject_results.len(), 2);
        assert_eq!(student.backlog_subjects, vec!["CS101"]);
        assert_eq!(student.overall_status, SubjectStatus::Fail);
        assert_eq!(out.data.subject_catalog.len(), 2);
        assert_eq!(out.data.subject_catalog["CS101"], "Comp Sci");
        assert_eq!(out.data.subject_catalog["CS102"], "Maths");
    }

    #[test]
    fn grade_points_become_marks() {
        let sheet = sheet(
            &["HTNO", "Student Name", "SUBCODE", "GRADE_POINT", "GRADE_LETTER"],
            &[&["301", "Ravi", "EE201", "8", "A"], &["301", "Ravi", "EE202", "-", "AB"]],
        );
        let out = LongFormatNormalizer.normalize(&sheet).expect("normalize");
        let student = &out.data.students[0];

        assert_eq!(student.student_name, "Ravi");
        assert_eq!(student.subject_results["EE201"].marks, Some(8.0));
        assert_eq!(student.subject_results["EE202"].marks, None);
        assert_eq!(student.subject_results["EE202"].status, SubjectStatus::Fail);
        assert_eq!(out.data.subject_catalog["EE201"], "");
    }

    #[test]
    fn subject_name_stands_in_for_missing_code() {
        let sheet = sheet(
            &["HTNO", "SUBCODE", "SUBNAME", "GRADE"],
            &[&["1", "", "Physics", "B"], &["1", "", "", "A"]],
        );
        let out = LongFormatNormalizer.normalize(&sheet).expect("normalize");
        assert_eq!(out.data.subjects, vec!["Physics"]);
        assert!(out.data.subject_catalog.is_empty());
    }

    #[test]
    fn students_split_by_semester() {
        let sheet = sheet(
            &["HTNO", "SEMESTER", "BRANCH", "SUBCODE", "GRADE_LETTER"],
            &[
                &["1", "Semester 1", "CSE", "A1", "F"],
                &["1", "Semester 2", "CSE", "B1", "A"],
                &["2", "", "ECE", "A1", "ABSENT"],
            ],
        );
        let out = LongFormatNormalizer.normalize(&sheet).expect("normalize");
        assert_eq!(out.data.students.len(), 3);
        assert_eq!(out.data.semesters, vec!["Semester 1", "Semester 2"]);
        assert_eq!(out.data.departments, vec!["CSE", "ECE"]);
        assert_eq!(out.data.students[2].backlog_subjects, vec!["A1"]);
    }

    #[test]
    fn later_rows_overwrite_catalog_names() {
        let sheet = sheet(
            &["HTNO", "SUBCODE", "SUBNAME", "GRADE"],
            &[
                &["1", "CS1", "Old", "A"],
                &["2", "CS1", "New", "A"],
                &["3", "CS1", "", "A"],
            ],
        );
        let out = LongFormatNormalizer.normalize(&sheet).expect("normalize");
        assert_eq!(out.data.subject_catalog["CS1"], "New");
    }

    #[test]
    fn empty_grade_omits_the_subject() {
        let sheet = sheet(
            &["HTNO", "SUBCODE", "GRADE"],
            &[&["1", "CS1", ""], &["1", "CS2", "C"]],
        );
        let out = LongFormatNormalizer.normalize(&sheet).expect("normalize");
        let student = &out.data.students[0];
        assert_eq!(student.subject_results.len(), 1);
        assert!(student.subject_results.contains_key("CS2"));
    }

    #[test]
    fn missing_grade_letter_aborts() {
        let sheet = sheet(&["HTNO", "SUBCODE", "MARKS"], &[&["1", "CS1", "50"]]);
        let err = LongFormatNormalizer.normalize(&sheet).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumn {
                category: ColumnCategory::GradeLetter
            }
        ));
    }

    #[test]
    fn missing_hall_ticket_aborts() {
        let sheet = sheet(&["ROLL", "SUBCODE", "GRADE"], &[&["1", "CS1", "A"]]);
        let err = LongFormatNormalizer.normalize(&sheet).unwrap_err();
        assert!(matches!(
            err,
            IngestError::MissingColumn {
                category: ColumnCategory::HallTicket
            }
        ));
    }
}
