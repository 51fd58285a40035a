use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubjectStatus {
    Pass,
    Fail,
}

impl SubjectStatus {
    pub fn is_fail(self) -> bool {
        self == SubjectStatus::Fail
    }

    pub fn label(self) -> &'static str {
        match self {
            SubjectStatus::Pass => "pass",
            SubjectStatus::Fail => "fail",
        }
    }
}

/// Which of the two sheet layouts a workbook uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatKind {
    /// One row per student, one column per subject.
    Wide,
    /// One row per student per subject.
    Long,
}

impl std::fmt::Display for FormatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormatKind::Wide => write!(f, "wide"),
            FormatKind::Long => write!(f, "long"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubjectResult {
    /// Numeric score or grade point; absent for letter-only grades.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub marks: Option<f64>,
    pub status: SubjectStatus,
}

/// One student's results within one semester.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentRecord {
    pub roll_number: String,
    pub student_name: String,
    pub semester: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    pub subject_results: BTreeMap<String, SubjectResult>,
    pub overall_status: SubjectStatus,
    /// Failed subjects in the order they were encountered.
    pub backlog_subjects: Vec<String>,
}

impl StudentRecord {
    pub fn backlog_count(&self) -> usize {
        self.backlog_subjects.len()
    }

    pub fn has_backlogs(&self) -> bool {
        !self.backlog_subjects.is_empty()
    }
}

/// The unified dataset produced by one import.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedData {
    pub students: Vec<StudentRecord>,
    pub semesters: Vec<String>,
    pub subjects: Vec<String>,
    pub departments: Vec<String>,
    pub subject_catalog: BTreeMap<String, String>,
}

impl ParsedData {
    /// Builds the dataset, deriving the sorted semester, subject and
    /// department sets from `students`.
    pub fn from_students(
        students: Vec<StudentRecord>,
        subject_catalog: BTreeMap<String, String>,
    ) -> Self {
        let departments = students
            .iter()
            .filter_map(|s| s.department.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        Self::with_departments(students, subject_catalog, departments)
    }

    fn with_departments(
        students: Vec<StudentRecord>,
        subject_catalog: BTreeMap<String, String>,
        departments: Vec<String>,
    ) -> Self {
        let mut semesters = BTreeSet::new();
        let mut subjects = BTreeSet::new();

        for student in &students {
            semesters.insert(student.semester.clone());
            subjects.extend(student.subject_results.keys().cloned());
            subjects.extend(student.backlog_subjects.iter().cloned());
        }

        Self {
            students,
            semesters: semesters.into_iter().collect(),
            subjects: subjects.into_iter().collect(),
            departments,
            subject_catalog,
        }
    }

    /// Restricts the dataset to one department. Semesters, subjects and the
    /// catalog are recomputed from the subset; the department list is kept
    /// from the full dataset so a picker can still offer every choice.
    pub fn filter_by_department(&self, department: Option<&str>) -> ParsedData {
        let Some(department) = department else {
            return self.clone();
        };

        let students: Vec<StudentRecord> = self
            .students
            .iter()
            .filter(|s| s.department.as_deref() == Some(department))
            .cloned()
            .collect();

        let mut filtered = Self::with_departments(
            students,
            BTreeMap::new(),
            self.departments.clone(),
        );
        let catalog = self
            .subject_catalog
            .iter()
            .filter(|&(code, _)| filtered.subjects.binary_search(code).is_ok())
            .map(|(code, name)| (code.clone(), name.clone()))
            .collect();
        filtered.subject_catalog = catalog;
        filtered
    }

    pub fn students_in_semester<'a>(
        &'a self,
        semester: &'a str,
    ) -> impl Iterator<Item = &'a StudentRecord> + 'a {
        self.students.iter().filter(move |s| s.semester == semester)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterAnalytics {
    pub semester: String,
    pub total_students: usize,
    pub passed_count: usize,
    pub failed_count: usize,
    pub pass_percentage: f64,
    pub failure_percentage: f64,
    pub total_backlogs: usize,
    pub students_with_backlogs: usize,
    pub subject_wise_backlogs: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacklogGroup {
    pub backlog_count: usize,
    pub student_count: usize,
    pub roll_numbers: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateChange {
    pub value: f64,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterChange {
    pub from: String,
    pub to: String,
    pub pass_rate_change: RateChange,
    pub failure_rate_change: RateChange,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(roll: &str, semester: &str, department: Option<&str>, subjects: &[&str]) -> StudentRecord {
        StudentRecord {
            roll_number: roll.to_string(),
            student_name: String::new(),
            semester: semester.to_string(),
            department: department.map(str::to_string),
            subject_results: subjects
                .iter()
                .map(|s| {
                    (
                        s.to_string(),
                        SubjectResult {
                            marks: None,
                            status: SubjectStatus::Pass,
                        },
                    )
                })
                .collect(),
            overall_status: SubjectStatus::Pass,
            backlog_subjects: Vec::new(),
        }
    }

    #[test]
    fn derived_sets_are_sorted_and_deduplicated() {
        let data = ParsedData::from_students(
            vec![
                record("2", "Semester 2", Some("ECE"), &["Physics", "Maths"]),
                record("1", "Semester 1", Some("CSE"), &["Maths"]),
                record("3", "Semester 1", None, &["Chemistry"]),
            ],
            BTreeMap::new(),
        );

        assert_eq!(data.semesters, vec!["Semester 1", "Semester 2"]);
        assert_eq!(data.subjects, vec!["Chemistry", "Maths", "Physics"]);
        assert_eq!(data.departments, vec!["CSE", "ECE"]);
    }

    #[test]
    fn department_filter_keeps_full_department_list() {
        let mut catalog = BTreeMap::new();
        catalog.insert("Maths".to_string(), "Mathematics".to_string());
        catalog.insert("Physics".to_string(), "Applied Physics".to_string());
        let data = ParsedData::from_students(
            vec![
                record("1", "Semester 1", Some("CSE"), &["Maths"]),
                record("2", "Semester 2", Some("ECE"), &["Physics"]),
            ],
            catalog,
        );

        let cse = data.filter_by_department(Some("CSE"));
        assert_eq!(cse.students.len(), 1);
        assert_eq!(cse.semesters, vec!["Semester 1"]);
        assert_eq!(cse.subjects, vec!["Maths"]);
        assert_eq!(cse.departments, vec!["CSE", "ECE"]);
        assert_eq!(cse.subject_catalog.len(), 1);

        assert_eq!(data.filter_by_department(None), data);
    }
}
