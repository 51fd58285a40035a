//! Header synonyms and grade vocabulary shared by both sheet layouts.

use lazy_static::lazy_static;
use regex::Regex;

/// Grades that count as a failed subject, compared against the trimmed,
/// uppercased cell text.
pub const FAIL_GRADES: [&str; 4] = ["F", "AB", "ABSENT", "FAIL"];

/// Numeric scores at or above this mark pass.
pub const PASS_MARK: f64 = 40.0;

pub const DEFAULT_SEMESTER: &str = "Semester 1";

/// Header labels (lowercased) that never name a subject in a wide sheet.
pub const WIDE_METADATA_HEADERS: [&str; 11] = [
    "backlog",
    "backlogs",
    "status",
    "result",
    "total",
    "percentage",
    "grade",
    "branch",
    "department",
    "dept",
    "htno",
];

/// An ordered list of header patterns for one column role. Earlier
/// patterns win over later ones; within a pattern the leftmost header wins.
pub struct ColumnRule {
    patterns: Vec<Regex>,
}

impl ColumnRule {
    fn new(patterns: &[&str]) -> Self {
        let patterns = patterns
            .iter()
            .map(|p| Regex::new(&format!("(?i){p}")).expect("column pattern is valid"))
            .collect();
        Self { patterns }
    }

    pub fn matches(&self, header: &str) -> bool {
        self.patterns.iter().any(|p| p.is_match(header))
    }

    /// First header satisfying the rule, skipping columns already taken by
    /// another role.
    pub fn resolve(&self, headers: &[String], taken: &[Column]) -> Option<Column> {
        self.patterns.iter().find_map(|pattern| {
            headers.iter().enumerate().find_map(|(index, header)| {
                let claimed = taken.iter().any(|c| c.index == index);
                (!claimed && pattern.is_match(header)).then(|| Column {
                    index,
                    header: header.clone(),
                })
            })
        })
    }
}

lazy_static! {
    pub static ref HALL_TICKET: ColumnRule = ColumnRule::new(&["htno|hall.*ticket"]);
    pub static ref ROLL: ColumnRule =
        ColumnRule::new(&["htno|hall.*ticket|roll|id|student.*id|enrollment"]);
    pub static ref STUDENT_NAME: ColumnRule = ColumnRule::new(&["student.*name", "name"]);
    pub static ref SEMESTER: ColumnRule = ColumnRule::new(&["sem|semester"]);
    pub static ref DEPARTMENT: ColumnRule = ColumnRule::new(&["branch|department|dept"]);
    pub static ref SUBJECT_CODE: ColumnRule =
        ColumnRule::new(&["subcode|sub.*code|subject.*code"]);
    pub static ref SUBJECT_NAME: ColumnRule =
        ColumnRule::new(&["subname|sub.*name|subject.*name"]);
    pub static ref GRADE_POINT: ColumnRule = ColumnRule::new(&["grade.*point|point"]);
    pub static ref GRADE_LETTER: ColumnRule =
        ColumnRule::new(&["grade.*letter", "letter", "grade"]);
}

/// A header resolved to a role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub index: usize,
    pub header: String,
}

/// Grade letter column, never the grade point column even though both
/// contain "grade".
pub fn resolve_grade_letter(headers: &[String]) -> Option<Column> {
    let taken: Vec<Column> = GRADE_POINT.resolve(headers, &[]).into_iter().collect();
    GRADE_LETTER.resolve(headers, &taken)
}

/// Strict numeric parse of a cell: the whole trimmed text must be a finite
/// decimal number.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn is_fail_grade(text: &str) -> bool {
    let grade = text.trim().to_uppercase();
    FAIL_GRADES.contains(&grade.as_str())
}
