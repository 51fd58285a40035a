use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::analytics::{compare_semesters, compute_semester_analytics};
use crate::backlog::{backlog_distribution, subject_failures};
use crate::models::{
    BacklogGroup, FormatKind, ParsedData, SemesterAnalytics, SemesterChange, StudentRecord, Trend,
};

pub fn format_percentage(value: f64) -> String {
    if !value.is_finite() {
        return "0%".to_string();
    }
    format!("{value:.1}%")
}

pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    format!("{}", value.round() as i64)
}

fn format_change(value: f64) -> String {
    let sign = if value > 0.0 { "+" } else { "" };
    format!("{sign}{}", format_percentage(value))
}

/// Initials of each word, uppercased: "Digital Electronics" -> "DE".
pub fn subject_abbreviation(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|word| word.chars().next())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Catalog name for `code`; wide sheets record an empty name.
fn subject_name<'a>(code: &str, catalog: &'a BTreeMap<String, String>) -> Option<&'a str> {
    catalog
        .get(code)
        .map(String::as_str)
        .filter(|name| !name.is_empty())
}

/// `CODE (ABBR)` when the catalog knows the subject's name, else `CODE`.
pub fn subject_label(code: &str, catalog: &BTreeMap<String, String>) -> String {
    let abbreviation = subject_name(code, catalog)
        .map(subject_abbreviation)
        .unwrap_or_default();
    if abbreviation.is_empty() {
        code.to_string()
    } else {
        format!("{code} ({abbreviation})")
    }
}

/// Machine-readable form of the full report.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument<'a> {
    pub import_id: Uuid,
    pub format: FormatKind,
    pub generated_at: DateTime<Utc>,
    pub department: Option<&'a str>,
    pub departments: &'a [String],
    pub semesters: Vec<SemesterSection>,
    pub comparison: Vec<SemesterChange>,
    pub subject_catalog: &'a BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SemesterSection {
    pub analytics: SemesterAnalytics,
    pub subject_failures: BTreeMap<String, Vec<String>>,
    pub backlog_distribution: Vec<BacklogGroup>,
}

pub fn build_document<'a>(
    import_id: Uuid,
    format: FormatKind,
    generated_at: DateTime<Utc>,
    department: Option<&'a str>,
    data: &'a ParsedData,
) -> ReportDocument<'a> {
    let analytics = compute_semester_analytics(data);
    let comparison = compare_semesters(&analytics);
    let semesters = analytics
        .into_values()
        .map(|summary| {
            let students: Vec<&StudentRecord> =
                data.students_in_semester(&summary.semester).collect();
            SemesterSection {
                subject_failures: subject_failures(students.iter().copied()),
                backlog_distribution: backlog_distribution(students.iter().copied()),
                analytics: summary,
            }
        })
        .collect();

    ReportDocument {
        import_id,
        format,
        generated_at,
        department,
        departments: &data.departments,
        semesters,
        comparison,
        subject_catalog: &data.subject_catalog,
    }
}

pub fn render_markdown(document: &ReportDocument<'_>) -> String {
    let mut output = String::new();
    let scope = document.department.unwrap_or("all departments");

    let _ = writeln!(output, "# Academic Result Analytics");
    let _ = writeln!(
        output,
        "Generated for {} on {} ({} format, import {})",
        scope,
        document.generated_at.format("%Y-%m-%d %H:%M UTC"),
        document.format,
        document.import_id
    );

    for section in &document.semesters {
        let summary = &section.analytics;
        let _ = writeln!(output);
        let _ = writeln!(output, "## {}", summary.semester);
        let _ = writeln!(
            output,
            "- Students: {} ({} passed, {} failed)",
            summary.total_students, summary.passed_count, summary.failed_count
        );
        let _ = writeln!(
            output,
            "- Pass rate {} / failure rate {}",
            format_percentage(summary.pass_percentage),
            format_percentage(summary.failure_percentage)
        );
        let _ = writeln!(
            output,
            "- Backlogs: {} across {} students",
            summary.total_backlogs, summary.students_with_backlogs
        );

        let _ = writeln!(output);
        let _ = writeln!(output, "### Subject Backlogs");
        if section.subject_failures.is_empty() {
            let _ = writeln!(output, "No backlogs recorded for this semester.");
        } else {
            let mut subjects: Vec<(&String, &Vec<String>)> =
                section.subject_failures.iter().collect();
            subjects.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));
            for (subject, rolls) in subjects {
                let _ = writeln!(
                    output,
                    "- {}: {} students ({})",
                    subject_label(subject, document.subject_catalog),
                    rolls.len(),
                    rolls.join(", ")
                );
            }
        }

        let _ = writeln!(output);
        let _ = writeln!(output, "### Backlog Distribution");
        if section.backlog_distribution.is_empty() {
            let _ = writeln!(output, "Every student cleared all subjects.");
        } else {
            for group in &section.backlog_distribution {
                let _ = writeln!(
                    output,
                    "- {} backlog(s): {} students ({})",
                    group.backlog_count,
                    group.student_count,
                    group.roll_numbers.join(", ")
                );
            }
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Semester Comparison");
    if document.comparison.is_empty() {
        let _ = writeln!(output, "Multiple semesters required for comparison.");
    } else {
        for change in &document.comparison {
            let _ = writeln!(
                output,
                "- {} -> {}: pass rate {} ({}), failure rate {} ({})",
                change.from,
                change.to,
                format_change(change.pass_rate_change.value),
                trend_label(change.pass_rate_change.trend),
                format_change(change.failure_rate_change.value),
                trend_label(change.failure_rate_change.trend)
            );
        }
    }

    output
}

fn trend_label(trend: Trend) -> &'static str {
    match trend {
        Trend::Up => "up",
        Trend::Down => "down",
        Trend::Neutral => "no change",
    }
}

/// Result sheet for one looked-up record.
pub fn render_student_sheet(student: &StudentRecord, catalog: &BTreeMap<String, String>) -> String {
    let mut output = String::new();
    let name = if student.student_name.is_empty() {
        "Name not available"
    } else {
        student.student_name.as_str()
    };

    let _ = writeln!(output, "{} ({}) - {}", student.roll_number, name, student.semester);
    if let Some(department) = &student.department {
        let _ = writeln!(output, "Department: {department}");
    }
    let _ = writeln!(
        output,
        "Overall: {} with {} backlog(s)",
        student.overall_status.label().to_uppercase(),
        student.backlog_count()
    );

    for (code, result) in &student.subject_results {
        let marks = result
            .marks
            .map(|m| format!("{m}"))
            .unwrap_or_else(|| "-".to_string());
        let title = subject_name(code, catalog)
            .map(|name| format!(" {name}"))
            .unwrap_or_default();
        let _ = writeln!(
            output,
            "  {}{}: {} [{}]",
            code,
            title,
            marks,
            result.status.label()
        );
    }

    if student.has_backlogs() {
        let _ = writeln!(output, "Backlogs: {}", student.backlog_subjects.join(", "));
    }

    output
}
