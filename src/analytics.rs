use std::collections::BTreeMap;

use crate::models::{
    ParsedData, RateChange, SemesterAnalytics, SemesterChange, StudentRecord, SubjectStatus, Trend,
};

pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Summary statistics for the students of one semester.
pub fn summarize_semester<'a>(
    semester: &str,
    students: impl IntoIterator<Item = &'a StudentRecord>,
) -> SemesterAnalytics {
    let mut total_students = 0usize;
    let mut passed_count = 0usize;
    let mut total_backlogs = 0usize;
    let mut students_with_backlogs = 0usize;
    let mut subject_wise_backlogs: BTreeMap<String, usize> = BTreeMap::new();

    for student in students {
        total_students += 1;
        if student.overall_status == SubjectStatus::Pass {
            passed_count += 1;
        }
        if student.has_backlogs() {
            students_with_backlogs += 1;
        }
        total_backlogs += student.backlog_count();
        for subject in &student.backlog_subjects {
            *subject_wise_backlogs.entry(subject.clone()).or_insert(0) += 1;
        }
    }

    let failed_count = total_students - passed_count;
    SemesterAnalytics {
        semester: semester.to_string(),
        total_students,
        passed_count,
        failed_count,
        pass_percentage: percentage(passed_count, total_students),
        failure_percentage: percentage(failed_count, total_students),
        total_backlogs,
        students_with_backlogs,
        subject_wise_backlogs,
    }
}

/// One [`SemesterAnalytics`] per semester of `data`, keyed and ordered by
/// semester label.
pub fn compute_semester_analytics(data: &ParsedData) -> BTreeMap<String, SemesterAnalytics> {
    data.semesters
        .iter()
        .map(|semester| {
            let summary = summarize_semester(semester, data.students_in_semester(semester));
            (semester.clone(), summary)
        })
        .collect()
}

fn rate_change(current: f64, previous: f64) -> RateChange {
    if previous == 0.0 {
        return RateChange {
            value: 0.0,
            trend: Trend::Neutral,
        };
    }

    let value = current - previous;
    let trend = if value > 0.0 {
        Trend::Up
    } else if value < 0.0 {
        Trend::Down
    } else {
        Trend::Neutral
    };
    RateChange { value, trend }
}

/// Pass and failure rate movement between each pair of consecutive
/// semesters. Empty when fewer than two semesters exist.
pub fn compare_semesters(analytics: &BTreeMap<String, SemesterAnalytics>) -> Vec<SemesterChange> {
    let ordered: Vec<&SemesterAnalytics> = analytics.values().collect();
    ordered
        .windows(2)
        .map(|pair| {
            let (previous, current) = (pair[0], pair[1]);
            SemesterChange {
                from: previous.semester.clone(),
                to: current.semester.clone(),
                pass_rate_change: rate_change(current.pass_percentage, previous.pass_percentage),
                failure_rate_change: rate_change(
                    current.failure_percentage,
                    previous.failure_percentage,
                ),
            }
        })
        .collect()
}
