use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{BacklogGroup, StudentRecord};

/// Human-friendly ordering for roll numbers: digit runs compare by value
/// ("2" before "10") and letters compare without regard to case. Strings
/// that tie under those rules fall back to plain byte order.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        match (left.peek().copied(), right.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) if x.is_ascii_digit() && y.is_ascii_digit() => {
                let lhs = take_digits(&mut left);
                let rhs = take_digits(&mut right);
                let ordering = compare_digit_runs(&lhs, &rhs);
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            (Some(x), Some(y)) => {
                let ordering = x.to_lowercase().cmp(y.to_lowercase());
                if ordering != Ordering::Equal {
                    return ordering;
                }
                left.next();
                right.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.peek().copied().filter(char::is_ascii_digit) {
        run.push(c);
        chars.next();
    }
    run
}

fn compare_digit_runs(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn sorted_naturally(rolls: BTreeSet<String>) -> Vec<String> {
    let mut rolls: Vec<String> = rolls.into_iter().collect();
    rolls.sort_by(|a, b| natural_cmp(a, b));
    rolls
}

/// Subject → distinct roll numbers carrying a backlog in it, naturally
/// sorted.
pub fn subject_failures<'a>(
    students: impl IntoIterator<Item = &'a StudentRecord>,
) -> BTreeMap<String, Vec<String>> {
    let mut failures: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for student in students {
        for subject in &student.backlog_subjects {
            failures
                .entry(subject.clone())
                .or_default()
                .insert(student.roll_number.clone());
        }
    }

    failures
        .into_iter()
        .map(|(subject, rolls)| (subject, sorted_naturally(rolls)))
        .collect()
}

/// Students with at least one backlog, grouped by how many they carry,
/// fewest backlogs first.
pub fn backlog_distribution<'a>(
    students: impl IntoIterator<Item = &'a StudentRecord>,
) -> Vec<BacklogGroup> {
    let mut groups: BTreeMap<usize, BTreeSet<String>> = BTreeMap::new();

    for student in students {
        let count = student.backlog_count();
        if count > 0 {
            groups
                .entry(count)
                .or_default()
                .insert(student.roll_number.clone());
        }
    }

    groups
        .into_iter()
        .map(|(backlog_count, rolls)| {
            let roll_numbers = sorted_naturally(rolls);
            BacklogGroup {
                backlog_count,
                student_count: roll_numbers.len(),
                roll_numbers,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SubjectStatus;

    fn student(roll: &str, backlogs: &[&str]) -> StudentRecord {
        StudentRecord {
            roll_number: roll.to_string(),
            student_name: String::new(),
            semester: "Semester 1".to_string(),
            department: None,
            subject_results: BTreeMap::new(),
            overall_status: if backlogs.is_empty() {
                SubjectStatus::Pass
            } else {
                SubjectStatus::Fail
            },
            backlog_subjects: backlogs.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn natural_order_compares_numbers_by_value() {
        let mut rolls = vec!["10", "2", "1", "21A05", "21a04", "21A10"];
        rolls.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(rolls, vec!["1", "2", "10", "21a04", "21A05", "21A10"]);
    }

    #[test]
    fn natural_order_is_total_for_case_variants() {
        assert_eq!(natural_cmp("ab1", "AB1"), "ab1".cmp("AB1"));
        assert_eq!(natural_cmp("007", "7"), "007".cmp("7"));
        assert_eq!(natural_cmp("x", "x"), Ordering::Equal);
        assert_eq!(natural_cmp("x", "x1"), Ordering::Less);
    }

    #[test]
    fn subject_failures_are_distinct_and_sorted() {
        let students = vec![
            student("10", &["Maths"]),
            student("2", &["Maths", "Physics"]),
            student("2", &["Maths"]),
            student("5", &[]),
        ];
        let failures = subject_failures(&students);

        assert_eq!(failures.len(), 2);
        assert_eq!(failures["Maths"], vec!["2", "10"]);
        assert_eq!(failures["Physics"], vec!["2"]);
    }

    #[test]
    fn distribution_groups_by_backlog_count() {
        let students = vec![
            student("3", &["A", "B"]),
            student("12", &["A"]),
            student("4", &["C"]),
            student("4", &["C"]),
            student("9", &[]),
            student("1", &["A", "B", "C"]),
        ];
        let groups = backlog_distribution(&students);

        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0].backlog_count, 1);
        assert_eq!(groups[0].roll_numbers, vec!["4", "12"]);
        assert_eq!(groups[0].student_count, 2);
        assert_eq!(groups[1].backlog_count, 2);
        assert_eq!(groups[1].roll_numbers, vec!["3"]);
        assert_eq!(groups[2].backlog_count, 3);
    }

    #[test]
    fn no_backlogs_means_no_groups() {
        let students = vec![student("1", &[]), student("2", &[])];
        assert!(backlog_distribution(&students).is_empty());
        assert!(subject_failures(&students).is_empty());
    }
}
