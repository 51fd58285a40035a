use crate::models::StudentRecord;

fn normalize_roll(roll: &str) -> String {
    roll.trim().to_lowercase()
}

/// Every record whose roll number equals `query`, ignoring case and
/// surrounding whitespace. A roll number can match once per semester.
pub fn lookup_by_roll_number<'a>(
    students: impl IntoIterator<Item = &'a StudentRecord>,
    query: &str,
) -> Vec<&'a StudentRecord> {
    let needle = normalize_roll(query);
    if needle.is_empty() {
        return Vec::new();
    }

    students
        .into_iter()
        .filter(|student| normalize_roll(&student.roll_number) == needle)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::models::SubjectStatus;

    fn student(roll: &str, semester: &str) -> StudentRecord {
        StudentRecord {
            roll_number: roll.to_string(),
            student_name: String::new(),
            semester: semester.to_string(),
            department: None,
            subject_results: BTreeMap::new(),
            overall_status: SubjectStatus::Pass,
            backlog_subjects: Vec::new(),
        }
    }

    #[test]
    fn matches_ignore_case_and_whitespace() {
        let students = vec![student("AB123", "Semester 1"), student("AB124", "Semester 1")];
        let found = lookup_by_roll_number(&students, " ab123 ");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].roll_number, "AB123");
    }

    #[test]
    fn returns_every_semester_for_a_roll() {
        let students = vec![
            student("7", "Semester 1"),
            student("7", "Semester 2"),
            student("70", "Semester 1"),
        ];
        let found = lookup_by_roll_number(&students, "7");
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|s| s.roll_number == "7"));
    }

    #[test]
    fn blank_queries_find_nothing() {
        let students = vec![student("AB123", "Semester 1")];
        assert!(lookup_by_roll_number(&students, "").is_empty());
        assert!(lookup_by_roll_number(&students, "   ").is_empty());
    }

    #[test]
    fn partial_matches_are_not_returned() {
        let students = vec![student("AB123", "Semester 1")];
        assert!(lookup_by_roll_number(&students, "AB12").is_empty());
    }
}
