use crate::columns::{GRADE_LETTER, HALL_TICKET, SUBJECT_CODE, SUBJECT_NAME};
use crate::models::FormatKind;

/// Classifies a sheet by its header row.
///
/// A sheet is long-format when it carries a hall ticket column, a subject
/// code or subject name column, and a header mentioning a grade or letter.
/// Anything else, including an empty header row, is treated as wide-format.
pub fn detect_format(headers: &[String]) -> FormatKind {
    let has_hall_ticket = headers.iter().any(|h| HALL_TICKET.matches(h));
    let has_subject = headers
        .iter()
        .any(|h| SUBJECT_CODE.matches(h) || SUBJECT_NAME.matches(h));
    let has_grade_letter = headers.iter().any(|h| GRADE_LETTER.matches(h));

    if has_hall_ticket && has_subject && has_grade_letter {
        FormatKind::Long
    } else {
        FormatKind::Wide
    }
}
