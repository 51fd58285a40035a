use thiserror::Error;

pub type Result<T> = std::result::Result<T, IngestError>;

/// Column roles a sheet can be missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnCategory {
    RollNumber,
    HallTicket,
    GradeLetter,
    Subject,
}

impl ColumnCategory {
    fn hint(self) -> &'static str {
        match self {
            ColumnCategory::RollNumber => {
                "Please ensure the sheet has a column with \"Roll\", \"ID\", \"Student ID\", or \"HTNO\" in the header."
            }
            ColumnCategory::HallTicket => {
                "Please ensure the sheet has a column with \"HTNO\" or \"Hall Ticket\" in the header."
            }
            ColumnCategory::GradeLetter => {
                "Please ensure the sheet has a column with \"Grade\" or \"Grade Letter\" in the header."
            }
            ColumnCategory::Subject => {
                "Every column was recognised as student metadata; add one column per subject."
            }
        }
    }
}

impl std::fmt::Display for ColumnCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnCategory::RollNumber => write!(f, "Roll Number, Student ID, or HTNO"),
            ColumnCategory::HallTicket => write!(f, "HTNO (Hall Ticket Number)"),
            ColumnCategory::GradeLetter => write!(f, "GRADE_LETTER"),
            ColumnCategory::Subject => write!(f, "subject"),
        }
    }
}

/// Dataset-level failures. Any of these aborts the whole import.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Spreadsheet support for {0} files is not available in this build. Please retry with a CSV export.")]
    LibraryUnavailable(String),

    #[error("The workbook contains no sheets")]
    EmptyWorkbook,

    #[error("The sheet is empty or has no data rows")]
    EmptyData,

    #[error("Could not find {category} column. {}", .category.hint())]
    MissingColumn { category: ColumnCategory },

    #[error("No valid student records found in the file. Please check the file format.")]
    NoValidRecords,

    #[error("Failed to read file: {0}")]
    Unreadable(String),

    #[error("Import did not complete: {0}")]
    Interrupted(String),
}

impl IngestError {
    pub fn missing(category: ColumnCategory) -> Self {
        IngestError::MissingColumn { category }
    }
}

impl From<std::io::Error> for IngestError {
    fn from(err: std::io::Error) -> Self {
        IngestError::Unreadable(err.to_string())
    }
}

/// A row that was excluded from an otherwise successful import.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct RowIssue {
    /// Sheet row number, counting the header row as 1.
    pub row: usize,
    pub reason: String,
}

impl std::fmt::Display for RowIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}: {}", self.row, self.reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_column_message_names_the_category() {
        let message = IngestError::missing(ColumnCategory::GradeLetter).to_string();
        assert!(message.starts_with("Could not find GRADE_LETTER column."));
        assert!(message.contains("Grade Letter"));

        let message = IngestError::missing(ColumnCategory::RollNumber).to_string();
        assert!(message.contains("Roll Number, Student ID, or HTNO"));
    }
}
