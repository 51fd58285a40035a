//! Student result analytics: imports a results spreadsheet in either the
//! wide (one column per subject) or long (one row per subject) layout and
//! derives per-semester pass/fail figures, backlog groupings and
//! roll-number lookups.

pub mod analytics;
pub mod backlog;
pub mod columns;
pub mod detect;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod lookup;
pub mod models;
pub mod normalize;
pub mod report;
pub mod sheet;

pub use error::{IngestError, RowIssue};
pub use ingest::{ingest_bytes, ingest_file, ImportOutcome};
pub use models::{
    BacklogGroup, FormatKind, ParsedData, SemesterAnalytics, StudentRecord, SubjectResult,
    SubjectStatus,
};
