use std::path::PathBuf;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use result_analytics::analytics::{compare_semesters, compute_semester_analytics};
use result_analytics::backlog::{backlog_distribution, subject_failures};
use result_analytics::ingest::{ingest_file, ImportOutcome};
use result_analytics::logging::init_logging;
use result_analytics::lookup::lookup_by_roll_number;
use result_analytics::models::ParsedData;
use result_analytics::report::{
    build_document, format_percentage, render_markdown, render_student_sheet, subject_label,
};

#[derive(Parser)]
#[command(name = "result-analytics")]
#[command(about = "Semester pass/fail and backlog analytics for student result sheets", long_about = None)]
struct Cli {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Result sheet (.csv, .tsv, .xlsx, .xls, .ods)
    #[arg(long)]
    file: PathBuf,
    /// Restrict figures to one department
    #[arg(long)]
    department: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ReportFormat {
    Markdown,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Print pass/fail figures for every semester
    Summary {
        #[command(flatten)]
        source: Source,
    },
    /// Write the full report
    Report {
        #[command(flatten)]
        source: Source,
        #[arg(long, default_value = "report.md")]
        out: PathBuf,
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
    },
    /// Show every semester's results for one roll number
    Lookup {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        roll: String,
    },
    /// Group a semester's students by backlog count
    Backlogs {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        semester: String,
    },
    /// List failing roll numbers per subject for a semester
    Subjects {
        #[command(flatten)]
        source: Source,
        #[arg(long)]
        semester: String,
    },
    /// Compare pass and failure rates across consecutive semesters
    Compare {
        #[command(flatten)]
        source: Source,
    },
}

async fn load(source: &Source) -> anyhow::Result<(ImportOutcome, ParsedData)> {
    let outcome = ingest_file(&source.file)
        .await
        .with_context(|| format!("failed to import {}", source.file.display()))?;

    if let Some(department) = source.department.as_deref() {
        if !outcome.data.departments.iter().any(|d| d == department) {
            anyhow::bail!(
                "unknown department {department}; available: {}",
                outcome.data.departments.join(", ")
            );
        }
    }

    let data = outcome.data.filter_by_department(source.department.as_deref());
    Ok((outcome, data))
}

fn require_semester(data: &ParsedData, semester: &str) -> anyhow::Result<()> {
    if data.semesters.iter().any(|s| s == semester) {
        Ok(())
    } else {
        anyhow::bail!(
            "no students in {semester}; available: {}",
            data.semesters.join(", ")
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level)?;

    match cli.command {
        Commands::Summary { source } => {
            let (_, data) = load(&source).await?;
            let analytics = compute_semester_analytics(&data);

            println!("Semester results:");
            for summary in analytics.values() {
                println!(
                    "- {}: {} students, {} passed ({}), {} failed ({}), {} backlogs across {} students",
                    summary.semester,
                    summary.total_students,
                    summary.passed_count,
                    format_percentage(summary.pass_percentage),
                    summary.failed_count,
                    format_percentage(summary.failure_percentage),
                    summary.total_backlogs,
                    summary.students_with_backlogs
                );
            }
        }
        Commands::Report {
            source,
            out,
            format,
        } => {
            let (outcome, data) = load(&source).await?;
            let document = build_document(
                outcome.id,
                outcome.format,
                chrono::Utc::now(),
                source.department.as_deref(),
                &data,
            );
            let rendered = match format {
                ReportFormat::Markdown => render_markdown(&document),
                ReportFormat::Json => serde_json::to_string_pretty(&document)?,
            };
            std::fs::write(&out, rendered)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Report written to {}.", out.display());
        }
        Commands::Lookup { source, roll } => {
            let (_, data) = load(&source).await?;
            let matches = lookup_by_roll_number(&data.students, &roll);

            if matches.is_empty() {
                println!("No records found for roll number {}.", roll.trim());
                return Ok(());
            }

            for student in matches {
                println!("{}", render_student_sheet(student, &data.subject_catalog));
            }
        }
        Commands::Backlogs { source, semester } => {
            let (_, data) = load(&source).await?;
            require_semester(&data, &semester)?;
            let groups = backlog_distribution(data.students_in_semester(&semester));

            if groups.is_empty() {
                println!("No backlogs in {semester}.");
                return Ok(());
            }

            println!("Backlog distribution for {semester}:");
            for group in groups {
                println!(
                    "- {} backlog(s): {} students: {}",
                    group.backlog_count,
                    group.student_count,
                    group.roll_numbers.join(", ")
                );
            }
        }
        Commands::Subjects { source, semester } => {
            let (_, data) = load(&source).await?;
            require_semester(&data, &semester)?;
            let failures = subject_failures(data.students_in_semester(&semester));

            if failures.is_empty() {
                println!("No subject backlogs in {semester}.");
                return Ok(());
            }

            println!("Subject backlogs for {semester}:");
            for (subject, rolls) in failures {
                println!(
                    "- {} ({} students): {}",
                    subject_label(&subject, &data.subject_catalog),
                    rolls.len(),
                    rolls.join(", ")
                );
            }
        }
        Commands::Compare { source } => {
            let (_, data) = load(&source).await?;
            let changes = compare_semesters(&compute_semester_analytics(&data));

            if changes.is_empty() {
                println!("Multiple semesters required for comparison.");
                return Ok(());
            }

            for change in changes {
                println!(
                    "- {} -> {}: pass rate {:+.1} points, failure rate {:+.1} points",
                    change.from,
                    change.to,
                    change.pass_rate_change.value,
                    change.failure_rate_change.value
                );
            }
        }
    }

    Ok(())
}
