//! Console formatting of results.
//!
//! Every function returns the lines to print; nothing here performs I/O.

use crate::download::{DownloadReport, FileStatus};
use crate::locator::ResourceRef;
use crate::models::{format_size, ExternalStorageRef, FileDescriptor, ReportRecord, SessionsSummary};
use crate::reports::DeleteOutcome;

/// Separator printed between a heading and its block.
pub const SEPARATOR: &str = "--------------------------------------------------";

fn or_dash(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("-")
}

/// A count line followed by one line per report.
pub fn report_list(reports: &[ReportRecord]) -> Vec<String> {
    let mut lines = vec![format!("Total Unsampled Reports: {}", reports.len())];
    if reports.is_empty() {
        lines.push("No reports found".to_string());
    } else {
        lines.extend(reports.iter().map(ToString::to_string));
    }
    lines
}

/// Detail block of one report.
pub fn report_detail(report: &ReportRecord) -> Vec<String> {
    let mut lines = vec![
        format!(">> Report Id             => {}", report.id),
        format!(">> Report Title          => {}", or_dash(&report.title)),
        format!(">> Report Status         => {}", or_dash(&report.status)),
        format!(">> Report Download Type  => {}", or_dash(&report.download_type)),
    ];

    match report.external_storage() {
        Some(ExternalStorageRef::Drive { document_id }) => {
            lines.push(format!(">> Drive Document Id     => {}", document_id));
        }
        Some(ExternalStorageRef::CloudStorage {
            bucket_id,
            object_id,
        }) => {
            lines.push(format!(
                ">> Cloud Storage Object  => gs://{}/{}",
                bucket_id, object_id
            ));
        }
        None => {}
    }

    lines
}

pub fn report_missing() -> Vec<String> {
    vec!["No reports found".to_string()]
}

pub fn delete_outcome(outcome: DeleteOutcome) -> Vec<String> {
    match outcome {
        DeleteOutcome::Deleted => vec!["Unsampled Report has been deleted.".to_string()],
        DeleteOutcome::Declined => vec!["Unsampled Report was not deleted.".to_string()],
    }
}

pub fn resource(target: &ResourceRef) -> Vec<String> {
    vec![
        format!("Account Id      => {}", target.account_id()),
        format!("Property Id     => {}", target.web_property_id()),
        format!("View Id         => {}", target.profile_id()),
    ]
}

pub fn sessions(summary: &SessionsSummary) -> Vec<String> {
    match summary.rows.first().and_then(|row| row.first()) {
        Some(total) => vec![
            format!("View (Profile): {}", summary.profile_name),
            format!("Total Sessions: {}", total),
        ],
        None => vec![
            format!("View (Profile): {}", summary.profile_name),
            "No results found".to_string(),
        ],
    }
}

pub fn file_list(files: &[FileDescriptor]) -> Vec<String> {
    if files.is_empty() {
        return vec!["No files found.".to_string()];
    }

    let mut lines = vec![
        format!("{:<44} {:>10} {:<40} {}", "ID", "SIZE", "TYPE", "NAME"),
        "-".repeat(110),
    ];
    lines.extend(files.iter().map(ToString::to_string));
    lines
}

/// One line per file and a totals line.
pub fn download_summary(report: &DownloadReport) -> Vec<String> {
    let mut lines: Vec<String> = report
        .outcomes
        .iter()
        .map(|outcome| match &outcome.status {
            FileStatus::Downloaded { path, bytes } => format!(
                "OK      {} ({}) -> {}",
                outcome.file.name,
                format_size(*bytes),
                path.display()
            ),
            FileStatus::Skipped => format!("SKIPPED {} ({})", outcome.file.name, outcome.file.mime_type),
            FileStatus::Failed(e) => format!("FAILED  {}: {}", outcome.file.name, e),
        })
        .collect();

    lines.push(format!(
        "Downloaded: {}, skipped: {}, failed: {}",
        report.downloaded().count(),
        report.skipped().count(),
        report.failed().count()
    ));
    lines
}
