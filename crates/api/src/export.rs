// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Report export to CSV and JSON.

use crate::request_response::ReportResponse;
use pep_report_domain::{WorkReport, format_date};
use thiserror::Error;
use time::Date;

/// Column headers of the CSV export, in order.
pub const EXPORT_HEADERS: [&str; 8] = [
    "Code",
    "Title",
    "Category",
    "Status",
    "Progress",
    "Location",
    "Start Date",
    "End Date",
];

/// Export failures.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The CSV writer failed.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    /// JSON serialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    /// A value could not be rendered.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

/// Export formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// File extension without the dot.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Json => "json",
        }
    }

    /// MIME type of the rendered file.
    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Json => "application/json",
        }
    }
}

/// A rendered export ready to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFile {
    /// Suggested download name, e.g. `work-reports-2025-03-14.csv`.
    pub filename: String,
    /// MIME type.
    pub content_type: &'static str,
    /// File content.
    pub body: String,
}

/// Builds the download name for an export taken on `date`.
///
/// # Errors
///
/// Returns an error if the date cannot be formatted.
pub fn export_filename(date: Date, format: ExportFormat) -> Result<String, ExportError> {
    let day: String = format_date(date).map_err(|e| ExportError::Encoding(e.to_string()))?;
    Ok(format!("work-reports-{day}.{}", format.extension()))
}

/// Renders reports as CSV with a header row.
///
/// Progress is rendered as a percentage, e.g. `75%`.
///
/// # Errors
///
/// Returns an error if a record cannot be written.
pub fn reports_to_csv(reports: &[&WorkReport]) -> Result<String, ExportError> {
    let mut writer: csv::Writer<Vec<u8>> = csv::Writer::from_writer(Vec::new());
    writer.write_record(EXPORT_HEADERS)?;

    for report in reports {
        let details = report.details();
        let start_date: String =
            format_date(details.start_date).map_err(|e| ExportError::Encoding(e.to_string()))?;
        let end_date: String =
            format_date(details.end_date).map_err(|e| ExportError::Encoding(e.to_string()))?;
        writer.write_record([
            report.code().to_string().as_str(),
            details.title.as_str(),
            details.category.label(),
            details.status.label(),
            format!("{}%", details.progress).as_str(),
            details.location.name.as_str(),
            start_date.as_str(),
            end_date.as_str(),
        ])?;
    }

    let bytes: Vec<u8> = writer
        .into_inner()
        .map_err(|e| ExportError::Encoding(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ExportError::Encoding(e.to_string()))
}

/// Renders reports as a pretty-printed JSON array.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn reports_to_json(reports: &[ReportResponse]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(reports)?)
}
