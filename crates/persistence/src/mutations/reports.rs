// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Work report mutations.
//!
//! The unique index on `(code_year, code_sequence)` is the final arbiter
//! of code uniqueness. A write rejected by it surfaces as
//! `PersistenceError::DuplicateReportCode`; callers decide whether to retry.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use pep_report_domain::{NewReport, ReportCode, ReportDetails};
use tracing::{debug, info, warn};

use crate::backend::ReportDatabase;
use crate::data_models::{EncodedReport, NewWorkReportRow, WorkReportChanges, now_timestamp};
use crate::diesel_schema::work_reports;
use crate::error::{PersistenceError, is_unique_violation};

fn code_conflict(code: ReportCode) -> impl FnOnce(diesel::result::Error) -> PersistenceError {
    move |e| {
        if is_unique_violation(&e) {
            warn!(code = %code, "Unique index rejected report code");
            PersistenceError::DuplicateReportCode {
                year: code.year().value(),
                sequence: code.sequence().value(),
            }
        } else {
            PersistenceError::from(e)
        }
    }
}

backend_fn! {
/// Inserts a report under `code`.
///
/// A completed report is stored with full progress.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `code` - The allocated code
/// * `report` - Content and creator
///
/// # Returns
///
/// The new report's ID.
///
/// # Errors
///
/// Returns `DuplicateReportCode` if the code is already stored, or another
/// error if the insert fails.
pub fn insert_work_report(
    conn: &mut _,
    code: ReportCode,
    report: &NewReport,
) -> Result<i64, PersistenceError> {
    let details: ReportDetails = report.details.clone().normalized();
    let encoded: EncodedReport = EncodedReport::new(code, &details)?;
    let now: String = now_timestamp()?;

    debug!(code = %code, created_by = report.created_by, "Inserting work report");

    diesel::insert_into(work_reports::table)
        .values(&NewWorkReportRow {
            code_year: encoded.code_year,
            code_sequence: encoded.code_sequence,
            title: &details.title,
            description: &details.description,
            category: details.category.as_str(),
            start_date: &encoded.start_date,
            end_date: &encoded.end_date,
            status: details.status.as_str(),
            progress: encoded.progress,
            worker_count: encoded.worker_count,
            responsible_persons: &encoded.responsible_persons,
            location_name: &details.location.name,
            latitude: details.location.latitude,
            longitude: details.location.longitude,
            risk_level: details.hsse.risk_level.as_str(),
            weather_condition: details.hsse.weather_condition.as_str(),
            safety_incidents: encoded.safety_incidents,
            photos: &encoded.photos,
            created_by: report.created_by,
            created_at: &now,
            updated_at: &now,
        })
        .execute(conn)
        .map_err(code_conflict(code))?;

    let report_id: i64 = conn.last_insert_id()?;

    info!(report_id, code = %code, "Inserted work report");
    Ok(report_id)
}
}

backend_fn! {
/// Overwrites a report's code and content.
///
/// # Errors
///
/// Returns `ReportNotFound` if the report does not exist,
/// `DuplicateReportCode` if another report holds `code`, or another error
/// if the update fails.
pub fn update_work_report(
    conn: &mut _,
    report_id: i64,
    code: ReportCode,
    details: &ReportDetails,
) -> Result<(), PersistenceError> {
    let encoded: EncodedReport = EncodedReport::new(code, details)?;
    let now: String = now_timestamp()?;

    let rows_affected: usize = diesel::update(work_reports::table)
        .filter(work_reports::report_id.eq(report_id))
        .set(&WorkReportChanges {
            code_year: encoded.code_year,
            code_sequence: encoded.code_sequence,
            title: &details.title,
            description: &details.description,
            category: details.category.as_str(),
            start_date: &encoded.start_date,
            end_date: &encoded.end_date,
            status: details.status.as_str(),
            progress: encoded.progress,
            worker_count: encoded.worker_count,
            responsible_persons: &encoded.responsible_persons,
            location_name: &details.location.name,
            latitude: details.location.latitude,
            longitude: details.location.longitude,
            risk_level: details.hsse.risk_level.as_str(),
            weather_condition: details.hsse.weather_condition.as_str(),
            safety_incidents: encoded.safety_incidents,
            photos: &encoded.photos,
            updated_at: &now,
        })
        .execute(conn)
        .map_err(code_conflict(code))?;

    if rows_affected == 0 {
        return Err(PersistenceError::ReportNotFound(report_id));
    }

    info!(report_id, code = %code, "Updated work report");
    Ok(())
}
}

backend_fn! {
/// Deletes a report. Its notifications keep their text but lose the link.
///
/// # Errors
///
/// Returns `ReportNotFound` if the report does not exist.
pub fn delete_work_report(conn: &mut _, report_id: i64) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::delete(work_reports::table)
        .filter(work_reports::report_id.eq(report_id))
        .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::ReportNotFound(report_id));
    }

    info!(report_id, "Deleted work report");
    Ok(())
}
}
