// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Work report queries.
//!
//! Listings are newest first. Reports are returned joined with their
//! creator's display name and email.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use pep_report_domain::CodeYear;
use tracing::debug;

use crate::data_models::{ReportRecord, WorkReportRow};
use crate::diesel_schema::{operators, work_reports};
use crate::error::PersistenceError;

type ReportJoinRow = (WorkReportRow, String, String);

fn into_record(
    (row, creator_name, creator_email): ReportJoinRow,
) -> Result<ReportRecord, PersistenceError> {
    Ok(ReportRecord {
        report: row.into_report()?,
        creator_name,
        creator_email,
    })
}

backend_fn! {
/// Retrieves one report.
///
/// # Errors
///
/// Returns an error if the query fails or the stored row is invalid.
/// Returns `Ok(None)` if the report does not exist.
pub fn get_work_report(
    conn: &mut _,
    report_id: i64,
) -> Result<Option<ReportRecord>, PersistenceError> {
    debug!(report_id, "Looking up work report");

    let result: Result<ReportJoinRow, diesel::result::Error> = work_reports::table
        .inner_join(operators::table)
        .filter(work_reports::report_id.eq(report_id))
        .select((
            WorkReportRow::as_select(),
            operators::display_name,
            operators::email,
        ))
        .first(conn);

    match result {
        Ok(row) => into_record(row).map(Some),
        Err(diesel::result::Error::NotFound) => Ok(None),
        Err(e) => Err(PersistenceError::from(e)),
    }
}
}

backend_fn! {
/// Lists reports newest first, optionally for one code year only.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `year` - Restrict to this code year, or `None` for every year
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is invalid.
pub fn list_work_reports(
    conn: &mut _,
    year: Option<CodeYear>,
) -> Result<Vec<ReportRecord>, PersistenceError> {
    debug!(year = ?year, "Listing work reports");

    let mut query = work_reports::table
        .inner_join(operators::table)
        .select((
            WorkReportRow::as_select(),
            operators::display_name,
            operators::email,
        ))
        .order_by(work_reports::report_id.desc())
        .into_boxed();

    if let Some(year) = year {
        query = query.filter(work_reports::code_year.eq(i32::from(year.value())));
    }

    let rows: Vec<ReportJoinRow> = query.load(conn)?;
    rows.into_iter().map(into_record).collect()
}
}
