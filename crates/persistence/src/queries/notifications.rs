// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Notification queries.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use pep_report_domain::NotificationKind;
use std::str::FromStr;
use tracing::debug;

use crate::data_models::NotificationData;
use crate::diesel_schema::{notifications, operators};
use crate::error::PersistenceError;

/// Roles that receive report notifications.
pub const NOTIFIED_ROLES: [&str; 2] = ["admin", "supervisor"];

#[derive(Queryable, Selectable)]
#[diesel(table_name = notifications)]
struct NotificationRow {
    notification_id: i64,
    operator_id: i64,
    report_id: Option<i64>,
    title: String,
    message: String,
    kind: String,
    is_read: i32,
    created_at: String,
}

impl NotificationRow {
    fn into_data(self) -> Result<NotificationData, PersistenceError> {
        let kind: NotificationKind = NotificationKind::from_str(&self.kind)
            .map_err(|e| PersistenceError::InvalidRow(format!("kind: {e}")))?;
        Ok(NotificationData {
            notification_id: self.notification_id,
            operator_id: self.operator_id,
            report_id: self.report_id,
            title: self.title,
            message: self.message,
            kind,
            is_read: self.is_read != 0,
            created_at: self.created_at,
        })
    }
}

backend_fn! {
/// Lists an operator's most recent notifications, newest first.
///
/// # Errors
///
/// Returns an error if the query fails or a stored row is invalid.
pub fn list_notifications(
    conn: &mut _,
    operator_id: i64,
    limit: i64,
) -> Result<Vec<NotificationData>, PersistenceError> {
    debug!(operator_id, limit, "Listing notifications");

    let rows: Vec<NotificationRow> = notifications::table
        .filter(notifications::operator_id.eq(operator_id))
        .select(NotificationRow::as_select())
        .order_by(notifications::notification_id.desc())
        .limit(limit)
        .load(conn)?;

    rows.into_iter().map(NotificationRow::into_data).collect()
}
}

backend_fn! {
/// Counts an operator's unread notifications.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn count_unread_notifications(conn: &mut _, operator_id: i64) -> Result<i64, PersistenceError> {
    use diesel::dsl::count;

    let count: i64 = notifications::table
        .filter(notifications::operator_id.eq(operator_id))
        .filter(notifications::is_read.eq(0))
        .select(count(notifications::notification_id))
        .first(conn)?;

    Ok(count)
}
}

backend_fn! {
/// Lists the operators who should hear about a report change.
///
/// That is every enabled admin and supervisor except `actor_id`.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_notification_audience(
    conn: &mut _,
    actor_id: i64,
) -> Result<Vec<i64>, PersistenceError> {
    let audience: Vec<i64> = operators::table
        .filter(operators::role.eq_any(NOTIFIED_ROLES.to_vec()))
        .filter(operators::is_disabled.eq(0))
        .filter(operators::operator_id.ne(actor_id))
        .select(operators::operator_id)
        .order_by(operators::operator_id.asc())
        .load(conn)?;

    debug!(actor_id, recipients = audience.len(), "Resolved notification audience");
    Ok(audience)
}
}
