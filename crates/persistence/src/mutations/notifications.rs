// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Notification mutations.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tracing::{debug, info};

use crate::data_models::{NewNotification, now_timestamp};
use crate::diesel_schema::notifications;
use crate::error::PersistenceError;

backend_fn! {
/// Delivers one notification to each of `recipients`.
///
/// # Returns
///
/// The number of rows written.
///
/// # Errors
///
/// Returns an error if the insert fails.
pub fn insert_notifications(
    conn: &mut _,
    recipients: &[i64],
    notification: &NewNotification,
) -> Result<usize, PersistenceError> {
    if recipients.is_empty() {
        debug!(title = %notification.title, "No recipients for notification");
        return Ok(0);
    }

    let now: String = now_timestamp()?;
    let rows: Vec<_> = recipients
        .iter()
        .map(|operator_id| {
            (
                notifications::operator_id.eq(*operator_id),
                notifications::report_id.eq(notification.report_id),
                notifications::title.eq(&notification.title),
                notifications::message.eq(&notification.message),
                notifications::kind.eq(notification.kind.as_str()),
                notifications::created_at.eq(&now),
            )
        })
        .collect();

    let written: usize = diesel::insert_into(notifications::table)
        .values(&rows)
        .execute(conn)?;

    info!(
        title = %notification.title,
        kind = %notification.kind,
        written,
        "Delivered notifications"
    );
    Ok(written)
}
}

backend_fn! {
/// Marks one of an operator's notifications read.
///
/// # Errors
///
/// Returns `NotificationNotFound` if the operator has no such notification.
pub fn mark_notification_read(
    conn: &mut _,
    operator_id: i64,
    notification_id: i64,
) -> Result<(), PersistenceError> {
    let rows_affected: usize = diesel::update(notifications::table)
        .filter(notifications::notification_id.eq(notification_id))
        .filter(notifications::operator_id.eq(operator_id))
        .set(notifications::is_read.eq(1))
        .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::NotificationNotFound(notification_id));
    }
    Ok(())
}
}

backend_fn! {
/// Marks all of an operator's notifications read.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn mark_all_notifications_read(
    conn: &mut _,
    operator_id: i64,
) -> Result<usize, PersistenceError> {
    let rows_affected: usize = diesel::update(notifications::table)
        .filter(notifications::operator_id.eq(operator_id))
        .filter(notifications::is_read.eq(0))
        .set(notifications::is_read.eq(1))
        .execute(conn)?;

    debug!(operator_id, rows_affected, "Marked notifications read");
    Ok(rows_affected)
}
}
