// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Operator and session mutations.
//!
//! Emails are normalized to lowercase before they are written, so the
//! unique index on `operators.email` is case-insensitive in effect.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use tracing::{debug, info};

use crate::backend::ReportDatabase;
use crate::data_models::OperatorProfile;
use crate::diesel_schema::{operators, sessions};
use crate::error::{PersistenceError, is_unique_violation};
use crate::queries::operators::{is_operator_referenced_mysql, is_operator_referenced_sqlite};

fn hash_password(password: &str) -> Result<String, PersistenceError> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST)
        .map_err(|e| PersistenceError::Other(format!("Failed to hash password: {e}")))
}

backend_fn! {
/// Creates a new operator.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `email` - The login email (will be normalized)
/// * `display_name` - The display name
/// * `password` - The plain-text password (will be hashed)
/// * `role` - `admin`, `supervisor` or `worker`
///
/// # Errors
///
/// Returns `DuplicateOperator` if the email is taken, or another error if
/// the operator cannot be created.
pub fn create_operator(
    conn: &mut _,
    email: &str,
    display_name: &str,
    password: &str,
    role: &str,
) -> Result<i64, PersistenceError> {
    let normalized_email: String = email.trim().to_lowercase();

    info!(email = %normalized_email, display_name, role, "Creating operator");

    let password_hash: String = hash_password(password)?;

    diesel::insert_into(operators::table)
        .values((
            operators::email.eq(&normalized_email),
            operators::display_name.eq(display_name),
            operators::password_hash.eq(&password_hash),
            operators::role.eq(role),
        ))
        .execute(conn)
        .map_err(|e| {
            if is_unique_violation(&e) {
                PersistenceError::DuplicateOperator(normalized_email.clone())
            } else {
                PersistenceError::from(e)
            }
        })?;

    let operator_id: i64 = conn.last_insert_id()?;

    info!(operator_id, "Operator created");
    Ok(operator_id)
}
}

backend_fn! {
/// Replaces an operator's editable profile fields.
///
/// # Errors
///
/// Returns `OperatorNotFound` if no row was updated.
pub fn update_operator_profile(
    conn: &mut _,
    operator_id: i64,
    profile: &OperatorProfile,
) -> Result<(), PersistenceError> {
    info!(operator_id, "Updating operator profile");

    let rows_affected: usize = diesel::update(operators::table)
        .filter(operators::operator_id.eq(operator_id))
        .set((
            operators::display_name.eq(&profile.display_name),
            operators::phone.eq(profile.phone.as_deref()),
            operators::department.eq(profile.department.as_deref()),
            operators::position.eq(profile.position.as_deref()),
        ))
        .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::OperatorNotFound(format!(
            "Operator with ID {operator_id} not found"
        )));
    }
    Ok(())
}
}

backend_fn! {
/// Stamps the operator's last login time.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_last_login(conn: &mut _, operator_id: i64) -> Result<(), PersistenceError> {
    debug!(operator_id, "Updating last_login_at");

    diesel::update(operators::table)
        .filter(operators::operator_id.eq(operator_id))
        .set(operators::last_login_at.eq(diesel::dsl::sql::<
            diesel::sql_types::Nullable<diesel::sql_types::Text>,
        >("CURRENT_TIMESTAMP")))
        .execute(conn)?;

    Ok(())
}
}

backend_fn! {
/// Disables an operator and records when.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn disable_operator(conn: &mut _, operator_id: i64) -> Result<(), PersistenceError> {
    info!(operator_id, "Disabling operator");

    diesel::update(operators::table)
        .filter(operators::operator_id.eq(operator_id))
        .set((
            operators::is_disabled.eq(1),
            operators::disabled_at.eq(diesel::dsl::sql::<
                diesel::sql_types::Nullable<diesel::sql_types::Text>,
            >("CURRENT_TIMESTAMP")),
        ))
        .execute(conn)?;

    Ok(())
}
}

backend_fn! {
/// Re-enables a disabled operator.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn enable_operator(conn: &mut _, operator_id: i64) -> Result<(), PersistenceError> {
    info!(operator_id, "Re-enabling operator");

    diesel::update(operators::table)
        .filter(operators::operator_id.eq(operator_id))
        .set((
            operators::is_disabled.eq(0),
            operators::disabled_at.eq(None::<String>),
        ))
        .execute(conn)?;

    Ok(())
}
}

/// Deletes an operator who never created a report (`SQLite` version).
///
/// # Errors
///
/// Returns an error if:
/// - The operator created work reports
/// - The operator does not exist
/// - The database operation fails
pub fn delete_operator_sqlite(
    conn: &mut SqliteConnection,
    operator_id: i64,
) -> Result<(), PersistenceError> {
    info!(operator_id, "Attempting to delete operator");

    if is_operator_referenced_sqlite(conn, operator_id)? {
        return Err(PersistenceError::OperatorReferenced { operator_id });
    }

    let rows_affected: usize = diesel::delete(operators::table)
        .filter(operators::operator_id.eq(operator_id))
        .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::OperatorNotFound(format!(
            "Operator with ID {operator_id} not found"
        )));
    }

    info!(operator_id, "Deleted operator");
    Ok(())
}

/// Deletes an operator who never created a report (`MySQL` version).
///
/// # Errors
///
/// Returns an error if:
/// - The operator created work reports
/// - The operator does not exist
/// - The database operation fails
pub fn delete_operator_mysql(
    conn: &mut MysqlConnection,
    operator_id: i64,
) -> Result<(), PersistenceError> {
    info!(operator_id, "Attempting to delete operator");

    if is_operator_referenced_mysql(conn, operator_id)? {
        return Err(PersistenceError::OperatorReferenced { operator_id });
    }

    let rows_affected: usize = diesel::delete(operators::table)
        .filter(operators::operator_id.eq(operator_id))
        .execute(conn)?;

    if rows_affected == 0 {
        return Err(PersistenceError::OperatorNotFound(format!(
            "Operator with ID {operator_id} not found"
        )));
    }

    info!(operator_id, "Deleted operator");
    Ok(())
}

backend_fn! {
/// Creates a new session for an operator.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `session_token` - The unique session token
/// * `operator_id` - The operator ID
/// * `expires_at` - The expiration timestamp (RFC 3339)
///
/// # Errors
///
/// Returns an error if the session cannot be created.
pub fn create_session(
    conn: &mut _,
    session_token: &str,
    operator_id: i64,
    expires_at: &str,
) -> Result<i64, PersistenceError> {
    diesel::insert_into(sessions::table)
        .values((
            sessions::session_token.eq(session_token),
            sessions::operator_id.eq(operator_id),
            sessions::expires_at.eq(expires_at),
        ))
        .execute(conn)?;

    let session_id: i64 = conn.last_insert_id()?;

    debug!(session_id, operator_id, expires_at, "Session created");
    Ok(session_id)
}
}

backend_fn! {
/// Updates the last activity timestamp for a session.
///
/// # Errors
///
/// Returns an error if the database update fails.
pub fn update_session_activity(conn: &mut _, session_id: i64) -> Result<(), PersistenceError> {
    diesel::update(sessions::table)
        .filter(sessions::session_id.eq(session_id))
        .set(
            sessions::last_activity_at.eq(diesel::dsl::sql::<diesel::sql_types::Text>(
                "CURRENT_TIMESTAMP",
            )),
        )
        .execute(conn)?;

    Ok(())
}
}

backend_fn! {
/// Deletes a session by token. Used for logout.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_session(conn: &mut _, session_token: &str) -> Result<(), PersistenceError> {
    debug!("Deleting session by token");

    diesel::delete(sessions::table)
        .filter(sessions::session_token.eq(session_token))
        .execute(conn)?;

    Ok(())
}
}

backend_fn! {
/// Deletes every session that expired before `now`.
///
/// # Arguments
///
/// * `conn` - The database connection
/// * `now` - The current instant, RFC 3339 in UTC like `expires_at`
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_expired_sessions(conn: &mut _, now: &str) -> Result<usize, PersistenceError> {
    let rows_affected: usize = diesel::delete(sessions::table)
        .filter(sessions::expires_at.lt(now))
        .execute(conn)?;

    info!(rows_affected, "Deleted expired sessions");
    Ok(rows_affected)
}
}

backend_fn! {
/// Replaces an operator's password.
///
/// # Errors
///
/// Returns an error if the password cannot be hashed or the update fails.
pub fn update_password(
    conn: &mut _,
    operator_id: i64,
    new_password: &str,
) -> Result<(), PersistenceError> {
    info!(operator_id, "Updating operator password");

    let password_hash: String = hash_password(new_password)?;

    diesel::update(operators::table)
        .filter(operators::operator_id.eq(operator_id))
        .set(operators::password_hash.eq(&password_hash))
        .execute(conn)?;

    Ok(())
}
}

backend_fn! {
/// Deletes all sessions of an operator, e.g. after a password change.
///
/// # Errors
///
/// Returns an error if the database delete fails.
pub fn delete_sessions_for_operator(
    conn: &mut _,
    operator_id: i64,
) -> Result<usize, PersistenceError> {
    let rows_affected: usize = diesel::delete(sessions::table)
        .filter(sessions::operator_id.eq(operator_id))
        .execute(conn)?;

    info!(operator_id, rows_affected, "Deleted operator sessions");
    Ok(rows_affected)
}
}
