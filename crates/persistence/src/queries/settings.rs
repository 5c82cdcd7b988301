// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! System settings query.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use pep_report_domain::Settings;
use tracing::debug;

use crate::diesel_schema::system_settings;
use crate::error::PersistenceError;

/// The single settings row.
pub const SETTINGS_ROW_ID: i64 = 1;

backend_fn! {
/// Loads the settings document, or the defaults if none was saved.
///
/// # Errors
///
/// Returns an error if the query fails or the stored document is not
/// valid settings JSON.
pub fn get_settings(conn: &mut _) -> Result<Settings, PersistenceError> {
    let document: Option<String> = system_settings::table
        .filter(system_settings::settings_id.eq(SETTINGS_ROW_ID))
        .select(system_settings::document)
        .first(conn)
        .optional()?;

    match document {
        Some(json) => Ok(serde_json::from_str(&json)?),
        None => {
            debug!("No settings saved, using defaults");
            Ok(Settings::default())
        }
    }
}
}
