// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! System settings mutation.

use diesel::prelude::*;
use diesel::{MysqlConnection, SqliteConnection};
use pep_report_domain::Settings;
use tracing::info;

use crate::data_models::now_timestamp;
use crate::diesel_schema::system_settings;
use crate::error::PersistenceError;
use crate::queries::settings::SETTINGS_ROW_ID;

backend_fn! {
/// Stores the settings document, replacing any previous one.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save_settings(
    conn: &mut _,
    settings: &Settings,
    updated_by: i64,
) -> Result<(), PersistenceError> {
    let document: String = serde_json::to_string(settings)?;
    let now: String = now_timestamp()?;

    conn.transaction::<(), PersistenceError, _>(|conn| {
        let rows_affected: usize = diesel::update(system_settings::table)
            .filter(system_settings::settings_id.eq(SETTINGS_ROW_ID))
            .set((
                system_settings::document.eq(&document),
                system_settings::updated_by.eq(Some(updated_by)),
                system_settings::updated_at.eq(&now),
            ))
            .execute(conn)?;

        if rows_affected == 0 {
            diesel::insert_into(system_settings::table)
                .values((
                    system_settings::settings_id.eq(SETTINGS_ROW_ID),
                    system_settings::document.eq(&document),
                    system_settings::updated_by.eq(Some(updated_by)),
                    system_settings::updated_at.eq(&now),
                ))
                .execute(conn)?;
        }
        Ok(())
    })?;

    info!(updated_by, "Saved system settings");
    Ok(())
}
}
