// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::path::{Path, PathBuf};

use diesel::QueryableByName;
use diesel::RunQueryDsl;
use diesel::sql_types::Text;

use super::{code, create_test_new_report, create_test_operator, create_test_persistence};
use crate::{BackendConnection, Persistence};

#[derive(QueryableByName)]
struct JournalMode {
    #[diesel(sql_type = Text)]
    journal_mode: String,
}

fn remove_database_files(path: &Path) {
    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{suffix}", path.display()));
    }
}

#[test]
fn test_persistence_initialization() {
    let result = Persistence::new_in_memory();
    assert!(result.is_ok());
}

#[test]
fn test_foreign_key_enforcement_is_enabled() {
    let mut persistence = create_test_persistence();
    assert!(persistence.verify_foreign_key_enforcement().is_ok());
}

#[test]
fn test_multiple_in_memory_instances_are_isolated() {
    let mut first = create_test_persistence();
    let mut second = create_test_persistence();

    let operator_id = create_test_operator(&mut first, "admin@pep.example", "admin");
    first
        .create_work_report(code(1, 2025), &create_test_new_report("Flange", operator_id))
        .unwrap();

    assert_eq!(first.count_operators().unwrap(), 1);
    assert_eq!(second.count_operators().unwrap(), 0);
    assert!(second.list_work_reports(None).unwrap().is_empty());
}

#[test]
fn test_report_requires_existing_creator() {
    let mut persistence = create_test_persistence();

    let result =
        persistence.create_work_report(code(1, 2025), &create_test_new_report("Orphan", 42));

    assert!(result.is_err());
    assert!(persistence.list_work_reports(None).unwrap().is_empty());
}

#[test]
fn test_file_database_uses_wal_and_survives_reopen() {
    let path: PathBuf =
        std::env::temp_dir().join(format!("pep-report-init-{}.db", std::process::id()));
    remove_database_files(&path);

    {
        let mut persistence = Persistence::new_with_file(&path).unwrap();
        assert!(persistence.verify_foreign_key_enforcement().is_ok());
        create_test_operator(&mut persistence, "admin@pep.example", "admin");

        let BackendConnection::Sqlite(conn) = &mut persistence.conn else {
            panic!("Expected a SQLite connection");
        };
        let mode: JournalMode = diesel::sql_query("PRAGMA journal_mode")
            .get_result(conn)
            .unwrap();
        assert_eq!(mode.journal_mode.to_lowercase(), "wal");
    }

    let mut reopened = Persistence::new_with_file(&path).unwrap();
    assert!(reopened.verify_foreign_key_enforcement().is_ok());
    assert_eq!(reopened.count_operators().unwrap(), 1);
    drop(reopened);

    remove_database_files(&path);
}
