// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod initialization_tests;
mod report_tests;
mod settings_tests;

use crate::Persistence;
use pep_report_domain::{
    CodeYear, HsseData, Location, NewReport, ReportCategory, ReportCode, ReportDetails,
    ReportStatus, Sequence,
};
use time::{Date, Month};

pub fn code(sequence: u16, year: u16) -> ReportCode {
    ReportCode::new(
        Sequence::new(sequence).expect("valid sequence"),
        CodeYear::new(year).expect("valid year"),
    )
}

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().expect("in-memory database")
}

/// Creates an operator with the given role and returns its ID.
pub fn create_test_operator(persistence: &mut Persistence, email: &str, role: &str) -> i64 {
    persistence
        .create_operator(email, "Test Operator", "password123", role)
        .expect("operator created")
}

pub fn create_test_details(title: &str) -> ReportDetails {
    ReportDetails {
        title: title.to_string(),
        description: String::from("Replace corroded flange on the export line"),
        category: ReportCategory::Maintenance,
        start_date: Date::from_calendar_date(2025, Month::March, 3).unwrap(),
        end_date: Date::from_calendar_date(2025, Month::March, 14).unwrap(),
        status: ReportStatus::Planning,
        progress: 0,
        worker_count: 4,
        responsible_persons: vec![String::from("Budi Santoso")],
        location: Location {
            name: String::from("Station Prabumulih"),
            latitude: Some(-3.4322),
            longitude: Some(104.2353),
        },
        hsse: HsseData::default(),
        photos: Vec::new(),
    }
}

pub fn create_test_new_report(title: &str, created_by: i64) -> NewReport {
    NewReport {
        details: create_test_details(title),
        created_by,
    }
}
