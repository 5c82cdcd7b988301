// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{
    CodeYear, HsseData, Location, ReportCategory, ReportCode, ReportDetails, ReportStatus,
    Sequence, WorkReport,
};
use time::OffsetDateTime;
use time::macros::{date, datetime};

pub fn code(sequence: u16, year: u16) -> ReportCode {
    ReportCode::new(Sequence::new(sequence).unwrap(), CodeYear::new(year).unwrap())
}

pub fn create_test_details(title: &str) -> ReportDetails {
    ReportDetails {
        title: title.to_string(),
        description: String::from("Replace the wellhead valve assembly"),
        category: ReportCategory::Maintenance,
        start_date: date!(2025 - 03 - 01),
        end_date: date!(2025 - 03 - 10),
        status: ReportStatus::Planning,
        progress: 0,
        worker_count: 4,
        responsible_persons: vec![String::from("Budi Santoso")],
        location: Location::named("Cluster A"),
        hsse: HsseData::default(),
        photos: Vec::new(),
    }
}

pub fn create_test_report(report_id: i64, sequence: u16, year: u16, title: &str) -> WorkReport {
    create_test_report_with(report_id, sequence, year, create_test_details(title))
}

pub fn create_test_report_with(
    report_id: i64,
    sequence: u16,
    year: u16,
    details: ReportDetails,
) -> WorkReport {
    let created_at: OffsetDateTime = datetime!(2025-03-01 08:00 UTC);
    WorkReport::new(
        report_id,
        code(sequence, year),
        details,
        1,
        created_at,
        created_at,
    )
}

pub fn create_report_created_at(report_id: i64, created_at: OffsetDateTime) -> WorkReport {
    let sequence: u16 = u16::try_from(report_id).unwrap();
    WorkReport::new(
        report_id,
        code(sequence, 2025),
        create_test_details(&format!("Report {report_id}")),
        1,
        created_at,
        created_at,
    )
}
