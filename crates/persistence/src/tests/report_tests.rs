// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Tests for work report persistence and the code uniqueness index.

use super::{
    code, create_test_details, create_test_new_report, create_test_operator,
    create_test_persistence,
};
use crate::PersistenceError;
use pep_report_domain::{CodeYear, HsseData, ReportStatus, RiskLevel, WeatherCondition};

#[test]
fn test_report_round_trips_through_storage() {
    let mut persistence = create_test_persistence();
    let operator_id = create_test_operator(&mut persistence, "w@pep.example", "worker");
    let mut report = create_test_new_report("Flange replacement", operator_id);
    report.details.responsible_persons = vec![String::from("Budi"), String::from("Sari")];
    report.details.photos = vec![String::from("photos/1.jpg")];
    report.details.hsse = HsseData {
        risk_level: RiskLevel::High,
        weather_condition: WeatherCondition::Rainy,
        safety_incidents: 2,
    };

    let record = persistence
        .create_work_report(code(7, 2025), &report)
        .unwrap();

    assert_eq!(record.report.code(), code(7, 2025));
    assert_eq!(record.report.code().to_string(), "007/PEP82600/2025-SO");
    assert_eq!(record.report.details(), &report.details);
    assert_eq!(record.report.created_by(), operator_id);
    assert_eq!(record.creator_email, "w@pep.example");
    assert_eq!(record.creator_name, "Test Operator");

    let fetched = persistence
        .get_work_report(record.report.report_id())
        .unwrap()
        .unwrap();
    assert_eq!(fetched, record);
}

#[test]
fn test_duplicate_code_is_rejected_by_unique_index() {
    let mut persistence = create_test_persistence();
    let operator_id = create_test_operator(&mut persistence, "w@pep.example", "worker");
    persistence
        .create_work_report(code(3, 2025), &create_test_new_report("First", operator_id))
        .unwrap();

    let result = persistence
        .create_work_report(code(3, 2025), &create_test_new_report("Second", operator_id));

    assert_eq!(
        result,
        Err(PersistenceError::DuplicateReportCode {
            year: 2025,
            sequence: 3
        })
    );
    assert_eq!(persistence.list_work_reports(None).unwrap().len(), 1);
}

#[test]
fn test_same_sequence_in_another_year_is_allowed() {
    let mut persistence = create_test_persistence();
    let operator_id = create_test_operator(&mut persistence, "w@pep.example", "worker");
    persistence
        .create_work_report(code(3, 2024), &create_test_new_report("Old", operator_id))
        .unwrap();

    let result = persistence
        .create_work_report(code(3, 2025), &create_test_new_report("New", operator_id));

    assert!(result.is_ok());
}

#[test]
fn test_list_is_newest_first_and_filters_by_year() {
    let mut persistence = create_test_persistence();
    let operator_id = create_test_operator(&mut persistence, "w@pep.example", "worker");
    persistence
        .create_work_report(code(1, 2024), &create_test_new_report("A", operator_id))
        .unwrap();
    persistence
        .create_work_report(code(1, 2025), &create_test_new_report("B", operator_id))
        .unwrap();
    persistence
        .create_work_report(code(2, 2025), &create_test_new_report("C", operator_id))
        .unwrap();

    let titles: Vec<String> = persistence
        .list_work_reports(None)
        .unwrap()
        .into_iter()
        .map(|record| record.report.details().title.clone())
        .collect();
    assert_eq!(titles, vec!["C", "B", "A"]);

    let year_2025 = persistence
        .list_work_reports(Some(CodeYear::new(2025).unwrap()))
        .unwrap();
    assert_eq!(year_2025.len(), 2);
    assert!(
        year_2025
            .iter()
            .all(|record| record.report.code().year().value() == 2025)
    );
}

#[test]
fn test_completed_report_is_stored_at_full_progress() {
    let mut persistence = create_test_persistence();
    let operator_id = create_test_operator(&mut persistence, "w@pep.example", "worker");
    let mut report = create_test_new_report("Done", operator_id);
    report.details.status = ReportStatus::Completed;
    report.details.progress = 40;

    let record = persistence
        .create_work_report(code(1, 2025), &report)
        .unwrap();

    assert_eq!(record.report.details().progress, 100);
}

#[test]
fn test_update_rewrites_code_and_clears_coordinates() {
    let mut persistence = create_test_persistence();
    let operator_id = create_test_operator(&mut persistence, "w@pep.example", "worker");
    let created = persistence
        .create_work_report(code(1, 2025), &create_test_new_report("Flange", operator_id))
        .unwrap();

    let mut details = create_test_details("Flange, phase two");
    details.location.latitude = None;
    details.location.longitude = None;
    let updated = persistence
        .update_work_report(created.report.report_id(), code(9, 2025), &details)
        .unwrap();

    assert_eq!(updated.report.code(), code(9, 2025));
    assert_eq!(updated.report.details().title, "Flange, phase two");
    assert_eq!(updated.report.details().location.coordinates(), None);
    assert_eq!(updated.report.created_at(), created.report.created_at());
    assert!(updated.report.updated_at() >= created.report.updated_at());
}

#[test]
fn test_update_to_taken_code_is_rejected() {
    let mut persistence = create_test_persistence();
    let operator_id = create_test_operator(&mut persistence, "w@pep.example", "worker");
    persistence
        .create_work_report(code(1, 2025), &create_test_new_report("Holder", operator_id))
        .unwrap();
    let other = persistence
        .create_work_report(code(2, 2025), &create_test_new_report("Mover", operator_id))
        .unwrap();

    let result = persistence.update_work_report(
        other.report.report_id(),
        code(1, 2025),
        other.report.details(),
    );

    assert_eq!(
        result,
        Err(PersistenceError::DuplicateReportCode {
            year: 2025,
            sequence: 1
        })
    );
}

#[test]
fn test_update_keeping_own_code_succeeds() {
    let mut persistence = create_test_persistence();
    let operator_id = create_test_operator(&mut persistence, "w@pep.example", "worker");
    let created = persistence
        .create_work_report(code(5, 2025), &create_test_new_report("Mine", operator_id))
        .unwrap();

    let result = persistence.update_work_report(
        created.report.report_id(),
        code(5, 2025),
        created.report.details(),
    );

    assert!(result.is_ok());
}

#[test]
fn test_update_missing_report_fails() {
    let mut persistence = create_test_persistence();

    let result = persistence.update_work_report(77, code(1, 2025), &create_test_details("Ghost"));

    assert_eq!(result, Err(PersistenceError::ReportNotFound(77)));
}

#[test]
fn test_delete_report() {
    let mut persistence = create_test_persistence();
    let operator_id = create_test_operator(&mut persistence, "w@pep.example", "worker");
    let created = persistence
        .create_work_report(code(1, 2025), &create_test_new_report("Gone", operator_id))
        .unwrap();
    let report_id = created.report.report_id();

    persistence.delete_work_report(report_id).unwrap();

    assert!(persistence.get_work_report(report_id).unwrap().is_none());
    assert_eq!(
        persistence.delete_work_report(report_id),
        Err(PersistenceError::ReportNotFound(report_id))
    );
    // The code is free again.
    assert!(
        persistence
            .create_work_report(code(1, 2025), &create_test_new_report("Again", operator_id))
            .is_ok()
    );
}
