// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Test helper functions and fixtures.

use std::sync::Arc;

use pep_report::AllocationPolicy;
use pep_report_persistence::{OperatorData, Persistence};
use time::{Date, Month, OffsetDateTime};
use tokio::sync::Mutex;

use crate::{
    AuthenticatedActor, CreateReportRequest, LocationDto, PersistenceStore, Role, create_report,
};

pub const TEST_PASSWORD: &str = "Refinery#2026";

/// A test operator: the actor and their stored data.
pub struct TestOperator {
    pub actor: AuthenticatedActor,
    pub operator: OperatorData,
}

pub fn create_test_persistence() -> Persistence {
    Persistence::new_in_memory().unwrap()
}

pub fn create_test_store() -> PersistenceStore {
    PersistenceStore::new(Arc::new(Mutex::new(create_test_persistence())))
}

pub fn create_test_operator(
    persistence: &mut Persistence,
    email: &str,
    display_name: &str,
    role: Role,
) -> TestOperator {
    let operator_id: i64 = persistence
        .create_operator(email, display_name, TEST_PASSWORD, role.as_str())
        .unwrap();
    let operator: OperatorData = persistence.get_operator_by_id(operator_id).unwrap().unwrap();
    TestOperator {
        actor: AuthenticatedActor::new(operator_id, operator.email.clone(), role),
        operator,
    }
}

pub fn create_test_admin(persistence: &mut Persistence) -> TestOperator {
    create_test_operator(persistence, "admin@pep.co.id", "Site Admin", Role::Admin)
}

pub fn create_test_supervisor(persistence: &mut Persistence) -> TestOperator {
    create_test_operator(
        persistence,
        "supervisor@pep.co.id",
        "Field Supervisor",
        Role::Supervisor,
    )
}

pub fn create_test_worker(persistence: &mut Persistence) -> TestOperator {
    create_test_operator(persistence, "worker@pep.co.id", "Field Worker", Role::Worker)
}

/// 14 March 2026, the fixed "today" of these tests.
pub fn test_today() -> Date {
    Date::from_calendar_date(2026, Month::March, 14).unwrap()
}

/// Mid-morning UTC on `test_today`, still the same day in Jakarta.
pub fn test_now() -> OffsetDateTime {
    test_today().with_hms(3, 0, 0).unwrap().assume_utc()
}

pub fn test_policy() -> AllocationPolicy {
    AllocationPolicy::default()
}

pub fn create_valid_report_request(title: &str) -> CreateReportRequest {
    CreateReportRequest {
        code_sequence: None,
        code_year: None,
        title: title.to_string(),
        description: String::from("Replace corroded flowline section at the manifold"),
        category: String::from("maintenance"),
        start_date: String::from("2026-03-10"),
        end_date: String::from("2026-03-18"),
        status: Some(String::from("ongoing")),
        progress: Some(40),
        worker_count: 6,
        responsible_persons: vec![String::from("Budi Santoso")],
        location: LocationDto {
            name: String::from("Tanjung Field Block A"),
            latitude: Some(-2.95),
            longitude: Some(104.75),
        },
        risk_level: String::from("medium"),
        weather_condition: String::from("sunny"),
        safety_incidents: 0,
        photos: Vec::new(),
    }
}

/// Creates a report through the handler and returns its ID and code.
pub async fn seed_report(
    store: &PersistenceStore,
    creator: &TestOperator,
    request: &CreateReportRequest,
) -> (i64, String) {
    let (response, _) = create_report(
        store,
        request,
        &creator.actor,
        &creator.operator,
        test_policy(),
        test_today(),
    )
    .await
    .unwrap();
    (response.report.report_id, response.report.code)
}
