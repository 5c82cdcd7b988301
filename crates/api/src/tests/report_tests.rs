// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use std::collections::HashSet;

use pep_report::AllocationPolicy;
use pep_report_domain::{InvalidReason, ReportStatus};

use super::helpers::{
    TestOperator, create_test_admin, create_test_store, create_test_supervisor,
    create_test_worker, create_valid_report_request, seed_report, test_now, test_policy,
    test_today,
};
use crate::{
    ApiError, CreateReportRequest, ListReportsQuery, UpdateReportRequest, ValidateCodeQuery,
    create_report, delete_operator, delete_report, get_report, list_reports, suggest_code,
    update_report, validate_code,
};

#[tokio::test]
async fn test_create_report_allocates_first_code_of_year() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);

    let (response, _) = create_report(
        &store,
        &create_valid_report_request("Flowline replacement"),
        &worker.actor,
        &worker.operator,
        test_policy(),
        test_today(),
    )
    .await
    .unwrap();

    assert_eq!(response.report.code, "001/PEP82600/2026-SO");
    assert_eq!(response.report.code_year, 2026);
    assert_eq!(response.attempts, 1);
    assert_eq!(response.report.creator_name, "Field Worker");
    assert_eq!(response.report.status, ReportStatus::Ongoing);
}

#[tokio::test]
async fn test_create_report_allocates_sequentially() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);

    let (_, first) = seed_report(&store, &worker, &create_valid_report_request("First")).await;
    let (_, second) = seed_report(&store, &worker, &create_valid_report_request("Second")).await;

    assert_eq!(first, "001/PEP82600/2026-SO");
    assert_eq!(second, "002/PEP82600/2026-SO");
}

#[tokio::test]
async fn test_code_year_is_independent_per_year() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);
    seed_report(&store, &worker, &create_valid_report_request("This year")).await;

    let mut request: CreateReportRequest = create_valid_report_request("Next year");
    request.code_year = Some(2027);
    let (_, code) = seed_report(&store, &worker, &request).await;

    assert_eq!(code, "001/PEP82600/2027-SO");
}

#[tokio::test]
async fn test_create_report_with_manual_code() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);

    let mut request: CreateReportRequest = create_valid_report_request("Manual");
    request.code_sequence = Some(String::from("042"));
    let (_, code) = seed_report(&store, &worker, &request).await;

    assert_eq!(code, "042/PEP82600/2026-SO");
}

#[tokio::test]
async fn test_create_report_with_taken_manual_code_is_rejected() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);
    seed_report(&store, &worker, &create_valid_report_request("Original")).await;

    let mut request: CreateReportRequest = create_valid_report_request("Copycat");
    request.code_sequence = Some(String::from("001"));
    let result = create_report(
        &store,
        &request,
        &worker.actor,
        &worker.operator,
        test_policy(),
        test_today(),
    )
    .await;

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "unique_report_code"
    ));
}

#[tokio::test]
async fn test_create_report_with_malformed_sequence_is_rejected() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);

    for candidate in ["7", "0007", "000", "abc"] {
        let mut request: CreateReportRequest = create_valid_report_request("Bad code");
        request.code_sequence = Some(candidate.to_string());
        let result = create_report(
            &store,
            &request,
            &worker.actor,
            &worker.operator,
            test_policy(),
            test_today(),
        )
        .await;

        assert!(
            matches!(result, Err(ApiError::InvalidInput { ref field, .. }) if field == "code"),
            "{candidate} should be rejected"
        );
    }
}

#[tokio::test]
async fn test_create_report_with_invalid_fields_is_rejected() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);

    let mut bad_category: CreateReportRequest = create_valid_report_request("Bad");
    bad_category.category = String::from("demolition");
    let result = create_report(
        &store,
        &bad_category,
        &worker.actor,
        &worker.operator,
        test_policy(),
        test_today(),
    )
    .await;
    assert!(matches!(result, Err(ApiError::InvalidInput { ref field, .. }) if field == "category"));

    let mut bad_dates: CreateReportRequest = create_valid_report_request("Bad");
    bad_dates.end_date = String::from("2026-03-01");
    let result = create_report(
        &store,
        &bad_dates,
        &worker.actor,
        &worker.operator,
        test_policy(),
        test_today(),
    )
    .await;
    assert!(matches!(result, Err(ApiError::InvalidInput { ref field, .. }) if field == "end_date"));

    // Nothing was stored, so the first code is still free.
    let suggestion = suggest_code(&store, None, test_today(), test_policy().scope)
        .await
        .unwrap();
    assert_eq!(suggestion.sequence, "001");
}

#[tokio::test]
async fn test_create_report_notifies_admins_and_supervisors() {
    let store = create_test_store();
    let (admin, supervisor, worker) = {
        let mut persistence = store.persistence().lock().await;
        (
            create_test_admin(&mut persistence),
            create_test_supervisor(&mut persistence),
            create_test_worker(&mut persistence),
        )
    };

    let (_, notified) = create_report(
        &store,
        &create_valid_report_request("Notify"),
        &worker.actor,
        &worker.operator,
        test_policy(),
        test_today(),
    )
    .await
    .unwrap();

    let notified: HashSet<i64> = notified.into_iter().collect();
    assert!(notified.contains(&admin.actor.operator_id));
    assert!(notified.contains(&supervisor.actor.operator_id));
    assert!(!notified.contains(&worker.actor.operator_id));
}

#[tokio::test]
async fn test_suggest_code_reuses_smallest_free_sequence() {
    let store = create_test_store();
    let (admin, worker) = {
        let mut persistence = store.persistence().lock().await;
        (create_test_admin(&mut persistence), create_test_worker(&mut persistence))
    };
    let (first_id, _) = seed_report(&store, &worker, &create_valid_report_request("One")).await;
    seed_report(&store, &worker, &create_valid_report_request("Two")).await;

    delete_report(&mut *store.persistence().lock().await, first_id, &admin.actor).unwrap();

    let suggestion = suggest_code(&store, Some(2026), test_today(), test_policy().scope)
        .await
        .unwrap();
    assert_eq!(suggestion.code, "001/PEP82600/2026-SO");
    assert_eq!(suggestion.year, 2026);
}

#[tokio::test]
async fn test_validate_code_reports_duplicate_with_conflicting_title() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);
    seed_report(&store, &worker, &create_valid_report_request("Compressor overhaul")).await;

    let response = validate_code(
        &store,
        &ValidateCodeQuery {
            sequence: String::from("001"),
            code: None,
            year: None,
            excluding_report_id: None,
        },
        test_today(),
        test_policy().scope,
    )
    .await
    .unwrap();

    assert!(!response.valid);
    assert_eq!(
        response.reason,
        Some(InvalidReason::Duplicate {
            conflicting_report_title: String::from("Compressor overhaul"),
        })
    );
    assert!(response.message.is_some());
}

#[tokio::test]
async fn test_validate_code_excludes_edited_report() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);
    let (report_id, _) = seed_report(&store, &worker, &create_valid_report_request("Own")).await;

    let response = validate_code(
        &store,
        &ValidateCodeQuery {
            sequence: String::from("001"),
            code: None,
            year: None,
            excluding_report_id: Some(report_id),
        },
        test_today(),
        test_policy().scope,
    )
    .await
    .unwrap();

    assert!(response.valid);
    assert_eq!(response.code.as_deref(), Some("001/PEP82600/2026-SO"));
}

#[tokio::test]
async fn test_validate_code_reports_malformed_candidate() {
    let store = create_test_store();

    let response = validate_code(
        &store,
        &ValidateCodeQuery {
            sequence: String::from("12"),
            code: None,
            year: Some(2026),
            excluding_report_id: None,
        },
        test_today(),
        test_policy().scope,
    )
    .await
    .unwrap();

    assert!(!response.valid);
    assert!(matches!(response.reason, Some(InvalidReason::Malformed { .. })));
    assert_eq!(response.code, None);
}

#[tokio::test]
async fn test_validate_full_code_checks_its_own_year() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);
    seed_report(&store, &worker, &create_valid_report_request("Compressor overhaul")).await;

    let full_code = |code: &str| ValidateCodeQuery {
        code: Some(String::from(code)),
        ..ValidateCodeQuery::default()
    };

    let taken = validate_code(
        &store,
        &full_code("001/PEP82600/2026-SO"),
        test_today(),
        test_policy().scope,
    )
    .await
    .unwrap();
    assert!(!taken.valid);
    assert_eq!(
        taken.reason,
        Some(InvalidReason::Duplicate {
            conflicting_report_title: String::from("Compressor overhaul"),
        })
    );

    let next_year = validate_code(
        &store,
        &full_code(" 001/PEP82600/2027-SO "),
        test_today(),
        test_policy().scope,
    )
    .await
    .unwrap();
    assert!(next_year.valid);
    assert_eq!(next_year.candidate, "001/PEP82600/2027-SO");
    assert_eq!(next_year.code.as_deref(), Some("001/PEP82600/2027-SO"));

    let malformed = validate_code(
        &store,
        &full_code("001/PEP99999/2026-SO"),
        test_today(),
        test_policy().scope,
    )
    .await
    .unwrap();
    assert!(!malformed.valid);
    assert!(matches!(malformed.reason, Some(InvalidReason::Malformed { .. })));
}

#[tokio::test]
async fn test_validate_code_for_missing_report_is_not_found() {
    let store = create_test_store();

    let result = validate_code(
        &store,
        &ValidateCodeQuery {
            sequence: String::from("001"),
            code: None,
            year: None,
            excluding_report_id: Some(999),
        },
        test_today(),
        test_policy().scope,
    )
    .await;

    assert!(matches!(result, Err(ApiError::ResourceNotFound { .. })));
}

#[tokio::test]
async fn test_update_report_keeps_own_code() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);
    let (report_id, code) = seed_report(&store, &worker, &create_valid_report_request("Keep")).await;

    let (updated, _) = update_report(
        &store,
        report_id,
        &UpdateReportRequest {
            code_sequence: Some(String::from("001")),
            title: Some(String::from("Keep renamed")),
            ..UpdateReportRequest::default()
        },
        &worker.actor,
        test_policy().scope,
    )
    .await
    .unwrap();

    assert_eq!(updated.code, code);
    assert_eq!(updated.title, "Keep renamed");
}

#[tokio::test]
async fn test_update_report_to_taken_code_is_rejected() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);
    seed_report(&store, &worker, &create_valid_report_request("First")).await;
    let (second_id, _) = seed_report(&store, &worker, &create_valid_report_request("Second")).await;

    let result = update_report(
        &store,
        second_id,
        &UpdateReportRequest {
            code_sequence: Some(String::from("001")),
            ..UpdateReportRequest::default()
        },
        &worker.actor,
        test_policy().scope,
    )
    .await;

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "unique_report_code"
    ));
    let unchanged = get_report(&mut *store.persistence().lock().await, second_id).unwrap();
    assert_eq!(unchanged.code, "002/PEP82600/2026-SO");
}

#[tokio::test]
async fn test_update_report_moves_to_free_code_in_same_year() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);
    let (report_id, _) = seed_report(&store, &worker, &create_valid_report_request("Move")).await;

    let (updated, _) = update_report(
        &store,
        report_id,
        &UpdateReportRequest {
            code_sequence: Some(String::from("250")),
            ..UpdateReportRequest::default()
        },
        &worker.actor,
        test_policy().scope,
    )
    .await
    .unwrap();

    assert_eq!(updated.code, "250/PEP82600/2026-SO");
}

#[tokio::test]
async fn test_update_report_status_change_notifies() {
    let store = create_test_store();
    let (admin, supervisor, worker) = {
        let mut persistence = store.persistence().lock().await;
        (
            create_test_admin(&mut persistence),
            create_test_supervisor(&mut persistence),
            create_test_worker(&mut persistence),
        )
    };
    let (report_id, _) = seed_report(&store, &worker, &create_valid_report_request("Status")).await;

    let (updated, notified) = update_report(
        &store,
        report_id,
        &UpdateReportRequest {
            status: Some(String::from("completed")),
            progress: Some(100),
            ..UpdateReportRequest::default()
        },
        &admin.actor,
        test_policy().scope,
    )
    .await
    .unwrap();

    assert_eq!(updated.status, ReportStatus::Completed);
    assert_eq!(notified, vec![supervisor.actor.operator_id]);
}

#[tokio::test]
async fn test_update_report_without_status_change_does_not_notify() {
    let store = create_test_store();
    let (_supervisor, worker) = {
        let mut persistence = store.persistence().lock().await;
        (
            create_test_supervisor(&mut persistence),
            create_test_worker(&mut persistence),
        )
    };
    let (report_id, _) = seed_report(&store, &worker, &create_valid_report_request("Quiet")).await;

    let (_, notified) = update_report(
        &store,
        report_id,
        &UpdateReportRequest {
            progress: Some(60),
            ..UpdateReportRequest::default()
        },
        &worker.actor,
        test_policy().scope,
    )
    .await
    .unwrap();

    assert!(notified.is_empty());
}

#[tokio::test]
async fn test_update_report_with_no_fields_is_rejected() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);
    let (report_id, _) = seed_report(&store, &worker, &create_valid_report_request("Empty")).await;

    let result = update_report(
        &store,
        report_id,
        &UpdateReportRequest::default(),
        &worker.actor,
        test_policy().scope,
    )
    .await;

    assert!(matches!(result, Err(ApiError::InvalidInput { ref field, .. }) if field == "body"));
}

#[tokio::test]
async fn test_update_missing_report_is_not_found() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);

    let result = update_report(
        &store,
        404,
        &UpdateReportRequest {
            title: Some(String::from("Ghost")),
            ..UpdateReportRequest::default()
        },
        &worker.actor,
        test_policy().scope,
    )
    .await;

    assert!(matches!(result, Err(ApiError::ResourceNotFound { .. })));
}

#[tokio::test]
async fn test_delete_report_requires_admin() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);
    let (report_id, _) = seed_report(&store, &worker, &create_valid_report_request("Keep")).await;

    let result = delete_report(&mut *store.persistence().lock().await, report_id, &worker.actor);

    assert!(matches!(result, Err(ApiError::Unauthorized { .. })));
}

#[tokio::test]
async fn test_operator_with_reports_cannot_be_deleted() {
    let store = create_test_store();
    let (admin, worker) = {
        let mut persistence = store.persistence().lock().await;
        (create_test_admin(&mut persistence), create_test_worker(&mut persistence))
    };
    seed_report(&store, &worker, &create_valid_report_request("Authored")).await;

    let result = delete_operator(
        &mut *store.persistence().lock().await,
        worker.actor.operator_id,
        &admin.actor,
    );

    assert!(matches!(
        result,
        Err(ApiError::DomainRuleViolation { ref rule, .. }) if rule == "operator_not_referenced"
    ));
}

#[tokio::test]
async fn test_list_reports_filters_by_status_and_search() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);
    seed_report(&store, &worker, &create_valid_report_request("Pump repair")).await;
    let mut planned: CreateReportRequest = create_valid_report_request("Tank inspection");
    planned.status = Some(String::from("planning"));
    planned.progress = Some(0);
    seed_report(&store, &worker, &planned).await;

    let mut persistence = store.persistence().lock().await;
    let all = list_reports(&mut persistence, &ListReportsQuery::default(), test_now()).unwrap();
    assert_eq!(all.total, 2);

    let planning_only = list_reports(
        &mut persistence,
        &ListReportsQuery {
            status: Some(String::from("planning,delayed")),
            ..ListReportsQuery::default()
        },
        test_now(),
    )
    .unwrap();
    assert_eq!(planning_only.total, 1);
    assert_eq!(planning_only.reports[0].title, "Tank inspection");

    let by_code = list_reports(
        &mut persistence,
        &ListReportsQuery {
            search: Some(String::from("001/PEP")),
            ..ListReportsQuery::default()
        },
        test_now(),
    )
    .unwrap();
    assert_eq!(by_code.total, 1);
    assert_eq!(by_code.reports[0].title, "Pump repair");
}

#[tokio::test]
async fn test_list_reports_rejects_unknown_status() {
    let store = create_test_store();
    let mut persistence = store.persistence().lock().await;

    let result = list_reports(
        &mut persistence,
        &ListReportsQuery {
            status: Some(String::from("cancelled")),
            ..ListReportsQuery::default()
        },
        test_now(),
    );

    assert!(matches!(result, Err(ApiError::InvalidInput { .. })));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_allocations_receive_distinct_codes() {
    let store = create_test_store();
    let worker: TestOperator = create_test_worker(&mut *store.persistence().lock().await);
    let worker = std::sync::Arc::new(worker);

    // Every round of conflicts commits at least one report, so eight
    // attempts always suffice for eight writers.
    let policy: AllocationPolicy = AllocationPolicy {
        max_attempts: 8,
        ..test_policy()
    };
    let mut handles = Vec::new();
    for index in 0..8 {
        let store = store.clone();
        let worker = std::sync::Arc::clone(&worker);
        handles.push(tokio::spawn(async move {
            create_report(
                &store,
                &create_valid_report_request(&format!("Concurrent {index}")),
                &worker.actor,
                &worker.operator,
                policy,
                test_today(),
            )
            .await
        }));
    }

    let mut codes: HashSet<String> = HashSet::new();
    for handle in handles {
        let (response, _) = handle.await.unwrap().unwrap();
        codes.insert(response.report.code);
    }

    assert_eq!(codes.len(), 8);
    assert!(codes.contains("001/PEP82600/2026-SO"));
    assert!(codes.contains("008/PEP82600/2026-SO"));
}
