// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{MemoryStore, code, create_test_new_report, year};
use crate::{
    Allocation, AllocationPolicy, CodeRequest, CoreError, create_with_allocation, snapshot,
    suggest_code, try_commit,
};
use pep_report_domain::{
    CodeRegistry, CodeScope, DomainError, InvalidReason, NewReport, ReportCode, ReportStatus,
    Sequence, ValidationResult, suggest_next,
};
use std::sync::Arc;
use std::sync::atomic::Ordering;

#[tokio::test]
async fn test_concurrent_creators_second_commit_conflicts_then_takes_next() {
    let store: MemoryStore = MemoryStore::default();

    // Both callers snapshot the empty registry and choose 001.
    let snapshot_a: CodeRegistry = snapshot(&store, year(2025), CodeScope::PerYear)
        .await
        .unwrap();
    let snapshot_b: CodeRegistry = snapshot(&store, year(2025), CodeScope::PerYear)
        .await
        .unwrap();
    let choice_a: Sequence = suggest_next(&snapshot_a).unwrap();
    let choice_b: Sequence = suggest_next(&snapshot_b).unwrap();
    assert_eq!(choice_a, choice_b);
    assert_eq!(choice_a.value(), 1);

    let first = try_commit(
        &store,
        ReportCode::new(choice_a, year(2025)),
        &create_test_new_report("A"),
    )
    .await;
    assert!(first.is_ok());

    let second = try_commit(
        &store,
        ReportCode::new(choice_b, year(2025)),
        &create_test_new_report("B"),
    )
    .await;
    assert_eq!(
        second,
        Err(CoreError::StoreConflict {
            code: code(1, 2025)
        })
    );

    // The loser re-snapshots and commits the next free sequence.
    let fresh: CodeRegistry = snapshot(&store, year(2025), CodeScope::PerYear)
        .await
        .unwrap();
    let retry: Sequence = suggest_next(&fresh).unwrap();
    assert_eq!(retry.value(), 2);
    let committed = try_commit(
        &store,
        ReportCode::new(retry, year(2025)),
        &create_test_new_report("B"),
    )
    .await
    .unwrap();
    assert_eq!(committed.code().to_string(), "002/PEP82600/2025-SO");
}

#[tokio::test]
async fn test_auto_allocation_retries_after_stale_snapshot() {
    let store: MemoryStore = MemoryStore::default();
    store.seed(1, 2025, "Existing").await;
    store.make_stale(1);

    let allocation: Allocation = create_with_allocation(
        &store,
        CodeRequest::Auto { year: year(2025) },
        &create_test_new_report("New"),
        AllocationPolicy::default(),
    )
    .await
    .unwrap();

    assert_eq!(allocation.attempts, 2);
    assert_eq!(allocation.report.code(), code(2, 2025));
}

#[tokio::test]
async fn test_auto_allocation_fills_gap() {
    let store: MemoryStore = MemoryStore::default();
    store.seed(1, 2025, "One").await;
    store.seed(2, 2025, "Two").await;
    store.seed(4, 2025, "Four").await;

    let allocation: Allocation = create_with_allocation(
        &store,
        CodeRequest::Auto { year: year(2025) },
        &create_test_new_report("Three"),
        AllocationPolicy::default(),
    )
    .await
    .unwrap();
    assert_eq!(allocation.attempts, 1);
    assert_eq!(allocation.report.code(), code(3, 2025));
}

#[tokio::test]
async fn test_allocation_gives_up_after_bound() {
    let store: MemoryStore = MemoryStore::default();
    store.seed(1, 2025, "Existing").await;
    store.make_stale(usize::MAX);

    let result = create_with_allocation(
        &store,
        CodeRequest::Auto { year: year(2025) },
        &create_test_new_report("New"),
        AllocationPolicy::default(),
    )
    .await;

    assert_eq!(result, Err(CoreError::AllocationFailed { attempts: 5 }));
    // One seed plus five rejected attempts.
    assert_eq!(store.create_calls.load(Ordering::SeqCst), 6);
    assert_eq!(
        CoreError::AllocationFailed { attempts: 5 }.to_string(),
        "Could not allocate code after 5 attempts, please retry"
    );
}

#[tokio::test]
async fn test_manual_code_conflict_becomes_duplicate() {
    let store: MemoryStore = MemoryStore::default();
    store.seed(3, 2025, "Existing").await;
    store.make_stale(1);

    let result = create_with_allocation(
        &store,
        CodeRequest::Manual(code(3, 2025)),
        &create_test_new_report("New"),
        AllocationPolicy::default(),
    )
    .await;

    assert_eq!(
        result,
        Err(CoreError::DomainViolation(DomainError::DuplicateCode {
            sequence: Sequence::new(3).unwrap(),
            year: Some(year(2025)),
            conflicting_report_title: String::from("Existing"),
        }))
    );
}

#[tokio::test]
async fn test_manual_code_free_commits() {
    let store: MemoryStore = MemoryStore::default();
    store.seed(3, 2025, "Existing").await;

    let allocation: Allocation = create_with_allocation(
        &store,
        CodeRequest::Manual(code(42, 2025)),
        &create_test_new_report("New"),
        AllocationPolicy::default(),
    )
    .await
    .unwrap();
    assert_eq!(allocation.report.code(), code(42, 2025));
}

#[tokio::test]
async fn test_same_sequence_in_other_year_is_free_per_year() {
    let store: MemoryStore = MemoryStore::default();
    store.seed(1, 2024, "Last year").await;

    let suggested: ReportCode = suggest_code(&store, year(2025), CodeScope::PerYear)
        .await
        .unwrap();
    assert_eq!(suggested, code(1, 2025));

    let advisory: ReportCode = suggest_code(&store, year(2025), CodeScope::AllYears)
        .await
        .unwrap();
    assert_eq!(advisory, code(2, 2025));
}

#[tokio::test]
async fn test_invalid_details_rejected_before_allocation() {
    let store: MemoryStore = MemoryStore::default();
    let mut report: NewReport = create_test_new_report("New");
    report.details.worker_count = 0;

    let result = create_with_allocation(
        &store,
        CodeRequest::Auto { year: year(2025) },
        &report,
        AllocationPolicy::default(),
    )
    .await;
    assert_eq!(
        result,
        Err(CoreError::DomainViolation(DomainError::InvalidWorkerCount(0)))
    );
    assert_eq!(store.list_count(), 0);
}

#[tokio::test]
async fn test_completed_report_created_at_full_progress() {
    let store: MemoryStore = MemoryStore::default();
    let mut report: NewReport = create_test_new_report("Done");
    report.details.status = ReportStatus::Completed;
    report.details.progress = 10;

    let allocation: Allocation = create_with_allocation(
        &store,
        CodeRequest::Auto { year: year(2025) },
        &report,
        AllocationPolicy::default(),
    )
    .await
    .unwrap();
    assert_eq!(allocation.report.details().progress, 100);
}

#[tokio::test]
async fn test_parallel_auto_allocations_are_unique() {
    let store: Arc<MemoryStore> = Arc::new(MemoryStore::default());
    let policy: AllocationPolicy = AllocationPolicy {
        scope: CodeScope::PerYear,
        max_attempts: 20,
    };

    let mut handles = Vec::new();
    for i in 0..8 {
        let store: Arc<MemoryStore> = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            create_with_allocation(
                store.as_ref(),
                CodeRequest::Auto { year: year(2025) },
                &create_test_new_report(&format!("Job {i}")),
                policy,
            )
            .await
        }));
    }

    let mut sequences: Vec<u16> = Vec::new();
    for handle in handles {
        let allocation: Allocation = handle.await.unwrap().unwrap();
        sequences.push(allocation.report.code().sequence().value());
    }
    sequences.sort_unstable();
    assert_eq!(sequences, (1..=8).collect::<Vec<u16>>());
    assert_eq!(store.len().await, 8);
}

#[tokio::test]
async fn test_check_candidate_reports_duplicate_title() {
    let store: MemoryStore = MemoryStore::default();
    store.seed(7, 2025, "Compressor overhaul").await;

    let result: ValidationResult =
        crate::check_candidate(&store, "007", year(2025), None, CodeScope::PerYear)
            .await
            .unwrap();
    assert_eq!(
        result,
        ValidationResult::Invalid(InvalidReason::Duplicate {
            conflicting_report_title: String::from("Compressor overhaul"),
        })
    );

    // Malformed input never reaches the store.
    let calls: usize = store.list_count();
    let malformed: ValidationResult =
        crate::check_candidate(&store, "7", year(2025), None, CodeScope::PerYear)
            .await
            .unwrap();
    assert!(matches!(
        malformed,
        ValidationResult::Invalid(InvalidReason::Malformed { .. })
    ));
    assert_eq!(store.list_count(), calls);
}

#[tokio::test]
async fn test_check_full_code_uses_the_code_year() {
    let store: MemoryStore = MemoryStore::default();
    store.seed(7, 2025, "Compressor overhaul").await;

    let taken: ValidationResult =
        crate::check_full_code(&store, "007/PEP82600/2025-SO", None, CodeScope::PerYear)
            .await
            .unwrap();
    assert!(matches!(
        taken,
        ValidationResult::Invalid(InvalidReason::Duplicate { .. })
    ));

    let other_year: ValidationResult =
        crate::check_full_code(&store, "007/PEP82600/2026-SO", None, CodeScope::PerYear)
            .await
            .unwrap();
    assert_eq!(other_year, ValidationResult::Valid);

    let calls: usize = store.list_count();
    let malformed: ValidationResult =
        crate::check_full_code(&store, "007/PEP82600/2025", None, CodeScope::PerYear)
            .await
            .unwrap();
    assert!(matches!(
        malformed,
        ValidationResult::Invalid(InvalidReason::Malformed { .. })
    ));
    assert_eq!(store.list_count(), calls);
}
