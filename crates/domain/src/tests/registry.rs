// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use super::helpers::{code, create_test_report};
use crate::{
    CodeRegistry, CodeScope, CodeYear, DomainError, InvalidReason, Sequence, ValidationResult,
    WorkReport, build_registry, check_available, suggest_next, validate, validate_code,
};

fn year(value: u16) -> CodeYear {
    CodeYear::new(value).unwrap()
}

fn registry_of(sequences: &[u16]) -> CodeRegistry {
    let reports: Vec<WorkReport> = sequences
        .iter()
        .map(|seq| create_test_report(i64::from(*seq), *seq, 2025, &format!("Report {seq}")))
        .collect();
    build_registry(&reports, Some(year(2025)))
}

#[test]
fn test_suggest_next_fills_first_gap() {
    assert_eq!(suggest_next(&registry_of(&[1, 2, 4])).unwrap().value(), 3);
}

#[test]
fn test_suggest_next_after_contiguous_run() {
    assert_eq!(suggest_next(&registry_of(&[1, 2, 3])).unwrap().value(), 4);
}

#[test]
fn test_suggest_next_on_empty_registry() {
    let registry: CodeRegistry = CodeRegistry::empty(Some(year(2025)));
    assert_eq!(suggest_next(&registry).unwrap().value(), 1);
}

#[test]
fn test_suggest_next_exhausted() {
    let sequences: Vec<u16> = (1..=999).collect();
    let registry: CodeRegistry = registry_of(&sequences);
    assert_eq!(registry.len(), 999);
    assert_eq!(
        suggest_next(&registry),
        Err(DomainError::CodesExhausted {
            year: Some(year(2025))
        })
    );
}

#[test]
fn test_suggest_next_last_free_is_999() {
    let reports: Vec<WorkReport> = (1..=998)
        .map(|seq| create_test_report(i64::from(seq), seq, 2025, "taken"))
        .collect();
    let registry: CodeRegistry = build_registry(&reports, None);
    assert_eq!(suggest_next(&registry).unwrap().value(), 999);
}

#[test]
fn test_validate_valid_for_every_free_sequence() {
    let registry: CodeRegistry = registry_of(&[1, 5, 500]);
    for sequence in Sequence::all().filter(|s| !registry.contains(*s)) {
        assert_eq!(
            validate(&sequence.to_string(), &registry, None),
            ValidationResult::Valid,
            "expected {sequence} to be valid"
        );
    }
}

#[test]
fn test_validate_duplicate_for_every_used_sequence() {
    let registry: CodeRegistry = registry_of(&[1, 5, 500]);
    for seq in [1_u16, 5, 500] {
        let candidate: String = format!("{seq:03}");
        assert_eq!(
            validate(&candidate, &registry, None),
            ValidationResult::Invalid(InvalidReason::Duplicate {
                conflicting_report_title: format!("Report {seq}"),
            })
        );
    }
}

#[test]
fn test_validate_excluding_own_code_is_valid() {
    let registry: CodeRegistry = registry_of(&[1, 5, 500]);
    assert_eq!(
        validate("005", &registry, Some(code(5, 2025))),
        ValidationResult::Valid
    );
    // Excluding one code does not free another.
    assert!(!validate("001", &registry, Some(code(5, 2025))).is_valid());
}

#[test]
fn test_validate_malformed_before_uniqueness() {
    let registry: CodeRegistry = registry_of(&[7]);
    for candidate in ["7", "07", "0007", "000", "abc", "", "1000"] {
        assert!(
            matches!(
                validate(candidate, &registry, None),
                ValidationResult::Invalid(InvalidReason::Malformed { .. })
            ),
            "expected {candidate:?} to be malformed"
        );
    }
}

#[test]
fn test_validate_code_full_format() {
    let registry: CodeRegistry = registry_of(&[7]);
    assert!(matches!(
        validate_code("007/PEP82600/2025-SO", &registry, None).unwrap(),
        ValidationResult::Invalid(InvalidReason::Duplicate { .. })
    ));
    assert_eq!(
        validate_code("008/PEP82600/2025-SO", &registry, None).unwrap(),
        ValidationResult::Valid
    );
    for input in [
        "7/PEP82600/2025-SO",
        "007/OTHER/2025-SO",
        "007/PEP82600/25-SO",
    ] {
        assert!(matches!(
            validate_code(input, &registry, None).unwrap(),
            ValidationResult::Invalid(InvalidReason::Malformed { .. })
        ));
    }
}

#[test]
fn test_validate_code_rejects_other_year_registry() {
    let registry: CodeRegistry = registry_of(&[7]);
    assert!(matches!(
        validate_code("007/PEP82600/2024-SO", &registry, None),
        Err(DomainError::RegistryScopeMismatch { .. })
    ));
}

#[test]
fn test_build_registry_year_scope() {
    let reports: Vec<WorkReport> = vec![
        create_test_report(1, 1, 2024, "Old"),
        create_test_report(2, 2, 2025, "New"),
        create_test_report(3, 1, 2025, "Also new"),
    ];

    let scoped: CodeRegistry = build_registry(&reports, Some(year(2025)));
    assert_eq!(scoped.sequences().map(Sequence::value).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(
        scoped.owner_of(Sequence::new(1).unwrap(), None).unwrap().title(),
        "Also new"
    );

    let all: CodeRegistry = build_registry(&reports, None);
    assert_eq!(all.len(), 2);
    assert_eq!(
        all.owner_of(Sequence::new(1).unwrap(), None).unwrap().title(),
        "Old"
    );
}

#[test]
fn test_all_years_exclusion_is_per_code() {
    let reports: Vec<WorkReport> = vec![
        create_test_report(1, 3, 2024, "Old"),
        create_test_report(2, 3, 2025, "New"),
    ];
    let all: CodeRegistry = build_registry(&reports, None);

    // Excluding the 2025 report still leaves the 2024 owner of 003.
    assert_eq!(
        validate("003", &all, Some(code(3, 2025))),
        ValidationResult::Invalid(InvalidReason::Duplicate {
            conflicting_report_title: String::from("Old"),
        })
    );
}

#[test]
fn test_check_available_reports_title() {
    let registry: CodeRegistry = registry_of(&[9]);
    let err: DomainError = check_available(Sequence::new(9).unwrap(), &registry, None).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Code 009 is already used in 2025 by report: Report 9"
    );
    assert!(check_available(Sequence::new(10).unwrap(), &registry, None).is_ok());
}

#[test]
fn test_code_scope_registry_year() {
    assert_eq!(CodeScope::PerYear.registry_year(year(2025)), Some(year(2025)));
    assert_eq!(CodeScope::AllYears.registry_year(year(2025)), None);
    assert_eq!("all-years".parse::<CodeScope>().unwrap(), CodeScope::AllYears);
    assert_eq!("year".parse::<CodeScope>().unwrap(), CodeScope::PerYear);
    assert!("global".parse::<CodeScope>().is_err());
}
