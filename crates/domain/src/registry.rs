// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Code registry and the pure allocation rules built on it.
//!
//! A `CodeRegistry` is a point-in-time snapshot of the sequences already in
//! use within one scope, together with the title of the report owning each
//! sequence. It is a value: callers rebuild it from the store for every
//! operation and never keep one around between operations.
//!
//! `suggest_next` and `validate` only read a registry. They have no side
//! effects, and a snapshot may already be stale when they run. The store's
//! unique index is the final arbiter.

use crate::code::{CodeYear, ReportCode, Sequence};
use crate::error::DomainError;
use crate::report::WorkReport;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

/// How widely a sequence must be unique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CodeScope {
    /// A sequence is unique within its code year. Matches the store index.
    #[default]
    PerYear,
    /// A sequence is unique across every year.
    ///
    /// This is stricter than the store index, so it is advisory only: the
    /// store still accepts the same sequence in a different year.
    AllYears,
}

impl CodeScope {
    /// Returns the string representation of the scope.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PerYear => "year",
            Self::AllYears => "all-years",
        }
    }

    /// Returns the year filter a registry for `year` must be built with.
    #[must_use]
    pub const fn registry_year(self, year: CodeYear) -> Option<CodeYear> {
        match self {
            Self::PerYear => Some(year),
            Self::AllYears => None,
        }
    }
}

impl FromStr for CodeScope {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "year" => Ok(Self::PerYear),
            "all-years" => Ok(Self::AllYears),
            _ => Err(DomainError::InvalidEnumValue {
                kind: "code scope",
                value: s.to_string(),
            }),
        }
    }
}

impl std::fmt::Display for CodeScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A report holding a sequence in the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeOwner {
    code: ReportCode,
    title: String,
}

impl CodeOwner {
    /// The owner's full code.
    #[must_use]
    pub const fn code(&self) -> ReportCode {
        self.code
    }

    /// The owner's report title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }
}

/// The set of sequences in use within a scope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CodeRegistry {
    year_scope: Option<CodeYear>,
    entries: BTreeMap<Sequence, Vec<CodeOwner>>,
}

impl CodeRegistry {
    /// Creates an empty registry for the given year scope.
    ///
    /// `None` means every year is in scope.
    #[must_use]
    pub const fn empty(year_scope: Option<CodeYear>) -> Self {
        Self {
            year_scope,
            entries: BTreeMap::new(),
        }
    }

    /// The year this registry covers, `None` for all years.
    #[must_use]
    pub const fn year_scope(&self) -> Option<CodeYear> {
        self.year_scope
    }

    /// Number of distinct sequences in use.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if no sequence is in use.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if any report in scope uses `sequence`.
    #[must_use]
    pub fn contains(&self, sequence: Sequence) -> bool {
        self.entries.contains_key(&sequence)
    }

    /// Sequences in use, ascending.
    pub fn sequences(&self) -> impl Iterator<Item = Sequence> + '_ {
        self.entries.keys().copied()
    }

    /// Returns the first owner of `sequence` other than `excluding`.
    #[must_use]
    pub fn owner_of(&self, sequence: Sequence, excluding: Option<ReportCode>) -> Option<&CodeOwner> {
        self.entries
            .get(&sequence)?
            .iter()
            .find(|owner| Some(owner.code) != excluding)
    }
}

/// Builds a registry snapshot from the given reports.
///
/// When `year_scope` is set, only reports whose code year matches are
/// recorded. Reports are otherwise taken as-is; the store already guarantees
/// they are unique per year.
#[must_use]
pub fn build_registry<'a, I>(reports: I, year_scope: Option<CodeYear>) -> CodeRegistry
where
    I: IntoIterator<Item = &'a WorkReport>,
{
    let mut registry: CodeRegistry = CodeRegistry::empty(year_scope);
    for report in reports {
        let code: ReportCode = report.code();
        if year_scope.is_some_and(|year| year != code.year()) {
            continue;
        }
        registry
            .entries
            .entry(code.sequence())
            .or_default()
            .push(CodeOwner {
                code,
                title: report.details().title.clone(),
            });
    }
    registry
}

/// Returns the smallest sequence in `1..=999` that is not in use.
///
/// # Errors
///
/// Returns `DomainError::CodesExhausted` when all 999 sequences are taken.
pub fn suggest_next(registry: &CodeRegistry) -> Result<Sequence, DomainError> {
    Sequence::all()
        .find(|sequence| !registry.contains(*sequence))
        .ok_or(DomainError::CodesExhausted {
            year: registry.year_scope(),
        })
}

/// Why a candidate code was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InvalidReason {
    /// The candidate does not match the code format.
    Malformed {
        /// Which part of the format was violated.
        reason: String,
    },
    /// The sequence is already owned by another report.
    Duplicate {
        /// Title of the report holding the sequence.
        conflicting_report_title: String,
    },
}

impl std::fmt::Display for InvalidReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Malformed { reason } => write!(f, "Invalid code format: {reason}"),
            Self::Duplicate {
                conflicting_report_title,
            } => write!(
                f,
                "Code is already used by report: {conflicting_report_title}"
            ),
        }
    }
}

/// Outcome of validating a candidate code against a registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum ValidationResult {
    /// The candidate is well-formed and free in the snapshot.
    Valid,
    /// The candidate was rejected.
    Invalid(InvalidReason),
}

impl ValidationResult {
    /// Returns true for `Valid`.
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Validates an operator-typed sequence (`"007"`) against a registry.
///
/// `excluding` is the code the edited report currently holds. Its own entry
/// is ignored so that saving a report unchanged never reports a duplicate.
#[must_use]
pub fn validate(
    candidate: &str,
    registry: &CodeRegistry,
    excluding: Option<ReportCode>,
) -> ValidationResult {
    match Sequence::from_str(candidate) {
        Ok(sequence) => availability(sequence, registry, excluding),
        Err(e) => ValidationResult::Invalid(malformed_reason(&e)),
    }
}

/// Validates a full code string (`"007/PEP82600/2025-SO"`) against a registry.
///
/// # Errors
///
/// Returns `DomainError::RegistryScopeMismatch` if the code's year is not
/// covered by the registry. Format violations are not errors; they are
/// reported as `Invalid(Malformed)`.
pub fn validate_code(
    full: &str,
    registry: &CodeRegistry,
    excluding: Option<ReportCode>,
) -> Result<ValidationResult, DomainError> {
    let code: ReportCode = match ReportCode::from_str(full) {
        Ok(code) => code,
        Err(e) => return Ok(ValidationResult::Invalid(malformed_reason(&e))),
    };
    if let Some(registry_year) = registry.year_scope().filter(|year| *year != code.year()) {
        return Err(DomainError::RegistryScopeMismatch {
            code,
            registry_year,
        });
    }
    Ok(availability(code.sequence(), registry, excluding))
}

/// Typed form of `validate` for a sequence that has already been parsed.
///
/// # Errors
///
/// Returns `DomainError::DuplicateCode` if another report owns `sequence`.
pub fn check_available(
    sequence: Sequence,
    registry: &CodeRegistry,
    excluding: Option<ReportCode>,
) -> Result<(), DomainError> {
    match registry.owner_of(sequence, excluding) {
        None => Ok(()),
        Some(owner) => Err(DomainError::DuplicateCode {
            sequence,
            year: registry.year_scope(),
            conflicting_report_title: owner.title().to_string(),
        }),
    }
}

fn availability(
    sequence: Sequence,
    registry: &CodeRegistry,
    excluding: Option<ReportCode>,
) -> ValidationResult {
    match registry.owner_of(sequence, excluding) {
        None => ValidationResult::Valid,
        Some(owner) => ValidationResult::Invalid(InvalidReason::Duplicate {
            conflicting_report_title: owner.title().to_string(),
        }),
    }
}

fn malformed_reason(error: &DomainError) -> InvalidReason {
    match error {
        DomainError::MalformedCode { reason, .. } => InvalidReason::Malformed {
            reason: (*reason).to_string(),
        },
        other => InvalidReason::Malformed {
            reason: other.to_string(),
        },
    }
}
