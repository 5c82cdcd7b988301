// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Report code allocation protocol.
//!
//! Suggestion and validation read a registry snapshot without locking. The
//! commit is guarded only by the store's unique index. When the store rejects
//! a commit the allocator takes a fresh snapshot and tries again, up to
//! `AllocationPolicy::max_attempts` times.
//!
//! Automatic allocation simply picks the next free sequence from the new
//! snapshot. A manually chosen code is re-validated against the new
//! snapshot, which turns the conflict into a `DuplicateCode` naming the
//! report that won, so the operator can pick another code.

use crate::error::CoreError;
use crate::store::{ReportStore, StoreError};
use pep_report_domain::{
    CodeRegistry, CodeScope, CodeYear, DomainError, NewReport, ReportCode, ReportPatch, Sequence,
    ValidationResult, WorkReport, build_registry, check_available, suggest_next, validate,
    validate_code, validate_report_details,
};
use std::str::FromStr;
use tracing::{debug, info, warn};

/// Attempts made before an allocation is abandoned.
pub const DEFAULT_MAX_ATTEMPTS: u8 = 5;

/// How codes are scoped and how hard the allocator retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllocationPolicy {
    /// Uniqueness scope used for snapshots.
    pub scope: CodeScope,
    /// Maximum commit attempts, at least 1.
    pub max_attempts: u8,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            scope: CodeScope::PerYear,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// How the code for a new report is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRequest {
    /// Use the smallest free sequence in `year`.
    Auto {
        /// Code year.
        year: CodeYear,
    },
    /// Use exactly this code.
    Manual(ReportCode),
}

impl CodeRequest {
    /// The code year the request targets.
    #[must_use]
    pub const fn year(&self) -> CodeYear {
        match self {
            Self::Auto { year } => *year,
            Self::Manual(code) => code.year(),
        }
    }
}

/// A committed report and the number of attempts it took.
#[derive(Debug, Clone, PartialEq)]
pub struct Allocation {
    /// The persisted report.
    pub report: WorkReport,
    /// Commit attempts, 1 when there was no conflict.
    pub attempts: u8,
}

/// Takes a fresh registry snapshot for `year` under `scope`.
///
/// # Errors
///
/// Returns an error if the store cannot list reports.
pub async fn snapshot<S>(store: &S, year: CodeYear, scope: CodeScope) -> Result<CodeRegistry, CoreError>
where
    S: ReportStore + ?Sized,
{
    let year_scope: Option<CodeYear> = scope.registry_year(year);
    let reports: Vec<WorkReport> = store.list_reports(year_scope).await?;
    let registry: CodeRegistry = build_registry(&reports, year_scope);
    debug!(year = %year, scope = %scope, in_use = registry.len(), "Took code registry snapshot");
    Ok(registry)
}

/// Suggests the next free code for `year`.
///
/// # Errors
///
/// Returns `DomainViolation(CodesExhausted)` when the year is full, or a
/// store error.
pub async fn suggest_code<S>(
    store: &S,
    year: CodeYear,
    scope: CodeScope,
) -> Result<ReportCode, CoreError>
where
    S: ReportStore + ?Sized,
{
    let registry: CodeRegistry = snapshot(store, year, scope).await?;
    let sequence: Sequence = suggest_next(&registry)?;
    Ok(ReportCode::new(sequence, year))
}

/// Validates an operator-typed sequence for `year`.
///
/// `excluding` is the code currently held by the report being edited.
///
/// # Errors
///
/// Returns a store error if the snapshot cannot be taken. A malformed or
/// duplicate candidate is not an error; it is reported in the result.
pub async fn check_candidate<S>(
    store: &S,
    candidate: &str,
    year: CodeYear,
    excluding: Option<ReportCode>,
    scope: CodeScope,
) -> Result<ValidationResult, CoreError>
where
    S: ReportStore + ?Sized,
{
    let format_only: ValidationResult = validate(candidate, &CodeRegistry::empty(None), None);
    if !format_only.is_valid() {
        return Ok(format_only);
    }
    let registry: CodeRegistry = snapshot(store, year, scope).await?;
    Ok(validate(candidate, &registry, excluding))
}

/// Validates a full code string (`"007/PEP82600/2025-SO"`), taking the
/// registry year from the code itself.
///
/// # Errors
///
/// Returns a store error if the snapshot cannot be taken. A malformed or
/// duplicate code is reported in the result.
pub async fn check_full_code<S>(
    store: &S,
    full: &str,
    excluding: Option<ReportCode>,
    scope: CodeScope,
) -> Result<ValidationResult, CoreError>
where
    S: ReportStore + ?Sized,
{
    let code: ReportCode = match ReportCode::from_str(full) {
        Ok(code) => code,
        Err(_) => return Ok(validate_code(full, &CodeRegistry::empty(None), None)?),
    };
    let registry: CodeRegistry = snapshot(store, code.year(), scope).await?;
    Ok(validate_code(full, &registry, excluding)?)
}

/// Commits `report` under `code` once, without retrying.
///
/// # Errors
///
/// Returns `StoreConflict` if the store rejects the code, or another store
/// error.
pub async fn try_commit<S>(
    store: &S,
    code: ReportCode,
    report: &NewReport,
) -> Result<WorkReport, CoreError>
where
    S: ReportStore + ?Sized,
{
    store
        .create_report(code, report)
        .await
        .map_err(CoreError::from)
}

/// Creates a report, allocating or validating its code and retrying on
/// store conflicts.
///
/// # Arguments
///
/// * `store` - The report store
/// * `request` - Automatic allocation or an explicit code
/// * `report` - The report content; validated before any code is chosen
/// * `policy` - Scope and retry bound
///
/// # Errors
///
/// Returns an error if:
/// - A report field is invalid
/// - The year has no free sequence (`CodesExhausted`)
/// - A manual code is taken (`DuplicateCode`)
/// - Every attempt conflicted (`AllocationFailed`)
/// - The store failed
pub async fn create_with_allocation<S>(
    store: &S,
    request: CodeRequest,
    report: &NewReport,
    policy: AllocationPolicy,
) -> Result<Allocation, CoreError>
where
    S: ReportStore + ?Sized,
{
    validate_report_details(&report.details)?;

    let max_attempts: u8 = policy.max_attempts.max(1);
    let mut attempts: u8 = 0;
    loop {
        attempts += 1;
        let registry: CodeRegistry = snapshot(store, request.year(), policy.scope).await?;
        let code: ReportCode = match request {
            CodeRequest::Auto { year } => ReportCode::new(suggest_next(&registry)?, year),
            CodeRequest::Manual(code) => {
                check_available(code.sequence(), &registry, None)?;
                code
            }
        };

        match store.create_report(code, report).await {
            Ok(created) => {
                info!(
                    report_id = created.report_id(),
                    code = %code,
                    attempts,
                    "Committed report"
                );
                return Ok(Allocation {
                    report: created,
                    attempts,
                });
            }
            Err(StoreError::Conflict { code }) => {
                warn!(code = %code, attempt = attempts, max_attempts, "Store rejected report code");
                if attempts >= max_attempts {
                    return Err(CoreError::AllocationFailed { attempts });
                }
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Applies `patch` to a report, validating a code change with self-exclusion.
///
/// Edits are not retried: a conflict is reported back to the operator, as a
/// `DuplicateCode` when a fresh snapshot explains it.
///
/// # Errors
///
/// Returns an error if:
/// - The report does not exist
/// - The patched fields are invalid
/// - The new code is held by another report
/// - The store rejected the commit
pub async fn update_with_validation<S>(
    store: &S,
    report_id: i64,
    patch: &ReportPatch,
    scope: CodeScope,
) -> Result<WorkReport, CoreError>
where
    S: ReportStore + ?Sized,
{
    // Completion forces progress to 100, so an out-of-range value is caught first.
    if let Some(progress) = patch.progress.filter(|progress| *progress > 100) {
        return Err(DomainError::InvalidProgress(progress).into());
    }

    let current: WorkReport = store.get_report(report_id).await?;
    let (code, details) = patch.apply_to(&current);
    validate_report_details(&details)?;

    if patch.code.is_some() {
        let registry: CodeRegistry = snapshot(store, code.year(), scope).await?;
        check_available(code.sequence(), &registry, Some(current.code()))?;
    }

    match store.update_report(report_id, patch).await {
        Ok(updated) => {
            info!(report_id, code = %updated.code(), "Updated report");
            Ok(updated)
        }
        Err(StoreError::Conflict { code }) => {
            warn!(report_id, code = %code, "Store rejected edited report code");
            let registry: CodeRegistry = snapshot(store, code.year(), scope).await?;
            check_available(code.sequence(), &registry, Some(current.code()))?;
            Err(CoreError::StoreConflict { code })
        }
        Err(e) => Err(e.into()),
    }
}
