// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The report store seen from the allocator.
//!
//! The store is the authority on uniqueness. Its unique index on
//! `(code_year, code_sequence)` rejects a duplicate commit with
//! `StoreError::Conflict` no matter what the allocator's snapshot said.

use async_trait::async_trait;
use pep_report_domain::{CodeYear, NewReport, ReportCode, ReportPatch, WorkReport};
use thiserror::Error;

/// Errors a report store can return.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The code is already held by another report.
    #[error("code {code} is already taken")]
    Conflict {
        /// The rejected code.
        code: ReportCode,
    },
    /// No report has this identifier.
    #[error("report {0} not found")]
    NotFound(i64),
    /// Any other backend failure.
    #[error("{0}")]
    Backend(String),
}

/// Persistent storage for work reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Lists reports, newest first, optionally restricted to one code year.
    async fn list_reports(&self, year: Option<CodeYear>) -> Result<Vec<WorkReport>, StoreError>;

    /// Fetches one report.
    async fn get_report(&self, report_id: i64) -> Result<WorkReport, StoreError>;

    /// Commits a new report under `code`.
    async fn create_report(
        &self,
        code: ReportCode,
        report: &NewReport,
    ) -> Result<WorkReport, StoreError>;

    /// Applies `patch` to an existing report.
    async fn update_report(
        &self,
        report_id: i64,
        patch: &ReportPatch,
    ) -> Result<WorkReport, StoreError>;
}
