// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! The database-backed `ReportStore` used by the allocation protocol.
//!
//! The persistence mutex is held for one store call at a time, never across
//! a whole allocation, so concurrent allocations interleave exactly as they
//! would against a shared database. The unique index decides between them.

use async_trait::async_trait;
use pep_report::{ReportStore, StoreError};
use pep_report_domain::{CodeYear, NewReport, ReportCode, ReportPatch, WorkReport};
use pep_report_persistence::{Persistence, PersistenceError, ReportRecord};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::error;

/// Adapts the shared persistence layer to the `ReportStore` trait.
#[derive(Clone)]
pub struct PersistenceStore {
    persistence: Arc<Mutex<Persistence>>,
}

impl PersistenceStore {
    /// Wraps the shared persistence layer.
    #[must_use]
    pub const fn new(persistence: Arc<Mutex<Persistence>>) -> Self {
        Self { persistence }
    }

    /// The shared persistence layer.
    #[must_use]
    pub const fn persistence(&self) -> &Arc<Mutex<Persistence>> {
        &self.persistence
    }
}

fn to_store_error(err: PersistenceError) -> StoreError {
    match err {
        PersistenceError::ReportNotFound(id) => StoreError::NotFound(id),
        _ => {
            error!(error = %err, "Report store failure");
            StoreError::Backend(err.to_string())
        }
    }
}

/// Maps a unique-index rejection of `code` to `StoreError::Conflict`.
fn conflict_or(code: ReportCode) -> impl FnOnce(PersistenceError) -> StoreError {
    move |err| match err {
        PersistenceError::DuplicateReportCode { .. } => StoreError::Conflict { code },
        other => to_store_error(other),
    }
}

#[async_trait]
impl ReportStore for PersistenceStore {
    async fn list_reports(&self, year: Option<CodeYear>) -> Result<Vec<WorkReport>, StoreError> {
        let records: Vec<ReportRecord> = self
            .persistence
            .lock()
            .await
            .list_work_reports(year)
            .map_err(to_store_error)?;
        Ok(records.into_iter().map(|record| record.report).collect())
    }

    async fn get_report(&self, report_id: i64) -> Result<WorkReport, StoreError> {
        self.persistence
            .lock()
            .await
            .get_work_report(report_id)
            .map_err(to_store_error)?
            .map(|record| record.report)
            .ok_or(StoreError::NotFound(report_id))
    }

    async fn create_report(
        &self,
        code: ReportCode,
        report: &NewReport,
    ) -> Result<WorkReport, StoreError> {
        self.persistence
            .lock()
            .await
            .create_work_report(code, report)
            .map(|record| record.report)
            .map_err(conflict_or(code))
    }

    async fn update_report(
        &self,
        report_id: i64,
        patch: &ReportPatch,
    ) -> Result<WorkReport, StoreError> {
        let mut persistence = self.persistence.lock().await;
        let current: WorkReport = persistence
            .get_work_report(report_id)
            .map_err(to_store_error)?
            .map(|record| record.report)
            .ok_or(StoreError::NotFound(report_id))?;
        let (code, details) = patch.apply_to(&current);
        persistence
            .update_work_report(report_id, code, &details)
            .map(|record| record.report)
            .map_err(conflict_or(code))
    }
}
