// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use crate::{ReportStore, StoreError};
use async_trait::async_trait;
use pep_report_domain::{
    CodeYear, HsseData, Location, NewReport, ReportCategory, ReportCode, ReportDetails,
    ReportPatch, ReportStatus, Sequence, WorkReport,
};
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;
use time::OffsetDateTime;
use time::macros::date;
use tokio::sync::Mutex;

pub fn year(value: u16) -> CodeYear {
    CodeYear::new(value).unwrap()
}

pub fn code(sequence: u16, year_value: u16) -> ReportCode {
    ReportCode::new(Sequence::new(sequence).unwrap(), year(year_value))
}

pub fn create_test_new_report(title: &str) -> NewReport {
    NewReport {
        details: ReportDetails {
            title: title.to_string(),
            description: String::from("Inspect and repair the flowline"),
            category: ReportCategory::Repair,
            start_date: date!(2025 - 05 - 01),
            end_date: date!(2025 - 05 - 03),
            status: ReportStatus::Planning,
            progress: 0,
            worker_count: 2,
            responsible_persons: vec![String::from("Siti Rahma")],
            location: Location::named("Well PMB-12"),
            hsse: HsseData::default(),
            photos: Vec::new(),
        },
        created_by: 1,
    }
}

/// In-memory store enforcing the `(year, sequence)` unique index.
///
/// `stale_lists` makes the next N listings return nothing, which stands in
/// for a snapshot taken just before a concurrent commit.
#[derive(Default)]
pub struct MemoryStore {
    reports: Mutex<Vec<WorkReport>>,
    next_id: AtomicI64,
    pub list_calls: AtomicUsize,
    pub create_calls: AtomicUsize,
    pub stale_lists: AtomicUsize,
    pub list_delay: Duration,
}

impl MemoryStore {
    pub fn with_delay(list_delay: Duration) -> Self {
        Self {
            list_delay,
            ..Self::default()
        }
    }

    pub async fn seed(&self, sequence: u16, year_value: u16, title: &str) -> WorkReport {
        self.create_report(code(sequence, year_value), &create_test_new_report(title))
            .await
            .unwrap()
    }

    pub fn make_stale(&self, listings: usize) {
        self.stale_lists.store(listings, Ordering::SeqCst);
    }

    pub fn list_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.reports.lock().await.len()
    }
}

#[async_trait]
impl ReportStore for MemoryStore {
    async fn list_reports(&self, year: Option<CodeYear>) -> Result<Vec<WorkReport>, StoreError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if !self.list_delay.is_zero() {
            tokio::time::sleep(self.list_delay).await;
        }
        let stale: bool = self
            .stale_lists
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stale {
            return Ok(Vec::new());
        }
        let reports = self.reports.lock().await;
        Ok(reports
            .iter()
            .rev()
            .filter(|r| year.is_none_or(|y| r.code().year() == y))
            .cloned()
            .collect())
    }

    async fn get_report(&self, report_id: i64) -> Result<WorkReport, StoreError> {
        self.reports
            .lock()
            .await
            .iter()
            .find(|r| r.report_id() == report_id)
            .cloned()
            .ok_or(StoreError::NotFound(report_id))
    }

    async fn create_report(
        &self,
        code: ReportCode,
        report: &NewReport,
    ) -> Result<WorkReport, StoreError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        let mut reports = self.reports.lock().await;
        if reports.iter().any(|r| r.code() == code) {
            return Err(StoreError::Conflict { code });
        }
        let id: i64 = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let now: OffsetDateTime = OffsetDateTime::now_utc();
        let created: WorkReport = WorkReport::new(
            id,
            code,
            report.details.clone().normalized(),
            report.created_by,
            now,
            now,
        );
        reports.push(created.clone());
        Ok(created)
    }

    async fn update_report(
        &self,
        report_id: i64,
        patch: &ReportPatch,
    ) -> Result<WorkReport, StoreError> {
        let mut reports = self.reports.lock().await;
        let index: usize = reports
            .iter()
            .position(|r| r.report_id() == report_id)
            .ok_or(StoreError::NotFound(report_id))?;
        let current: WorkReport = reports[index].clone();
        let (code, details) = patch.apply_to(&current);
        if reports
            .iter()
            .any(|r| r.report_id() != report_id && r.code() == code)
        {
            return Err(StoreError::Conflict { code });
        }
        let updated: WorkReport = WorkReport::new(
            report_id,
            code,
            details,
            current.created_by(),
            current.created_at(),
            OffsetDateTime::now_utc(),
        );
        reports[index] = updated.clone();
        Ok(updated)
    }
}
