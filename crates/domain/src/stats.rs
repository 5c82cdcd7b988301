// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Dashboard aggregates over a set of reports.

use crate::report::{ReportCategory, ReportStatus, RiskLevel, WorkReport};
use serde::Serialize;

/// Number of reports shown in the "recent" panel.
pub const RECENT_REPORT_COUNT: usize = 5;

/// Count of reports with a given status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusCount {
    /// The status.
    pub status: ReportStatus,
    /// Number of reports.
    pub count: usize,
}

/// Count of reports in a given category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    /// The category.
    pub category: ReportCategory,
    /// Number of reports.
    pub count: usize,
}

/// Count of reports at a given risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RiskCount {
    /// The risk level.
    pub risk_level: RiskLevel,
    /// Number of reports.
    pub count: usize,
}

/// Headline numbers and distributions for the dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    /// All reports.
    pub total: usize,
    /// Reports currently ongoing.
    pub active: usize,
    /// Reports completed.
    pub completed: usize,
    /// Reports delayed.
    pub delayed: usize,
    /// Reports still in planning.
    pub planning: usize,
    /// Mean progress, rounded to the nearest percent.
    pub average_progress: u8,
    /// Reports assessed as high risk.
    pub high_risk: usize,
    /// Workers across all reports.
    pub total_workers: u64,
    /// Safety incidents across all reports.
    pub total_safety_incidents: u64,
    /// Reports per status, every status listed.
    pub by_status: Vec<StatusCount>,
    /// Reports per category, every category listed.
    pub by_category: Vec<CategoryCount>,
    /// Reports per risk level, every level listed.
    pub by_risk: Vec<RiskCount>,
}

/// Computes dashboard statistics.
#[must_use]
pub fn compute_dashboard_stats(reports: &[WorkReport]) -> DashboardStats {
    let mut planning: usize = 0;
    let mut active: usize = 0;
    let mut completed: usize = 0;
    let mut delayed: usize = 0;
    let mut maintenance: usize = 0;
    let mut construction: usize = 0;
    let mut upgrade: usize = 0;
    let mut repair: usize = 0;
    let mut low: usize = 0;
    let mut medium: usize = 0;
    let mut high: usize = 0;
    let mut progress_sum: u64 = 0;
    let mut total_workers: u64 = 0;
    let mut total_safety_incidents: u64 = 0;

    for report in reports {
        let details = report.details();
        match details.status {
            ReportStatus::Planning => planning += 1,
            ReportStatus::Ongoing => active += 1,
            ReportStatus::Completed => completed += 1,
            ReportStatus::Delayed => delayed += 1,
        }
        match details.category {
            ReportCategory::Maintenance => maintenance += 1,
            ReportCategory::Construction => construction += 1,
            ReportCategory::Upgrade => upgrade += 1,
            ReportCategory::Repair => repair += 1,
        }
        match details.hsse.risk_level {
            RiskLevel::Low => low += 1,
            RiskLevel::Medium => medium += 1,
            RiskLevel::High => high += 1,
        }
        progress_sum += u64::from(details.progress);
        total_workers += u64::from(details.worker_count);
        total_safety_incidents += u64::from(details.hsse.safety_incidents);
    }

    DashboardStats {
        total: reports.len(),
        active,
        completed,
        delayed,
        planning,
        average_progress: rounded_mean(progress_sum, reports.len()),
        high_risk: high,
        total_workers,
        total_safety_incidents,
        by_status: vec![
            StatusCount {
                status: ReportStatus::Planning,
                count: planning,
            },
            StatusCount {
                status: ReportStatus::Ongoing,
                count: active,
            },
            StatusCount {
                status: ReportStatus::Completed,
                count: completed,
            },
            StatusCount {
                status: ReportStatus::Delayed,
                count: delayed,
            },
        ],
        by_category: vec![
            CategoryCount {
                category: ReportCategory::Maintenance,
                count: maintenance,
            },
            CategoryCount {
                category: ReportCategory::Construction,
                count: construction,
            },
            CategoryCount {
                category: ReportCategory::Upgrade,
                count: upgrade,
            },
            CategoryCount {
                category: ReportCategory::Repair,
                count: repair,
            },
        ],
        by_risk: vec![
            RiskCount {
                risk_level: RiskLevel::Low,
                count: low,
            },
            RiskCount {
                risk_level: RiskLevel::Medium,
                count: medium,
            },
            RiskCount {
                risk_level: RiskLevel::High,
                count: high,
            },
        ],
    }
}

/// Returns the most recently created reports, newest first.
#[must_use]
pub fn recent_reports(reports: &[WorkReport], limit: usize) -> Vec<&WorkReport> {
    let mut sorted: Vec<&WorkReport> = reports.iter().collect();
    sorted.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.report_id().cmp(&a.report_id()))
    });
    sorted.truncate(limit);
    sorted
}

fn rounded_mean(sum: u64, count: usize) -> u8 {
    let Ok(count) = u64::try_from(count) else {
        return 0;
    };
    if count == 0 {
        return 0;
    }
    // Progress never exceeds 100, so the mean fits.
    u8::try_from((sum + count / 2) / count).unwrap_or(100)
}
