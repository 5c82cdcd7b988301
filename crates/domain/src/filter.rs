// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Report list filtering.
//!
//! Filters are applied to the store's listing in memory. The listing is
//! already ordered newest first and filtering preserves that order.

use crate::code::CodeYear;
use crate::error::DomainError;
use crate::report::{ReportCategory, ReportStatus, WorkReport};
use time::{Date, Duration, OffsetDateTime};

/// Creation-date window for a report listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DateRange {
    /// No restriction
    #[default]
    All,
    /// Created within the last 7 days
    Last7Days,
    /// Created within the last 30 days
    Last30Days,
    /// Created on a day in `[start, end]`
    Custom {
        /// First day included.
        start: Date,
        /// Last day included.
        end: Date,
    },
}

impl DateRange {
    /// Builds a range from its wire name and optional custom bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is unknown, if `custom` is missing a
    /// bound, or if the custom bounds are reversed.
    pub fn from_parts(
        kind: &str,
        start: Option<Date>,
        end: Option<Date>,
    ) -> Result<Self, DomainError> {
        match kind {
            "all" => Ok(Self::All),
            "last7" => Ok(Self::Last7Days),
            "last30" => Ok(Self::Last30Days),
            "custom" => match (start, end) {
                (Some(start), Some(end)) if start <= end => Ok(Self::Custom { start, end }),
                (Some(start), Some(end)) => Err(DomainError::InvalidDateRange {
                    start_date: start,
                    end_date: end,
                }),
                _ => Err(DomainError::InvalidEnumValue {
                    kind: "date range",
                    value: String::from("custom range requires start and end dates"),
                }),
            },
            _ => Err(DomainError::InvalidEnumValue {
                kind: "date range",
                value: kind.to_string(),
            }),
        }
    }

    /// Returns true if a report created at `created_at` falls in the range.
    #[must_use]
    pub fn contains(&self, created_at: OffsetDateTime, now: OffsetDateTime) -> bool {
        match self {
            Self::All => true,
            Self::Last7Days => created_at >= now - Duration::days(7),
            Self::Last30Days => created_at >= now - Duration::days(30),
            Self::Custom { start, end } => {
                let day: Date = created_at.date();
                *start <= day && day <= *end
            }
        }
    }
}

/// Criteria for listing and exporting reports.
///
/// Empty status or category sets mean "any".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportFilter {
    /// Case-insensitive text matched against title, code and location name.
    pub search: Option<String>,
    /// Statuses to include.
    pub statuses: Vec<ReportStatus>,
    /// Categories to include.
    pub categories: Vec<ReportCategory>,
    /// Creation-date window.
    pub date_range: DateRange,
    /// Restrict to a single code year.
    pub code_year: Option<CodeYear>,
}

impl ReportFilter {
    /// Returns true if `report` satisfies every criterion.
    #[must_use]
    pub fn matches(&self, report: &WorkReport, now: OffsetDateTime) -> bool {
        if self
            .code_year
            .is_some_and(|year| report.code().year() != year)
        {
            return false;
        }
        if !self.statuses.is_empty() && !self.statuses.contains(&report.details().status) {
            return false;
        }
        if !self.categories.is_empty() && !self.categories.contains(&report.details().category) {
            return false;
        }
        if !self.date_range.contains(report.created_at(), now) {
            return false;
        }
        self.matches_search(report)
    }

    fn matches_search(&self, report: &WorkReport) -> bool {
        let Some(term) = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
        else {
            return true;
        };
        let term: String = term.to_lowercase();
        let details = report.details();
        details.title.to_lowercase().contains(&term)
            || report.code().to_string().to_lowercase().contains(&term)
            || details.location.name.to_lowercase().contains(&term)
    }
}

/// Returns the reports matching `filter`, preserving input order.
#[must_use]
pub fn filter_reports<'a>(
    reports: &'a [WorkReport],
    filter: &ReportFilter,
    now: OffsetDateTime,
) -> Vec<&'a WorkReport> {
    reports
        .iter()
        .filter(|report| filter.matches(report, now))
        .collect()
}
