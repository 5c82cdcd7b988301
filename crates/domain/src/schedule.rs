// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Work schedule calendar.
//!
//! A report is scheduled on every day of `[start_date, end_date]`, both ends
//! included.

use crate::error::DomainError;
use crate::report::WorkReport;
use time::{Date, Duration, Month};

/// Default look-ahead for upcoming deadlines, in days.
pub const DEFAULT_DEADLINE_HORIZON_DAYS: i64 = 7;

/// One calendar day and the reports active on it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleDay<'a> {
    /// The day.
    pub date: Date,
    /// Reports whose work spans the day.
    pub reports: Vec<&'a WorkReport>,
}

/// Returns every day of the given month in order.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the year is out of range.
pub fn month_days(year: i32, month: Month) -> Result<Vec<Date>, DomainError> {
    let first: Date =
        Date::from_calendar_date(year, month, 1).map_err(|e| DomainError::DateParseError {
            date_string: format!("{year}-{:02}-01", u8::from(month)),
            error: e.to_string(),
        })?;

    let mut days: Vec<Date> = Vec::with_capacity(31);
    let mut day: Date = first;
    loop {
        days.push(day);
        match day.next_day() {
            Some(next) if next.month() == month => day = next,
            _ => break,
        }
    }
    Ok(days)
}

/// Returns the reports whose work spans `date`.
#[must_use]
pub fn reports_active_on(reports: &[WorkReport], date: Date) -> Vec<&WorkReport> {
    reports
        .iter()
        .filter(|report| report.details().is_active_on(date))
        .collect()
}

/// Builds the calendar for one month.
///
/// # Errors
///
/// Returns `DomainError::DateParseError` if the year is out of range.
pub fn month_schedule(
    reports: &[WorkReport],
    year: i32,
    month: Month,
) -> Result<Vec<ScheduleDay<'_>>, DomainError> {
    Ok(month_days(year, month)?
        .into_iter()
        .map(|date| ScheduleDay {
            date,
            reports: reports_active_on(reports, date),
        })
        .collect())
}

/// Returns unfinished reports due within `horizon_days` of `today`, soonest first.
///
/// Reports already past their end date are not included.
///
/// # Errors
///
/// Returns `DomainError::DateArithmeticOverflow` if the horizon leaves the
/// supported date range.
pub fn upcoming_deadlines(
    reports: &[WorkReport],
    today: Date,
    horizon_days: i64,
) -> Result<Vec<&WorkReport>, DomainError> {
    let horizon: Date = today
        .checked_add(Duration::days(horizon_days))
        .ok_or_else(|| DomainError::DateArithmeticOverflow {
            operation: format!("adding {horizon_days} days to {today}"),
        })?;

    let mut due: Vec<&WorkReport> = reports
        .iter()
        .filter(|report| {
            let details = report.details();
            !details.status.is_completed()
                && details.end_date >= today
                && details.end_date <= horizon
        })
        .collect();
    due.sort_by(|a, b| {
        a.details()
            .end_date
            .cmp(&b.details().end_date)
            .then_with(|| a.report_id().cmp(&b.report_id()))
    });
    Ok(due)
}
