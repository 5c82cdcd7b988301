// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all,
    clippy::suspicious,
    clippy::complexity,
    clippy::perf,
    clippy::unwrap_used,
    clippy::expect_used
)]

mod code;
mod error;
mod filter;
mod notification;
mod registry;
mod report;
mod schedule;
mod settings;
mod stats;
mod validation;

#[cfg(test)]
mod tests;

pub use code::{CodeYear, FACILITY, MAX_SEQUENCE, MIN_SEQUENCE, ReportCode, SUFFIX, Sequence};
pub use registry::{
    CodeOwner, CodeRegistry, CodeScope, InvalidReason, ValidationResult, build_registry,
    check_available, suggest_next, validate, validate_code,
};

// Re-export public types
pub use error::DomainError;
pub use filter::{DateRange, ReportFilter, filter_reports};
pub use notification::NotificationKind;
pub use report::{
    COMPLETED_PROGRESS, HsseData, Location, NewReport, ReportCategory, ReportDetails, ReportPatch,
    ReportStatus, RiskLevel, WeatherCondition, WorkReport,
};
pub use schedule::{
    DEFAULT_DEADLINE_HORIZON_DAYS, ScheduleDay, month_days, month_schedule, reports_active_on,
    upcoming_deadlines,
};
pub use settings::{
    Currency, DateFormat, Language, NotificationPreferences, PASSWORD_EXPIRY_RANGE,
    SESSION_TIMEOUT_RANGE, SecuritySettings, Settings, SystemSettings, Timezone,
};
pub use stats::{
    CategoryCount, DashboardStats, RECENT_REPORT_COUNT, RiskCount, StatusCount,
    compute_dashboard_stats, recent_reports,
};
pub use validation::{
    MIN_DESCRIPTION_LEN, format_date, parse_date, validate_location, validate_report_details,
};
