// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API request and response data transfer objects.
//!
//! Dates travel as `YYYY-MM-DD` strings and timestamps as RFC 3339 strings.
//! Closed enumerations travel as their snake case names.

use pep_report_domain::{
    DashboardStats, InvalidReason, NotificationKind, ReportCategory, ReportStatus, RiskLevel,
    ValidationResult, WeatherCondition, WorkReport, format_date,
};
use pep_report_persistence::{NotificationData, OperatorData, ReportRecord};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::error::{ApiError, translate_domain_error};

// ========================================================================
// Capabilities
// ========================================================================

/// Whether an action is permitted. Serializes as a boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    /// The action is permitted.
    Allowed,
    /// The action is not permitted.
    Denied,
}

impl Capability {
    /// Returns true if the capability is allowed.
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allowed)
    }

    /// Creates a capability from a boolean value.
    #[must_use]
    pub const fn from_bool(value: bool) -> Self {
        if value { Self::Allowed } else { Self::Denied }
    }
}

impl Serialize for Capability {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bool(self.is_allowed())
    }
}

impl<'de> Deserialize<'de> for Capability {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let allowed: bool = bool::deserialize(deserializer)?;
        Ok(Self::from_bool(allowed))
    }
}

/// What an operator may do across the system.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalCapabilities {
    /// Create, disable, enable, delete and reset operators.
    pub can_manage_operators: Capability,
    /// Create and edit work reports.
    pub can_create_reports: Capability,
    /// Delete work reports.
    pub can_delete_reports: Capability,
    /// Export work reports.
    pub can_export_reports: Capability,
    /// Read system settings.
    pub can_read_settings: Capability,
    /// Change system settings.
    pub can_write_settings: Capability,
}

/// What the caller may do to one specific operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorCapabilities {
    /// Whether this operator can be disabled.
    pub can_disable: Capability,
    /// Whether this operator can be deleted.
    pub can_delete: Capability,
    /// Whether this operator's password can be reset.
    pub can_reset_password: Capability,
}

// ========================================================================
// Authentication and operators
// ========================================================================

/// Login credentials.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LoginRequest {
    /// The operator's email.
    pub email: String,
    /// The operator's password.
    pub password: String,
}

/// A successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for subsequent requests.
    pub session_token: String,
    /// The operator's ID.
    pub operator_id: i64,
    /// The operator's email.
    pub email: String,
    /// The operator's display name.
    pub display_name: String,
    /// The operator's role.
    pub role: String,
    /// When the session expires (RFC 3339).
    pub expires_at: String,
}

/// The calling operator and their global capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhoAmIResponse {
    /// The operator.
    pub operator: OperatorInfo,
    /// Global capabilities.
    pub capabilities: GlobalCapabilities,
    /// Unread notifications.
    pub unread_notifications: i64,
}

/// An operator as shown to clients. Never includes the password hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorInfo {
    pub operator_id: i64,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub phone: Option<String>,
    pub department: Option<String>,
    pub position: Option<String>,
    pub is_disabled: bool,
    pub created_at: String,
    pub disabled_at: Option<String>,
    pub last_login_at: Option<String>,
}

impl From<&OperatorData> for OperatorInfo {
    fn from(operator: &OperatorData) -> Self {
        Self {
            operator_id: operator.operator_id,
            email: operator.email.clone(),
            display_name: operator.display_name.clone(),
            role: operator.role.clone(),
            phone: operator.phone.clone(),
            department: operator.department.clone(),
            position: operator.position.clone(),
            is_disabled: operator.is_disabled,
            created_at: operator.created_at.clone(),
            disabled_at: operator.disabled_at.clone(),
            last_login_at: operator.last_login_at.clone(),
        }
    }
}

/// An operator together with what the caller may do to them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorListEntry {
    /// The operator.
    #[serde(flatten)]
    pub operator: OperatorInfo,
    /// Capabilities of the caller on this operator.
    pub capabilities: OperatorCapabilities,
}

/// Response listing every operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListOperatorsResponse {
    /// Operators ordered by email.
    pub operators: Vec<OperatorListEntry>,
}

/// Request to create an operator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreateOperatorRequest {
    pub email: String,
    pub display_name: String,
    /// `admin`, `supervisor` or `worker`.
    pub role: String,
    pub password: String,
    pub password_confirmation: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

/// Response for a created operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateOperatorResponse {
    pub operator_id: i64,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub message: String,
}

/// Request to create the first admin while no operator exists.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreateFirstAdminRequest {
    pub email: String,
    pub display_name: String,
    pub password: String,
    pub password_confirmation: String,
}

/// Whether the system is still waiting for its first admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapStatusResponse {
    /// True while no operator exists.
    pub is_bootstrap_mode: bool,
}

/// Request to change the caller's own password.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub new_password_confirmation: String,
}

/// Request for an admin to set another operator's password.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ResetPasswordRequest {
    pub new_password: String,
    pub new_password_confirmation: String,
}

/// Request to update the caller's own profile.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct UpdateProfileRequest {
    pub display_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub position: Option<String>,
}

/// A plain acknowledgement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// A human-readable description of what happened.
    pub message: String,
}

impl MessageResponse {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ========================================================================
// Work reports
// ========================================================================

/// Location as sent and received by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationDto {
    pub name: String,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
}

/// Request to create a work report.
///
/// Without `code_sequence` the next free sequence of `code_year` is
/// allocated. `code_year` defaults to the current year.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CreateReportRequest {
    /// Operator-typed sequence such as `"007"`.
    #[serde(default)]
    pub code_sequence: Option<String>,
    #[serde(default)]
    pub code_year: Option<u16>,
    pub title: String,
    pub description: String,
    pub category: String,
    pub start_date: String,
    pub end_date: String,
    /// Defaults to `planning`.
    #[serde(default)]
    pub status: Option<String>,
    /// Defaults to 0.
    #[serde(default)]
    pub progress: Option<u8>,
    pub worker_count: u32,
    pub responsible_persons: Vec<String>,
    pub location: LocationDto,
    pub risk_level: String,
    pub weather_condition: String,
    #[serde(default)]
    pub safety_incidents: u32,
    #[serde(default)]
    pub photos: Vec<String>,
}

/// Request to edit a work report. Absent fields are left unchanged.
///
/// A new `code_sequence` keeps the report's current code year.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct UpdateReportRequest {
    pub code_sequence: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub status: Option<String>,
    pub progress: Option<u8>,
    pub worker_count: Option<u32>,
    pub responsible_persons: Option<Vec<String>>,
    pub location: Option<LocationDto>,
    pub risk_level: Option<String>,
    pub weather_condition: Option<String>,
    pub safety_incidents: Option<u32>,
    pub photos: Option<Vec<String>>,
}

/// A work report as returned to clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportResponse {
    pub report_id: i64,
    /// Full code, e.g. `007/PEP82600/2025-SO`.
    pub code: String,
    pub code_year: u16,
    pub code_sequence: u16,
    pub title: String,
    pub description: String,
    pub category: ReportCategory,
    pub start_date: String,
    pub end_date: String,
    pub status: ReportStatus,
    pub progress: u8,
    pub worker_count: u32,
    pub responsible_persons: Vec<String>,
    pub location: LocationDto,
    pub risk_level: RiskLevel,
    pub weather_condition: WeatherCondition,
    pub safety_incidents: u32,
    pub photos: Vec<String>,
    pub created_by: i64,
    pub creator_name: String,
    pub creator_email: String,
    pub created_at: String,
    pub updated_at: String,
}

pub(crate) fn format_timestamp(value: OffsetDateTime) -> Result<String, ApiError> {
    value.format(&Rfc3339).map_err(|e| ApiError::Internal {
        message: format!("Failed to format timestamp: {e}"),
    })
}

impl ReportResponse {
    /// Builds the response for a stored report.
    ///
    /// # Errors
    ///
    /// Returns an error if a date cannot be formatted.
    pub fn from_record(record: &ReportRecord) -> Result<Self, ApiError> {
        let report: &WorkReport = &record.report;
        let details = report.details();
        Ok(Self {
            report_id: report.report_id(),
            code: report.code().to_string(),
            code_year: report.code().year().value(),
            code_sequence: report.code().sequence().value(),
            title: details.title.clone(),
            description: details.description.clone(),
            category: details.category,
            start_date: format_date(details.start_date).map_err(translate_domain_error)?,
            end_date: format_date(details.end_date).map_err(translate_domain_error)?,
            status: details.status,
            progress: details.progress,
            worker_count: details.worker_count,
            responsible_persons: details.responsible_persons.clone(),
            location: LocationDto {
                name: details.location.name.clone(),
                latitude: details.location.latitude,
                longitude: details.location.longitude,
            },
            risk_level: details.hsse.risk_level,
            weather_condition: details.hsse.weather_condition,
            safety_incidents: details.hsse.safety_incidents,
            photos: details.photos.clone(),
            created_by: report.created_by(),
            creator_name: record.creator_name.clone(),
            creator_email: record.creator_email.clone(),
            created_at: format_timestamp(report.created_at())?,
            updated_at: format_timestamp(report.updated_at())?,
        })
    }
}

/// Response for a created report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateReportResponse {
    /// The stored report.
    pub report: ReportResponse,
    /// Commit attempts the allocation took.
    pub attempts: u8,
}

/// Query string for listing and exporting reports.
///
/// `status` and `category` accept comma-separated lists. `date_range` is
/// `all`, `last7`, `last30` or `custom` (with `start_date` and `end_date`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ListReportsQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub date_range: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub code_year: Option<u16>,
}

/// Response listing reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListReportsResponse {
    /// Matching reports, newest first.
    pub reports: Vec<ReportResponse>,
    /// Number of matching reports.
    pub total: usize,
}

/// The next free code for a year.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestCodeResponse {
    /// Full code.
    pub code: String,
    /// Three-digit sequence to prefill the code field with.
    pub sequence: String,
    pub year: u16,
}

/// Query string for validating a typed sequence or a full code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ValidateCodeQuery {
    /// The typed sequence, e.g. `"007"`.
    #[serde(default)]
    pub sequence: String,
    /// A full code, e.g. `"007/PEP82600/2025-SO"`. Takes precedence over
    /// `sequence` and `year`.
    #[serde(default)]
    pub code: Option<String>,
    /// Defaults to the current year, or the edited report's year.
    #[serde(default)]
    pub year: Option<u16>,
    /// The report being edited, whose own code is not a duplicate.
    #[serde(default)]
    pub excluding_report_id: Option<i64>,
}

/// Outcome of validating a typed sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateCodeResponse {
    /// The candidate as typed.
    pub candidate: String,
    /// The full code, when the candidate is valid.
    pub code: Option<String>,
    pub valid: bool,
    /// Why the candidate was rejected.
    pub reason: Option<InvalidReason>,
    /// Human-readable rejection message.
    pub message: Option<String>,
}

impl ValidateCodeResponse {
    pub(crate) fn new(candidate: &str, code: Option<String>, result: ValidationResult) -> Self {
        match result {
            ValidationResult::Valid => Self {
                candidate: candidate.to_string(),
                code,
                valid: true,
                reason: None,
                message: None,
            },
            ValidationResult::Invalid(reason) => Self {
                candidate: candidate.to_string(),
                code: None,
                valid: false,
                message: Some(reason.to_string()),
                reason: Some(reason),
            },
        }
    }
}

// ========================================================================
// Dashboard, schedule and map
// ========================================================================

/// A compact view of a report for dashboards and calendars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub report_id: i64,
    pub code: String,
    pub title: String,
    pub category: ReportCategory,
    pub status: ReportStatus,
    pub progress: u8,
    pub risk_level: RiskLevel,
    pub location_name: String,
    pub start_date: String,
    pub end_date: String,
}

impl ReportSummary {
    /// Builds the summary of a report.
    ///
    /// # Errors
    ///
    /// Returns an error if a date cannot be formatted.
    pub fn from_report(report: &WorkReport) -> Result<Self, ApiError> {
        let details = report.details();
        Ok(Self {
            report_id: report.report_id(),
            code: report.code().to_string(),
            title: details.title.clone(),
            category: details.category,
            status: details.status,
            progress: details.progress,
            risk_level: details.hsse.risk_level,
            location_name: details.location.name.clone(),
            start_date: format_date(details.start_date).map_err(translate_domain_error)?,
            end_date: format_date(details.end_date).map_err(translate_domain_error)?,
        })
    }
}

/// Dashboard statistics, latest reports and approaching deadlines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardResponse {
    pub stats: DashboardStats,
    pub recent_reports: Vec<ReportSummary>,
    pub upcoming_deadlines: Vec<ReportSummary>,
}

/// Query string for the schedule calendar.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ScheduleQuery {
    pub year: i32,
    /// 1-12.
    pub month: u8,
    /// Comma-separated statuses.
    #[serde(default)]
    pub status: Option<String>,
    /// Comma-separated categories.
    #[serde(default)]
    pub category: Option<String>,
}

/// One calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleDayResponse {
    pub date: String,
    /// Reports whose `[start_date, end_date]` contains the day.
    pub reports: Vec<ReportSummary>,
}

/// A month of the schedule calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleResponse {
    pub year: i32,
    pub month: u8,
    pub days: Vec<ScheduleDayResponse>,
    /// Unfinished reports ending within the next seven days, soonest first.
    pub upcoming_deadlines: Vec<ReportSummary>,
}

/// A report with coordinates, for the map view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapMarker {
    pub report_id: i64,
    pub code: String,
    pub title: String,
    pub status: ReportStatus,
    pub risk_level: RiskLevel,
    pub location_name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Every report that can be placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapResponse {
    pub markers: Vec<MapMarker>,
}

// ========================================================================
// Notifications
// ========================================================================

/// A notification as returned to its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationResponse {
    pub notification_id: i64,
    pub report_id: Option<i64>,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub is_read: bool,
    pub created_at: String,
}

impl From<NotificationData> for NotificationResponse {
    fn from(data: NotificationData) -> Self {
        Self {
            notification_id: data.notification_id,
            report_id: data.report_id,
            title: data.title,
            message: data.message,
            kind: data.kind,
            is_read: data.is_read,
            created_at: data.created_at,
        }
    }
}

/// The caller's latest notifications.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListNotificationsResponse {
    /// Newest first.
    pub notifications: Vec<NotificationResponse>,
    pub unread_count: i64,
}

/// Response for marking every notification read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkAllReadResponse {
    /// Notifications that changed from unread to read.
    pub updated: usize,
}
