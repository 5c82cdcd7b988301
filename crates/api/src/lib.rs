// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! API layer for the PEP work report dashboard.
//!
//! This crate sits between the HTTP server and the core allocation logic.
//! It authenticates operators, enforces role-based authorization, converts
//! request DTOs into domain values and renders responses. It has no HTTP
//! dependency; the server crate maps its errors onto status codes.
//!
//! Roles apply to operators only:
//! - admins manage operators, delete reports and write settings
//! - supervisors read settings and receive report notifications
//! - workers create and edit reports

#![deny(
    clippy::pedantic,
    clippy::cargo,
    clippy::nursery,
    clippy::style,
    clippy::correctness,
    clippy::all
)]

mod auth;
mod capabilities;
mod error;
mod export;
mod handlers;
mod password_policy;
mod request_response;
mod store;

#[cfg(test)]
mod tests;

pub use auth::{AuthenticatedActor, AuthenticationService, AuthorizationService, Role};
pub use capabilities::{
    compute_global_capabilities, compute_operator_capabilities, is_last_active_admin,
};
pub use error::{
    ApiError, AuthError, translate_core_error, translate_domain_error,
    translate_persistence_error,
};
pub use export::{
    EXPORT_HEADERS, ExportError, ExportFile, ExportFormat, export_filename, reports_to_csv,
    reports_to_json,
};
pub use handlers::{
    BOOTSTRAP_ADMIN_NAME, NOTIFICATION_PAGE_SIZE, build_filter, change_password,
    check_bootstrap_status, create_first_admin, create_operator, create_report, delete_operator,
    delete_report, disable_operator, enable_operator, ensure_bootstrap_admin, export_reports,
    get_dashboard, get_map, get_report, get_schedule, get_settings, list_notifications,
    list_operators, list_reports, local_today, login, logout, mark_all_notifications_read,
    mark_notification_read, reset_password, suggest_code, update_profile, update_report,
    update_settings, validate_code, whoami,
};
pub use password_policy::{PasswordPolicy, PasswordPolicyError};
pub use request_response::{
    BootstrapStatusResponse, Capability, ChangePasswordRequest, CreateFirstAdminRequest,
    CreateOperatorRequest, CreateOperatorResponse, CreateReportRequest, CreateReportResponse,
    DashboardResponse, GlobalCapabilities, ListNotificationsResponse, ListOperatorsResponse,
    ListReportsQuery, ListReportsResponse, LocationDto, LoginRequest, LoginResponse, MapMarker,
    MapResponse, MarkAllReadResponse, MessageResponse, NotificationResponse, OperatorCapabilities,
    OperatorInfo, OperatorListEntry, ReportResponse, ReportSummary, ResetPasswordRequest,
    ScheduleDayResponse, ScheduleQuery, ScheduleResponse, SuggestCodeResponse,
    UpdateProfileRequest, UpdateReportRequest, ValidateCodeQuery, ValidateCodeResponse,
    WhoAmIResponse,
};
pub use store::PersistenceStore;
