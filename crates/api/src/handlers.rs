// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Request handlers.
//!
//! Handlers authorize the actor, translate request DTOs into domain values,
//! run the operation and translate the outcome back. Report creation and
//! editing go through the asynchronous allocation protocol and therefore
//! take a `PersistenceStore`; everything else works on a locked
//! `Persistence` directly.

use pep_report::{
    Allocation, AllocationPolicy, CodeRequest, ReportStore, check_candidate, check_full_code,
    create_with_allocation, suggest_code as suggest_next_code, update_with_validation,
};
use pep_report_domain::{
    CodeScope, CodeYear, DEFAULT_DEADLINE_HORIZON_DAYS, DateRange, HsseData, Location, NewReport,
    NotificationKind, RECENT_REPORT_COUNT, ReportCategory, ReportCode, ReportDetails,
    ReportFilter, ReportPatch, ReportStatus, RiskLevel, ScheduleDay, Sequence, Settings,
    ValidationResult, WeatherCondition, WorkReport, compute_dashboard_stats, format_date,
    month_schedule, parse_date, recent_reports, upcoming_deadlines,
};
use pep_report_persistence::{
    NewNotification, NotificationData, OperatorData, OperatorProfile, Persistence, ReportRecord,
    SessionData,
};
use std::str::FromStr;
use time::{Date, Duration, Month, OffsetDateTime};
use tracing::{debug, error, info, warn};

use crate::auth::{AuthenticatedActor, AuthenticationService, AuthorizationService, Role};
use crate::capabilities::{
    compute_global_capabilities, compute_operator_capabilities, is_last_active_admin,
};
use crate::error::{
    ApiError, translate_core_error, translate_domain_error, translate_persistence_error,
};
use crate::export::{
    ExportFile, ExportFormat, export_filename, reports_to_csv, reports_to_json,
};
use crate::password_policy::PasswordPolicy;
use crate::request_response::{
    BootstrapStatusResponse, ChangePasswordRequest, CreateFirstAdminRequest,
    CreateOperatorRequest, CreateOperatorResponse, CreateReportRequest, CreateReportResponse,
    DashboardResponse, ListNotificationsResponse, ListOperatorsResponse, ListReportsQuery,
    ListReportsResponse, LocationDto, LoginRequest, LoginResponse, MapMarker, MapResponse,
    MarkAllReadResponse, MessageResponse, NotificationResponse, OperatorInfo,
    OperatorListEntry, ReportResponse, ReportSummary, ResetPasswordRequest, ScheduleDayResponse,
    ScheduleQuery, ScheduleResponse, SuggestCodeResponse, UpdateProfileRequest,
    UpdateReportRequest, ValidateCodeQuery, ValidateCodeResponse, WhoAmIResponse,
};
use crate::store::PersistenceStore;

/// Notifications listed per request.
pub const NOTIFICATION_PAGE_SIZE: i64 = 50;

/// Display name given to an admin created from the command line.
pub const BOOTSTRAP_ADMIN_NAME: &str = "Administrator";

fn internal(context: &str) -> impl FnOnce(pep_report_persistence::PersistenceError) -> ApiError {
    let context: String = context.to_string();
    move |e| {
        error!(error = %e, "{context}");
        ApiError::Internal {
            message: format!("{context}: {e}"),
        }
    }
}

fn operator_not_found(operator_id: i64) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: String::from("Operator"),
        message: format!("Operator with ID {operator_id} not found"),
    }
}

fn report_not_found(report_id: i64) -> ApiError {
    ApiError::ResourceNotFound {
        resource_type: String::from("Work report"),
        message: format!("Work report {report_id} does not exist"),
    }
}

fn load_operator(persistence: &mut Persistence, operator_id: i64) -> Result<OperatorData, ApiError> {
    persistence
        .get_operator_by_id(operator_id)
        .map_err(internal("Failed to get operator"))?
        .ok_or_else(|| operator_not_found(operator_id))
}

/// Returns today's date in the configured system timezone.
///
/// # Errors
///
/// Returns an error if the settings cannot be read or the timezone cannot
/// represent `now`.
pub fn local_today(persistence: &mut Persistence, now: OffsetDateTime) -> Result<Date, ApiError> {
    let settings: Settings = persistence
        .get_settings()
        .map_err(internal("Failed to load settings"))?;
    settings
        .system
        .timezone
        .local_date(now)
        .map_err(translate_domain_error)
}

// ========================================================================
// Authentication and bootstrap
// ========================================================================

/// Authenticates an operator and opens a session.
///
/// # Arguments
///
/// * `persistence` - The persistence layer
/// * `request` - The login request
/// * `session_duration` - How long the session stays valid
///
/// # Errors
///
/// Returns an error if:
/// - The email or password is wrong
/// - The operator is disabled
/// - Database operations fail
pub fn login(
    persistence: &mut Persistence,
    request: &LoginRequest,
    session_duration: Duration,
) -> Result<LoginResponse, ApiError> {
    let (session_token, actor, operator): (String, AuthenticatedActor, OperatorData) =
        AuthenticationService::login(
            persistence,
            &request.email.trim().to_lowercase(),
            &request.password,
            session_duration,
        )?;

    let session: Option<SessionData> = persistence
        .get_session_by_token(&session_token)
        .map_err(internal("Failed to retrieve session"))?;
    let expires_at: String = session
        .ok_or_else(|| ApiError::Internal {
            message: String::from("Session not found after creation"),
        })?
        .expires_at;

    Ok(LoginResponse {
        session_token,
        operator_id: operator.operator_id,
        email: operator.email,
        display_name: operator.display_name,
        role: actor.role.to_string(),
        expires_at,
    })
}

/// Logs out by deleting the session.
///
/// # Errors
///
/// Returns an error if the logout fails.
pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), ApiError> {
    AuthenticationService::logout(persistence, session_token)?;
    Ok(())
}

/// Returns the calling operator, their global capabilities and their
/// unread notification count.
///
/// # Errors
///
/// Returns an error if the unread count cannot be read.
pub fn whoami(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    operator: &OperatorData,
) -> Result<WhoAmIResponse, ApiError> {
    let unread_notifications: i64 = persistence
        .count_unread_notifications(operator.operator_id)
        .map_err(internal("Failed to count notifications"))?;

    Ok(WhoAmIResponse {
        operator: OperatorInfo::from(operator),
        capabilities: compute_global_capabilities(actor, operator),
        unread_notifications,
    })
}

/// Reports whether the system still waits for its first admin.
///
/// # Errors
///
/// Returns an error if the operator count cannot be read.
pub fn check_bootstrap_status(
    persistence: &mut Persistence,
) -> Result<BootstrapStatusResponse, ApiError> {
    let operator_count: i64 = persistence
        .count_operators()
        .map_err(internal("Failed to count operators"))?;

    Ok(BootstrapStatusResponse {
        is_bootstrap_mode: operator_count == 0,
    })
}

/// Creates the first admin while no operator exists.
///
/// # Errors
///
/// Returns an error if:
/// - An operator already exists
/// - The password does not satisfy the policy
/// - Database operations fail
pub fn create_first_admin(
    persistence: &mut Persistence,
    request: CreateFirstAdminRequest,
) -> Result<CreateOperatorResponse, ApiError> {
    if !check_bootstrap_status(persistence)?.is_bootstrap_mode {
        return Err(ApiError::Unauthorized {
            action: String::from("create_first_admin"),
            required_role: String::from("Bootstrap mode (no operators exist)"),
        });
    }

    let email: String = validate_email(&request.email)?;
    let display_name: String = validate_display_name(&request.display_name)?;
    PasswordPolicy::default().validate(
        &request.password,
        &request.password_confirmation,
        &email,
        &display_name,
    )?;

    let operator_id: i64 = persistence
        .create_operator(&email, &display_name, &request.password, Role::Admin.as_str())
        .map_err(translate_persistence_error)?;

    info!(operator_id, email = %email, "Created first admin operator");

    Ok(CreateOperatorResponse {
        operator_id,
        email,
        display_name,
        role: String::from(Role::Admin.as_str()),
        message: String::from("First admin operator created successfully"),
    })
}

/// Creates an admin from startup configuration if no operator exists yet.
///
/// # Returns
///
/// The new operator's ID, or `None` if operators already existed.
///
/// # Errors
///
/// Returns an error if the credentials violate the password policy or the
/// operator cannot be stored.
pub fn ensure_bootstrap_admin(
    persistence: &mut Persistence,
    email: &str,
    password: &str,
) -> Result<Option<i64>, ApiError> {
    if !check_bootstrap_status(persistence)?.is_bootstrap_mode {
        debug!("Operators exist, skipping bootstrap admin");
        return Ok(None);
    }
    let response: CreateOperatorResponse = create_first_admin(
        persistence,
        CreateFirstAdminRequest {
            email: email.to_string(),
            display_name: String::from(BOOTSTRAP_ADMIN_NAME),
            password: password.to_string(),
            password_confirmation: password.to_string(),
        },
    )?;
    Ok(Some(response.operator_id))
}

// ========================================================================
// Operators
// ========================================================================

fn validate_email(email: &str) -> Result<String, ApiError> {
    let email: String = email.trim().to_lowercase();
    let well_formed: bool = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if well_formed {
        Ok(email)
    } else {
        Err(ApiError::InvalidInput {
            field: String::from("email"),
            message: format!("'{email}' is not a valid email address"),
        })
    }
}

fn validate_display_name(display_name: &str) -> Result<String, ApiError> {
    let display_name: &str = display_name.trim();
    if display_name.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("display_name"),
            message: String::from("Display name must not be empty"),
        });
    }
    Ok(display_name.to_string())
}

fn optional_text(value: Option<&String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Creates a new operator.
///
/// Only admins may create operators.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The email is malformed or already in use
/// - The role is unknown
/// - The password does not satisfy the policy
/// - Database operations fail
pub fn create_operator(
    persistence: &mut Persistence,
    request: CreateOperatorRequest,
    actor: &AuthenticatedActor,
) -> Result<CreateOperatorResponse, ApiError> {
    AuthorizationService::authorize_manage_operators(actor, "create_operator")?;

    let role: Role = Role::from_str(request.role.trim()).map_err(|_| ApiError::InvalidInput {
        field: String::from("role"),
        message: format!(
            "Invalid role: {}. Must be 'admin', 'supervisor' or 'worker'",
            request.role
        ),
    })?;
    let email: String = validate_email(&request.email)?;
    let display_name: String = validate_display_name(&request.display_name)?;
    PasswordPolicy::default().validate(
        &request.password,
        &request.password_confirmation,
        &email,
        &display_name,
    )?;

    let operator_id: i64 = persistence
        .create_operator(&email, &display_name, &request.password, role.as_str())
        .map_err(translate_persistence_error)?;

    let profile: OperatorProfile = OperatorProfile {
        display_name: display_name.clone(),
        phone: optional_text(request.phone.as_ref()),
        department: optional_text(request.department.as_ref()),
        position: optional_text(request.position.as_ref()),
    };
    if profile.phone.is_some() || profile.department.is_some() || profile.position.is_some() {
        persistence
            .update_operator_profile(operator_id, &profile)
            .map_err(translate_persistence_error)?;
    }

    info!(
        operator_id,
        email = %email,
        role = %role,
        created_by = actor.operator_id,
        "Created operator"
    );

    Ok(CreateOperatorResponse {
        operator_id,
        email,
        display_name,
        role: String::from(role.as_str()),
        message: String::from("Operator created successfully"),
    })
}

/// Lists every operator with the caller's capabilities on each.
///
/// # Errors
///
/// Returns an error if the actor is not an admin or the query fails.
pub fn list_operators(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    operator: &OperatorData,
) -> Result<ListOperatorsResponse, ApiError> {
    AuthorizationService::authorize_manage_operators(actor, "list_operators")?;

    let operators: Vec<OperatorData> = persistence
        .list_operators()
        .map_err(internal("Failed to list operators"))?;

    let mut entries: Vec<OperatorListEntry> = Vec::with_capacity(operators.len());
    for target in &operators {
        let capabilities = compute_operator_capabilities(actor, operator, target, persistence)
            .map_err(|message| ApiError::Internal { message })?;
        entries.push(OperatorListEntry {
            operator: OperatorInfo::from(target),
            capabilities,
        });
    }

    Ok(ListOperatorsResponse { operators: entries })
}

/// Refuses actions that would lock the system out.
fn ensure_removable(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    target: &OperatorData,
) -> Result<(), ApiError> {
    if target.operator_id == actor.operator_id {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("not_self"),
            message: String::from("Operators cannot disable or delete their own account"),
        });
    }
    let last_admin: bool = is_last_active_admin(persistence, target)
        .map_err(|message| ApiError::Internal { message })?;
    if last_admin {
        return Err(ApiError::DomainRuleViolation {
            rule: String::from("last_active_admin"),
            message: String::from("Operation would leave the system without an active admin"),
        });
    }
    Ok(())
}

/// Disables an operator and ends their sessions.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The operator does not exist
/// - The operator is the actor or the last active admin
/// - Database operations fail
pub fn disable_operator(
    persistence: &mut Persistence,
    operator_id: i64,
    actor: &AuthenticatedActor,
) -> Result<MessageResponse, ApiError> {
    AuthorizationService::authorize_manage_operators(actor, "disable_operator")?;

    let target: OperatorData = load_operator(persistence, operator_id)?;
    ensure_removable(persistence, actor, &target)?;

    persistence
        .disable_operator(operator_id)
        .map_err(translate_persistence_error)?;
    let ended: usize = persistence
        .delete_sessions_for_operator(operator_id)
        .map_err(internal("Failed to end sessions"))?;

    info!(operator_id, sessions_ended = ended, "Disabled operator");
    Ok(MessageResponse::new(format!(
        "Operator {} has been disabled",
        target.email
    )))
}

/// Re-enables a disabled operator.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the operator does not
/// exist, or the update fails.
pub fn enable_operator(
    persistence: &mut Persistence,
    operator_id: i64,
    actor: &AuthenticatedActor,
) -> Result<MessageResponse, ApiError> {
    AuthorizationService::authorize_manage_operators(actor, "enable_operator")?;

    let target: OperatorData = load_operator(persistence, operator_id)?;
    persistence
        .enable_operator(operator_id)
        .map_err(translate_persistence_error)?;

    info!(operator_id, "Enabled operator");
    Ok(MessageResponse::new(format!(
        "Operator {} has been enabled",
        target.email
    )))
}

/// Deletes an operator.
///
/// Operators who created work reports cannot be deleted; disable them
/// instead.
///
/// # Errors
///
/// Returns an error if:
/// - The actor is not an admin
/// - The operator does not exist
/// - The operator is the actor or the last active admin
/// - The operator created work reports
/// - Database operations fail
pub fn delete_operator(
    persistence: &mut Persistence,
    operator_id: i64,
    actor: &AuthenticatedActor,
) -> Result<MessageResponse, ApiError> {
    AuthorizationService::authorize_manage_operators(actor, "delete_operator")?;

    let target: OperatorData = load_operator(persistence, operator_id)?;
    ensure_removable(persistence, actor, &target)?;

    persistence
        .delete_operator(operator_id)
        .map_err(translate_persistence_error)?;

    info!(operator_id, deleted_by = actor.operator_id, "Deleted operator");
    Ok(MessageResponse::new(format!(
        "Operator {} has been deleted",
        target.email
    )))
}

/// Sets another operator's password and ends their sessions.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the operator does not
/// exist, the password violates the policy, or the update fails.
pub fn reset_password(
    persistence: &mut Persistence,
    operator_id: i64,
    request: &ResetPasswordRequest,
    actor: &AuthenticatedActor,
) -> Result<MessageResponse, ApiError> {
    AuthorizationService::authorize_manage_operators(actor, "reset_password")?;

    let target: OperatorData = load_operator(persistence, operator_id)?;
    PasswordPolicy::default().validate(
        &request.new_password,
        &request.new_password_confirmation,
        &target.email,
        &target.display_name,
    )?;

    persistence
        .update_password(operator_id, &request.new_password)
        .map_err(translate_persistence_error)?;
    persistence
        .delete_sessions_for_operator(operator_id)
        .map_err(internal("Failed to end sessions"))?;

    info!(operator_id, reset_by = actor.operator_id, "Reset operator password");
    Ok(MessageResponse::new(format!(
        "Password for {} has been reset",
        target.email
    )))
}

/// Changes the caller's own password and ends all of their sessions.
///
/// # Errors
///
/// Returns an error if:
/// - The current password is wrong
/// - The new password violates the policy
/// - Database operations fail
pub fn change_password(
    persistence: &mut Persistence,
    request: &ChangePasswordRequest,
    operator: &OperatorData,
) -> Result<MessageResponse, ApiError> {
    let current_ok: bool = persistence
        .verify_password(&request.current_password, &operator.password_hash)
        .map_err(internal("Failed to verify password"))?;
    if !current_ok {
        warn!(operator_id = operator.operator_id, "Password change with wrong current password");
        return Err(ApiError::AuthenticationFailed {
            reason: String::from("Current password is incorrect"),
        });
    }

    PasswordPolicy::default().validate(
        &request.new_password,
        &request.new_password_confirmation,
        &operator.email,
        &operator.display_name,
    )?;

    persistence
        .update_password(operator.operator_id, &request.new_password)
        .map_err(translate_persistence_error)?;
    persistence
        .delete_sessions_for_operator(operator.operator_id)
        .map_err(internal("Failed to end sessions"))?;

    info!(operator_id = operator.operator_id, "Operator changed password");
    Ok(MessageResponse::new(
        "Password changed. Please log in again.",
    ))
}

/// Updates the caller's own profile.
///
/// # Errors
///
/// Returns an error if the display name is empty or the update fails.
pub fn update_profile(
    persistence: &mut Persistence,
    request: &UpdateProfileRequest,
    operator: &OperatorData,
) -> Result<OperatorInfo, ApiError> {
    let profile: OperatorProfile = OperatorProfile {
        display_name: validate_display_name(&request.display_name)?,
        phone: optional_text(request.phone.as_ref()),
        department: optional_text(request.department.as_ref()),
        position: optional_text(request.position.as_ref()),
    };
    persistence
        .update_operator_profile(operator.operator_id, &profile)
        .map_err(translate_persistence_error)?;

    let updated: OperatorData = load_operator(persistence, operator.operator_id)?;
    debug!(operator_id = operator.operator_id, "Updated profile");
    Ok(OperatorInfo::from(&updated))
}

// ========================================================================
// Report codes
// ========================================================================

fn code_year(year: Option<u16>, today: Date) -> Result<CodeYear, ApiError> {
    match year {
        Some(year) => CodeYear::new(year),
        None => CodeYear::from_date(today),
    }
    .map_err(translate_domain_error)
}

/// Suggests the next free code.
///
/// # Arguments
///
/// * `store` - The report store
/// * `year` - Code year, defaulting to the year of `today`
/// * `today` - The current local date
/// * `scope` - Uniqueness scope
///
/// # Errors
///
/// Returns an error if the year is invalid or has no free sequence, or the
/// store fails.
pub async fn suggest_code(
    store: &PersistenceStore,
    year: Option<u16>,
    today: Date,
    scope: CodeScope,
) -> Result<SuggestCodeResponse, ApiError> {
    let year: CodeYear = code_year(year, today)?;
    let code: ReportCode = suggest_next_code(store, year, scope)
        .await
        .map_err(translate_core_error)?;

    Ok(SuggestCodeResponse {
        code: code.to_string(),
        sequence: code.sequence().to_string(),
        year: year.value(),
    })
}

/// Validates an operator-typed sequence, or a full code when `query.code`
/// is given.
///
/// When `excluding_report_id` names a report, its own code is not a
/// duplicate and its code year is the default.
///
/// # Errors
///
/// Returns an error if the excluded report does not exist or the store
/// fails. A malformed or duplicate candidate is reported in the response.
pub async fn validate_code(
    store: &PersistenceStore,
    query: &ValidateCodeQuery,
    today: Date,
    scope: CodeScope,
) -> Result<ValidateCodeResponse, ApiError> {
    let excluding: Option<ReportCode> = match query.excluding_report_id {
        Some(report_id) => Some(
            store
                .get_report(report_id)
                .await
                .map_err(|e| translate_core_error(e.into()))?
                .code(),
        ),
        None => None,
    };
    if let Some(full) = &query.code {
        let candidate: &str = full.trim();
        let result: ValidationResult = check_full_code(store, candidate, excluding, scope)
            .await
            .map_err(translate_core_error)?;
        let code: Option<String> = ReportCode::from_str(candidate)
            .ok()
            .map(|code| code.to_string());
        return Ok(ValidateCodeResponse::new(candidate, code, result));
    }

    let year: CodeYear = match (query.year, excluding) {
        (None, Some(current)) => current.year(),
        (year, _) => code_year(year, today)?,
    };

    let candidate: &str = query.sequence.trim();
    let result: ValidationResult = check_candidate(store, candidate, year, excluding, scope)
        .await
        .map_err(translate_core_error)?;

    let code: Option<String> = Sequence::from_str(candidate)
        .ok()
        .map(|sequence| ReportCode::new(sequence, year).to_string());
    Ok(ValidateCodeResponse::new(candidate, code, result))
}

// ========================================================================
// Work reports
// ========================================================================

fn parse_enum<T>(value: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = pep_report_domain::DomainError>,
{
    T::from_str(value.trim()).map_err(translate_domain_error)
}

fn location_from_dto(dto: &LocationDto) -> Location {
    Location {
        name: dto.name.clone(),
        latitude: dto.latitude,
        longitude: dto.longitude,
    }
}

fn details_from_request(request: &CreateReportRequest) -> Result<ReportDetails, ApiError> {
    Ok(ReportDetails {
        title: request.title.clone(),
        description: request.description.clone(),
        category: parse_enum::<ReportCategory>(&request.category)?,
        start_date: parse_date(request.start_date.trim()).map_err(translate_domain_error)?,
        end_date: parse_date(request.end_date.trim()).map_err(translate_domain_error)?,
        status: match &request.status {
            Some(status) => parse_enum::<ReportStatus>(status)?,
            None => ReportStatus::Planning,
        },
        progress: request.progress.unwrap_or(0),
        worker_count: request.worker_count,
        responsible_persons: request.responsible_persons.clone(),
        location: location_from_dto(&request.location),
        hsse: HsseData {
            risk_level: parse_enum::<RiskLevel>(&request.risk_level)?,
            weather_condition: parse_enum::<WeatherCondition>(&request.weather_condition)?,
            safety_incidents: request.safety_incidents,
        },
        photos: request.photos.clone(),
    })
}

fn patch_from_request(
    request: &UpdateReportRequest,
    current: &WorkReport,
) -> Result<ReportPatch, ApiError> {
    let code: Option<ReportCode> = match &request.code_sequence {
        Some(sequence) => Some(ReportCode::new(
            Sequence::from_str(sequence.trim()).map_err(translate_domain_error)?,
            current.code().year(),
        )),
        None => None,
    };
    let dates = |value: &Option<String>| -> Result<Option<Date>, ApiError> {
        value
            .as_deref()
            .map(|v| parse_date(v.trim()).map_err(translate_domain_error))
            .transpose()
    };

    let hsse: Option<HsseData> = if request.risk_level.is_some()
        || request.weather_condition.is_some()
        || request.safety_incidents.is_some()
    {
        let existing: HsseData = current.details().hsse;
        Some(HsseData {
            risk_level: match &request.risk_level {
                Some(level) => parse_enum::<RiskLevel>(level)?,
                None => existing.risk_level,
            },
            weather_condition: match &request.weather_condition {
                Some(weather) => parse_enum::<WeatherCondition>(weather)?,
                None => existing.weather_condition,
            },
            safety_incidents: request
                .safety_incidents
                .unwrap_or(existing.safety_incidents),
        })
    } else {
        None
    };

    Ok(ReportPatch {
        code,
        title: request.title.clone(),
        description: request.description.clone(),
        category: request
            .category
            .as_deref()
            .map(parse_enum::<ReportCategory>)
            .transpose()?,
        start_date: dates(&request.start_date)?,
        end_date: dates(&request.end_date)?,
        status: request
            .status
            .as_deref()
            .map(parse_enum::<ReportStatus>)
            .transpose()?,
        progress: request.progress,
        worker_count: request.worker_count,
        responsible_persons: request.responsible_persons.clone(),
        location: request.location.as_ref().map(location_from_dto),
        hsse,
        photos: request.photos.clone(),
    })
}

/// Delivers a report notification, logging instead of failing: the report
/// itself is already committed.
///
/// Nothing is delivered while the `report_updates` preference is off.
fn notify_audience(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    notification: &NewNotification,
) -> Vec<i64> {
    let settings: Settings = match persistence.get_settings() {
        Ok(settings) => settings,
        Err(e) => {
            error!(error = %e, report_id = ?notification.report_id, "Failed to load notification preferences");
            return Vec::new();
        }
    };
    if !settings.notifications.report_updates {
        debug!(report_id = ?notification.report_id, "Report notifications are disabled");
        return Vec::new();
    }

    match persistence.notify_report_audience(actor.operator_id, notification) {
        Ok(recipients) => {
            debug!(
                report_id = ?notification.report_id,
                recipients = recipients.len(),
                "Delivered report notification"
            );
            recipients
        }
        Err(e) => {
            error!(error = %e, report_id = ?notification.report_id, "Failed to deliver notification");
            Vec::new()
        }
    }
}

fn load_record(persistence: &mut Persistence, report_id: i64) -> Result<ReportRecord, ApiError> {
    persistence
        .get_work_report(report_id)
        .map_err(internal("Failed to load work report"))?
        .ok_or_else(|| report_not_found(report_id))
}

/// Creates a work report, allocating or validating its code.
///
/// Admins and supervisors other than the creator are notified.
///
/// # Arguments
///
/// * `store` - The report store
/// * `request` - The report content and optional code choice
/// * `actor` - The creator
/// * `operator` - The creator's operator data
/// * `policy` - Uniqueness scope and retry bound
/// * `today` - The current local date, for the default code year
///
/// # Returns
///
/// The created report and the IDs of the operators notified.
///
/// # Errors
///
/// Returns an error if:
/// - A field is invalid
/// - A chosen code is malformed or taken
/// - The code year has no free sequence
/// - Every commit attempt conflicted
/// - The store fails
pub async fn create_report(
    store: &PersistenceStore,
    request: &CreateReportRequest,
    actor: &AuthenticatedActor,
    operator: &OperatorData,
    policy: AllocationPolicy,
    today: Date,
) -> Result<(CreateReportResponse, Vec<i64>), ApiError> {
    let details: ReportDetails = details_from_request(request)?;
    let year: CodeYear = code_year(request.code_year, today)?;
    let code_request: CodeRequest = match &request.code_sequence {
        Some(sequence) => CodeRequest::Manual(ReportCode::new(
            Sequence::from_str(sequence.trim()).map_err(translate_domain_error)?,
            year,
        )),
        None => CodeRequest::Auto { year },
    };

    let new_report: NewReport = NewReport {
        details,
        created_by: actor.operator_id,
    };
    let allocation: Allocation = create_with_allocation(store, code_request, &new_report, policy)
        .await
        .map_err(translate_core_error)?;

    let mut persistence = store.persistence().lock().await;
    let record: ReportRecord = load_record(&mut persistence, allocation.report.report_id())?;
    let title: &str = &record.report.details().title;
    let notified: Vec<i64> = notify_audience(
        &mut persistence,
        actor,
        &NewNotification {
            report_id: Some(record.report.report_id()),
            title: String::from("New report"),
            message: format!(
                "{} created report \"{title}\" ({})",
                operator.display_name,
                record.report.code()
            ),
            kind: NotificationKind::Info,
        },
    );

    Ok((
        CreateReportResponse {
            report: ReportResponse::from_record(&record)?,
            attempts: allocation.attempts,
        },
        notified,
    ))
}

const fn status_notification_kind(status: ReportStatus) -> NotificationKind {
    match status {
        ReportStatus::Completed => NotificationKind::Success,
        ReportStatus::Delayed => NotificationKind::Warning,
        ReportStatus::Planning | ReportStatus::Ongoing => NotificationKind::Info,
    }
}

/// Edits a work report.
///
/// A new code sequence keeps the report's code year and is validated with
/// self-exclusion. When the status changes, admins and supervisors other
/// than the editor are notified.
///
/// # Returns
///
/// The updated report and the IDs of the operators notified.
///
/// # Errors
///
/// Returns an error if:
/// - The report does not exist
/// - A field is invalid
/// - The new code is malformed or taken
/// - The store fails
pub async fn update_report(
    store: &PersistenceStore,
    report_id: i64,
    request: &UpdateReportRequest,
    actor: &AuthenticatedActor,
    scope: CodeScope,
) -> Result<(ReportResponse, Vec<i64>), ApiError> {
    let current: WorkReport = store
        .get_report(report_id)
        .await
        .map_err(|e| translate_core_error(e.into()))?;
    let patch: ReportPatch = patch_from_request(request, &current)?;
    if patch.is_empty() {
        return Err(ApiError::InvalidInput {
            field: String::from("body"),
            message: String::from("No fields to update"),
        });
    }

    let updated: WorkReport = update_with_validation(store, report_id, &patch, scope)
        .await
        .map_err(translate_core_error)?;

    let mut persistence = store.persistence().lock().await;
    let record: ReportRecord = load_record(&mut persistence, updated.report_id())?;

    let old_status: ReportStatus = current.details().status;
    let new_status: ReportStatus = record.report.details().status;
    let notified: Vec<i64> = if old_status == new_status {
        Vec::new()
    } else {
        notify_audience(
            &mut persistence,
            actor,
            &NewNotification {
                report_id: Some(report_id),
                title: String::from("Report status updated"),
                message: format!(
                    "\"{}\" ({}) changed from {} to {}",
                    record.report.details().title,
                    record.report.code(),
                    old_status.label(),
                    new_status.label()
                ),
                kind: status_notification_kind(new_status),
            },
        )
    };

    Ok((ReportResponse::from_record(&record)?, notified))
}

/// Deletes a work report. Its code becomes free again.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, the report does not
/// exist, or the delete fails.
pub fn delete_report(
    persistence: &mut Persistence,
    report_id: i64,
    actor: &AuthenticatedActor,
) -> Result<MessageResponse, ApiError> {
    AuthorizationService::authorize_delete_report(actor)?;

    let record: ReportRecord = load_record(persistence, report_id)?;
    persistence
        .delete_work_report(report_id)
        .map_err(translate_persistence_error)?;

    info!(
        report_id,
        code = %record.report.code(),
        deleted_by = actor.operator_id,
        "Deleted work report"
    );
    Ok(MessageResponse::new(format!(
        "Report {} has been deleted",
        record.report.code()
    )))
}

/// Retrieves one work report.
///
/// # Errors
///
/// Returns an error if the report does not exist or the query fails.
pub fn get_report(persistence: &mut Persistence, report_id: i64) -> Result<ReportResponse, ApiError> {
    let record: ReportRecord = load_record(persistence, report_id)?;
    ReportResponse::from_record(&record)
}

fn parse_list<T>(value: Option<&String>) -> Result<Vec<T>, ApiError>
where
    T: FromStr<Err = pep_report_domain::DomainError>,
{
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(parse_enum::<T>)
                .collect::<Result<Vec<T>, ApiError>>()
        })
        .transpose()
        .map(Option::unwrap_or_default)
}

/// Turns a list query into a report filter.
///
/// # Errors
///
/// Returns an error if a status, category, date range or date is invalid.
pub fn build_filter(query: &ListReportsQuery) -> Result<ReportFilter, ApiError> {
    let date = |value: &Option<String>| -> Result<Option<Date>, ApiError> {
        value
            .as_deref()
            .map(|v| parse_date(v.trim()).map_err(translate_domain_error))
            .transpose()
    };
    let date_range: DateRange = DateRange::from_parts(
        query.date_range.as_deref().unwrap_or("all"),
        date(&query.start_date)?,
        date(&query.end_date)?,
    )
    .map_err(translate_domain_error)?;

    Ok(ReportFilter {
        search: query.search.clone(),
        statuses: parse_list::<ReportStatus>(query.status.as_ref())?,
        categories: parse_list::<ReportCategory>(query.category.as_ref())?,
        date_range,
        code_year: query
            .code_year
            .map(CodeYear::new)
            .transpose()
            .map_err(translate_domain_error)?,
    })
}

fn filtered_records(
    persistence: &mut Persistence,
    query: &ListReportsQuery,
    now: OffsetDateTime,
) -> Result<Vec<ReportRecord>, ApiError> {
    let filter: ReportFilter = build_filter(query)?;
    let records: Vec<ReportRecord> = persistence
        .list_work_reports(filter.code_year)
        .map_err(internal("Failed to list work reports"))?;
    Ok(records
        .into_iter()
        .filter(|record| filter.matches(&record.report, now))
        .collect())
}

/// Lists work reports matching a query, newest first.
///
/// # Errors
///
/// Returns an error if the query is invalid or the listing fails.
pub fn list_reports(
    persistence: &mut Persistence,
    query: &ListReportsQuery,
    now: OffsetDateTime,
) -> Result<ListReportsResponse, ApiError> {
    let reports: Vec<ReportResponse> = filtered_records(persistence, query, now)?
        .iter()
        .map(ReportResponse::from_record)
        .collect::<Result<_, _>>()?;
    Ok(ListReportsResponse {
        total: reports.len(),
        reports,
    })
}

/// Exports the work reports matching a query.
///
/// # Errors
///
/// Returns an error if the query is invalid, the listing fails, or the
/// file cannot be rendered.
pub fn export_reports(
    persistence: &mut Persistence,
    query: &ListReportsQuery,
    format: ExportFormat,
    now: OffsetDateTime,
) -> Result<ExportFile, ApiError> {
    let today: Date = local_today(persistence, now)?;
    let records: Vec<ReportRecord> = filtered_records(persistence, query, now)?;
    let render_error = |e: crate::export::ExportError| ApiError::Internal {
        message: format!("Failed to render export: {e}"),
    };

    let body: String = match format {
        ExportFormat::Csv => {
            let reports: Vec<&WorkReport> = records.iter().map(|record| &record.report).collect();
            reports_to_csv(&reports).map_err(render_error)?
        }
        ExportFormat::Json => {
            let reports: Vec<ReportResponse> = records
                .iter()
                .map(ReportResponse::from_record)
                .collect::<Result<_, _>>()?;
            reports_to_json(&reports).map_err(render_error)?
        }
    };

    info!(count = records.len(), format = format.extension(), "Exported work reports");
    Ok(ExportFile {
        filename: export_filename(today, format).map_err(render_error)?,
        content_type: format.content_type(),
        body,
    })
}

// ========================================================================
// Dashboard, schedule and map
// ========================================================================

fn all_reports(persistence: &mut Persistence) -> Result<Vec<WorkReport>, ApiError> {
    Ok(persistence
        .list_work_reports(None)
        .map_err(internal("Failed to list work reports"))?
        .into_iter()
        .map(|record| record.report)
        .collect())
}

fn summaries(reports: &[&WorkReport]) -> Result<Vec<ReportSummary>, ApiError> {
    reports
        .iter()
        .map(|report| ReportSummary::from_report(report))
        .collect()
}

/// Computes the dashboard.
///
/// # Errors
///
/// Returns an error if the listing fails.
pub fn get_dashboard(
    persistence: &mut Persistence,
    now: OffsetDateTime,
) -> Result<DashboardResponse, ApiError> {
    let today: Date = local_today(persistence, now)?;
    let reports: Vec<WorkReport> = all_reports(persistence)?;
    let due: Vec<&WorkReport> = upcoming_deadlines(&reports, today, DEFAULT_DEADLINE_HORIZON_DAYS)
        .map_err(translate_domain_error)?;

    Ok(DashboardResponse {
        stats: compute_dashboard_stats(&reports),
        recent_reports: summaries(&recent_reports(&reports, RECENT_REPORT_COUNT))?,
        upcoming_deadlines: summaries(&due)?,
    })
}

/// Builds the schedule calendar for one month.
///
/// # Errors
///
/// Returns an error if the month, a status or a category is invalid, or
/// the listing fails.
pub fn get_schedule(
    persistence: &mut Persistence,
    query: &ScheduleQuery,
    now: OffsetDateTime,
) -> Result<ScheduleResponse, ApiError> {
    let month: Month = Month::try_from(query.month).map_err(|_| ApiError::InvalidInput {
        field: String::from("month"),
        message: format!("Invalid month: {}. Must be between 1 and 12", query.month),
    })?;
    let filter: ReportFilter = ReportFilter {
        statuses: parse_list::<ReportStatus>(query.status.as_ref())?,
        categories: parse_list::<ReportCategory>(query.category.as_ref())?,
        ..ReportFilter::default()
    };

    let today: Date = local_today(persistence, now)?;
    let reports: Vec<WorkReport> = all_reports(persistence)?
        .into_iter()
        .filter(|report| filter.matches(report, now))
        .collect();

    let calendar: Vec<ScheduleDay<'_>> =
        month_schedule(&reports, query.year, month).map_err(translate_domain_error)?;
    let mut days: Vec<ScheduleDayResponse> = Vec::with_capacity(calendar.len());
    for day in &calendar {
        days.push(ScheduleDayResponse {
            date: format_date(day.date).map_err(translate_domain_error)?,
            reports: summaries(&day.reports)?,
        });
    }
    let due: Vec<&WorkReport> = upcoming_deadlines(&reports, today, DEFAULT_DEADLINE_HORIZON_DAYS)
        .map_err(translate_domain_error)?;

    Ok(ScheduleResponse {
        year: query.year,
        month: query.month,
        days,
        upcoming_deadlines: summaries(&due)?,
    })
}

/// Lists the reports that carry coordinates, as map markers.
///
/// # Errors
///
/// Returns an error if the listing fails.
pub fn get_map(persistence: &mut Persistence) -> Result<MapResponse, ApiError> {
    let markers: Vec<MapMarker> = all_reports(persistence)?
        .iter()
        .filter_map(|report| {
            let details = report.details();
            details
                .location
                .coordinates()
                .map(|(latitude, longitude)| MapMarker {
                    report_id: report.report_id(),
                    code: report.code().to_string(),
                    title: details.title.clone(),
                    status: details.status,
                    risk_level: details.hsse.risk_level,
                    location_name: details.location.name.clone(),
                    latitude,
                    longitude,
                })
        })
        .collect();
    Ok(MapResponse { markers })
}

// ========================================================================
// Notifications
// ========================================================================

/// Lists the caller's newest notifications and their unread count.
///
/// # Errors
///
/// Returns an error if the query fails.
pub fn list_notifications(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<ListNotificationsResponse, ApiError> {
    let notifications: Vec<NotificationData> = persistence
        .list_notifications(actor.operator_id, NOTIFICATION_PAGE_SIZE)
        .map_err(internal("Failed to list notifications"))?;
    let unread_count: i64 = persistence
        .count_unread_notifications(actor.operator_id)
        .map_err(internal("Failed to count notifications"))?;

    Ok(ListNotificationsResponse {
        notifications: notifications
            .into_iter()
            .map(NotificationResponse::from)
            .collect(),
        unread_count,
    })
}

/// Marks one of the caller's notifications read.
///
/// # Errors
///
/// Returns an error if the notification does not belong to the caller or
/// the update fails.
pub fn mark_notification_read(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    notification_id: i64,
) -> Result<MessageResponse, ApiError> {
    persistence
        .mark_notification_read(actor.operator_id, notification_id)
        .map_err(translate_persistence_error)?;
    Ok(MessageResponse::new("Notification marked as read"))
}

/// Marks all of the caller's notifications read.
///
/// # Errors
///
/// Returns an error if the update fails.
pub fn mark_all_notifications_read(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<MarkAllReadResponse, ApiError> {
    let updated: usize = persistence
        .mark_all_notifications_read(actor.operator_id)
        .map_err(internal("Failed to update notifications"))?;
    Ok(MarkAllReadResponse { updated })
}

// ========================================================================
// Settings
// ========================================================================

/// Returns the system settings.
///
/// # Errors
///
/// Returns an error if the actor is a worker or the settings cannot be read.
pub fn get_settings(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
) -> Result<Settings, ApiError> {
    AuthorizationService::authorize_read_settings(actor)?;
    persistence
        .get_settings()
        .map_err(internal("Failed to load settings"))
}

/// Replaces the system settings.
///
/// # Errors
///
/// Returns an error if the actor is not an admin, a value is out of range,
/// or the settings cannot be stored.
pub fn update_settings(
    persistence: &mut Persistence,
    actor: &AuthenticatedActor,
    settings: Settings,
) -> Result<Settings, ApiError> {
    AuthorizationService::authorize_write_settings(actor)?;
    settings.validate().map_err(translate_domain_error)?;
    persistence
        .save_settings(&settings, actor.operator_id)
        .map_err(internal("Failed to save settings"))?;

    info!(updated_by = actor.operator_id, "Updated system settings");
    Ok(settings)
}
