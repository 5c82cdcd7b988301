// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Error types for the API layer.

use crate::password_policy::PasswordPolicyError;
use pep_report::CoreError;
use pep_report_domain::DomainError;
use pep_report_persistence::PersistenceError;

/// Authentication and authorization errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// API-level errors.
///
/// These are distinct from domain/core errors and represent the API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Authentication failed.
    AuthenticationFailed {
        /// The reason authentication failed.
        reason: String,
    },
    /// Authorization failed - the actor does not have permission.
    Unauthorized {
        /// The action that was attempted.
        action: String,
        /// The role required for this action.
        required_role: String,
    },
    /// A domain rule was violated.
    DomainRuleViolation {
        /// The rule that was violated.
        rule: String,
        /// A human-readable description of the violation.
        message: String,
    },
    /// Invalid input was provided.
    InvalidInput {
        /// The field that was invalid.
        field: String,
        /// A human-readable description of the error.
        message: String,
    },
    /// A requested resource was not found.
    ResourceNotFound {
        /// The type of resource that was not found.
        resource_type: String,
        /// A human-readable description of what was not found.
        message: String,
    },
    /// A concurrent write won; the request may be retried.
    Conflict {
        /// A human-readable description of the conflict.
        message: String,
    },
    /// An internal error occurred.
    Internal {
        /// A description of the internal error.
        message: String,
    },
    /// Password policy violation.
    PasswordPolicyViolation {
        /// A human-readable description of the policy violation.
        message: String,
    },
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AuthenticationFailed { reason } => {
                write!(f, "Authentication failed: {reason}")
            }
            Self::Unauthorized {
                action,
                required_role,
            } => {
                write!(f, "Unauthorized: '{action}' requires {required_role} role")
            }
            Self::DomainRuleViolation { rule, message } => {
                write!(f, "Domain rule violation ({rule}): {message}")
            }
            Self::InvalidInput { field, message } => {
                write!(f, "Invalid input for field '{field}': {message}")
            }
            Self::ResourceNotFound {
                resource_type,
                message,
            } => {
                write!(f, "{resource_type} not found: {message}")
            }
            Self::Conflict { message } => write!(f, "Conflict: {message}"),
            Self::Internal { message } => {
                write!(f, "Internal error: {message}")
            }
            Self::PasswordPolicyViolation { message } => {
                write!(f, "Password policy violation: {message}")
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::AuthenticationFailed { reason } => Self::AuthenticationFailed { reason },
            AuthError::Unauthorized {
                action,
                required_role,
            } => Self::Unauthorized {
                action,
                required_role,
            },
        }
    }
}

impl From<PasswordPolicyError> for ApiError {
    fn from(err: PasswordPolicyError) -> Self {
        Self::PasswordPolicyViolation {
            message: err.to_string(),
        }
    }
}

/// Translates a domain error into an API error.
///
/// This translation is explicit and ensures domain errors are not leaked directly.
#[must_use]
pub fn translate_domain_error(err: DomainError) -> ApiError {
    let message: String = err.to_string();
    match err {
        DomainError::MalformedCode { .. } | DomainError::RegistryScopeMismatch { .. } => {
            ApiError::InvalidInput {
                field: String::from("code"),
                message,
            }
        }
        DomainError::DuplicateCode { .. } => ApiError::DomainRuleViolation {
            rule: String::from("unique_report_code"),
            message,
        },
        DomainError::CodesExhausted { .. } => ApiError::DomainRuleViolation {
            rule: String::from("codes_exhausted"),
            message,
        },
        DomainError::InvalidTitle(_) => ApiError::InvalidInput {
            field: String::from("title"),
            message,
        },
        DomainError::InvalidDescription(_) => ApiError::InvalidInput {
            field: String::from("description"),
            message,
        },
        DomainError::InvalidWorkerCount(_) => ApiError::InvalidInput {
            field: String::from("worker_count"),
            message,
        },
        DomainError::MissingResponsiblePerson => ApiError::InvalidInput {
            field: String::from("responsible_persons"),
            message,
        },
        DomainError::InvalidLocation(_) => ApiError::InvalidInput {
            field: String::from("location"),
            message,
        },
        DomainError::InvalidCoordinates { .. } => ApiError::InvalidInput {
            field: String::from("coordinates"),
            message,
        },
        DomainError::InvalidDateRange { .. } => ApiError::InvalidInput {
            field: String::from("end_date"),
            message,
        },
        DomainError::InvalidProgress(_) => ApiError::InvalidInput {
            field: String::from("progress"),
            message,
        },
        DomainError::InvalidEnumValue { kind, .. } => ApiError::InvalidInput {
            field: kind.replace(' ', "_"),
            message,
        },
        DomainError::DateParseError { .. } | DomainError::DateArithmeticOverflow { .. } => {
            ApiError::InvalidInput {
                field: String::from("date"),
                message,
            }
        }
        DomainError::InvalidSetting { setting, .. } => ApiError::InvalidInput {
            field: String::from(setting),
            message,
        },
    }
}

/// Translates a core error into an API error.
///
/// This translation is explicit and ensures core errors are not leaked directly.
#[must_use]
pub fn translate_core_error(err: CoreError) -> ApiError {
    match err {
        CoreError::DomainViolation(domain_err) => translate_domain_error(domain_err),
        CoreError::StoreConflict { .. } | CoreError::AllocationFailed { .. } => {
            ApiError::Conflict {
                message: err.to_string(),
            }
        }
        CoreError::ReportNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Work report"),
            message: format!("Work report {id} does not exist"),
        },
        CoreError::Store(msg) => ApiError::Internal {
            message: format!("Store error: {msg}"),
        },
    }
}

/// Translates a persistence error into an API error.
///
/// Errors with a caller-facing meaning keep it; everything else is internal.
#[must_use]
pub fn translate_persistence_error(err: PersistenceError) -> ApiError {
    match err {
        PersistenceError::OperatorNotFound(msg) => ApiError::ResourceNotFound {
            resource_type: String::from("Operator"),
            message: msg,
        },
        PersistenceError::DuplicateOperator(email) => ApiError::DomainRuleViolation {
            rule: String::from("unique_email"),
            message: format!("An operator with email '{email}' already exists"),
        },
        PersistenceError::OperatorReferenced { operator_id } => ApiError::DomainRuleViolation {
            rule: String::from("operator_not_referenced"),
            message: format!("Cannot delete operator {operator_id}: referenced by work reports"),
        },
        PersistenceError::ReportNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Work report"),
            message: format!("Work report {id} does not exist"),
        },
        PersistenceError::DuplicateReportCode { .. } => ApiError::Conflict {
            message: err.to_string(),
        },
        PersistenceError::NotificationNotFound(id) => ApiError::ResourceNotFound {
            resource_type: String::from("Notification"),
            message: format!("Notification {id} does not exist"),
        },
        _ => ApiError::Internal {
            message: err.to_string(),
        },
    }
}
