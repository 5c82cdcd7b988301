// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Authentication and authorization for operators.

use pep_report_persistence::{OperatorData, Persistence, PersistenceError, SessionData};
use std::str::FromStr;
use time::format_description::well_known::Rfc3339;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};

pub use crate::error::AuthError;

/// Operator roles.
///
/// Roles determine what an authenticated operator may do. Every role may
/// create, edit and read work reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Administrator: manages operators, system settings and report deletion.
    Admin,
    /// Supervisor (person in charge of a job): receives report notifications
    /// and may read system settings.
    Supervisor,
    /// Field worker.
    Worker,
}

impl Role {
    /// Every role, in display order.
    pub const ALL: [Self; 3] = [Self::Admin, Self::Supervisor, Self::Worker];

    /// Returns the string stored in the `operators.role` column.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Supervisor => "supervisor",
            Self::Worker => "worker",
        }
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "supervisor" => Ok(Self::Supervisor),
            "worker" => Ok(Self::Worker),
            _ => Err(AuthError::AuthenticationFailed {
                reason: format!("Invalid role: {s}"),
            }),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated operator and their role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedActor {
    /// The operator's database ID.
    pub operator_id: i64,
    /// The operator's login email.
    pub email: String,
    /// The role assigned to this operator.
    pub role: Role,
}

impl AuthenticatedActor {
    /// Creates a new authenticated actor.
    ///
    /// # Arguments
    ///
    /// * `operator_id` - The operator's database ID
    /// * `email` - The operator's login email
    /// * `role` - The role assigned to this operator
    #[must_use]
    pub const fn new(operator_id: i64, email: String, role: Role) -> Self {
        Self {
            operator_id,
            email,
            role,
        }
    }
}

/// Authorization service for enforcing role-based access control.
pub struct AuthorizationService;

impl AuthorizationService {
    fn require_admin(actor: &AuthenticatedActor, action: &str) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin => Ok(()),
            Role::Supervisor | Role::Worker => Err(AuthError::Unauthorized {
                action: String::from(action),
                required_role: String::from("admin"),
            }),
        }
    }

    /// Checks if an actor may create, disable, enable, delete or reset
    /// other operators.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an admin.
    pub fn authorize_manage_operators(
        actor: &AuthenticatedActor,
        action: &str,
    ) -> Result<(), AuthError> {
        Self::require_admin(actor, action)
    }

    /// Checks if an actor may delete a work report.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an admin.
    pub fn authorize_delete_report(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "delete_report")
    }

    /// Checks if an actor may read the system settings.
    ///
    /// Admins and supervisors may read settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is a worker.
    pub fn authorize_read_settings(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        match actor.role {
            Role::Admin | Role::Supervisor => Ok(()),
            Role::Worker => Err(AuthError::Unauthorized {
                action: String::from("read_settings"),
                required_role: String::from("admin or supervisor"),
            }),
        }
    }

    /// Checks if an actor may change the system settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the actor is not an admin.
    pub fn authorize_write_settings(actor: &AuthenticatedActor) -> Result<(), AuthError> {
        Self::require_admin(actor, "write_settings")
    }
}

/// Session-based authentication.
pub struct AuthenticationService;

impl AuthenticationService {
    /// Session lifetime used when none is configured.
    pub const DEFAULT_SESSION_EXPIRATION: Duration = Duration::days(30);

    /// Verifies an operator's credentials and opens a session.
    ///
    /// # Arguments
    ///
    /// * `persistence` - The persistence layer
    /// * `email` - The operator's login email, matched case-insensitively
    /// * `password` - The plaintext password
    /// * `session_duration` - How long the new session stays valid
    ///
    /// # Returns
    ///
    /// A tuple of (`session_token`, `authenticated_actor`, `operator_data`)
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are wrong, the operator is
    /// disabled, or the session cannot be stored. Unknown emails and wrong
    /// passwords produce the same message.
    pub fn login(
        persistence: &mut Persistence,
        email: &str,
        password: &str,
        session_duration: Duration,
    ) -> Result<(String, AuthenticatedActor, OperatorData), AuthError> {
        let operator: OperatorData = persistence
            .get_operator_by_email(email)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| {
                debug!(email, "Login for unknown email");
                Self::invalid_credentials()
            })?;

        let password_ok: bool = persistence
            .verify_password(password, &operator.password_hash)
            .map_err(Self::map_persistence_error)?;
        if !password_ok {
            warn!(operator_id = operator.operator_id, "Login with wrong password");
            return Err(Self::invalid_credentials());
        }

        if operator.is_disabled {
            warn!(operator_id = operator.operator_id, "Login by disabled operator");
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Operator is disabled"),
            });
        }

        let role: Role = Role::from_str(&operator.role)?;
        let session_token: String = Self::generate_session_token();

        let expires_at: String = (OffsetDateTime::now_utc() + session_duration)
            .format(&Rfc3339)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to format expiration time: {e}"),
            })?;

        persistence
            .create_session(&session_token, operator.operator_id, &expires_at)
            .map_err(Self::map_persistence_error)?;
        persistence
            .update_last_login(operator.operator_id)
            .map_err(Self::map_persistence_error)?;

        info!(operator_id = operator.operator_id, role = %role, "Operator logged in");

        let actor: AuthenticatedActor =
            AuthenticatedActor::new(operator.operator_id, operator.email.clone(), role);
        Ok((session_token, actor, operator))
    }

    /// Validates a session token and returns the authenticated actor.
    ///
    /// An expired session is deleted as a side effect.
    ///
    /// # Returns
    ///
    /// A tuple of (`authenticated_actor`, `operator_data`)
    ///
    /// # Errors
    ///
    /// Returns an error if the session is unknown or expired, or the
    /// operator has been disabled.
    pub fn validate_session(
        persistence: &mut Persistence,
        session_token: &str,
    ) -> Result<(AuthenticatedActor, OperatorData), AuthError> {
        let session: SessionData = persistence
            .get_session_by_token(session_token)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Invalid session token"),
            })?;

        let expires_at: OffsetDateTime = OffsetDateTime::parse(&session.expires_at, &Rfc3339)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to parse session expiration: {e}"),
            })?;

        if OffsetDateTime::now_utc() > expires_at {
            persistence
                .delete_session(session_token)
                .map_err(Self::map_persistence_error)?;
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Session expired"),
            });
        }

        let operator: OperatorData = persistence
            .get_operator_by_id(session.operator_id)
            .map_err(Self::map_persistence_error)?
            .ok_or_else(|| AuthError::AuthenticationFailed {
                reason: String::from("Operator not found"),
            })?;

        if operator.is_disabled {
            return Err(AuthError::AuthenticationFailed {
                reason: String::from("Operator is disabled"),
            });
        }

        let role: Role = Role::from_str(&operator.role)?;

        persistence
            .update_session_activity(session.session_id)
            .map_err(Self::map_persistence_error)?;

        let actor: AuthenticatedActor =
            AuthenticatedActor::new(operator.operator_id, operator.email.clone(), role);
        Ok((actor, operator))
    }

    /// Logs out by deleting the session.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout fails.
    pub fn logout(persistence: &mut Persistence, session_token: &str) -> Result<(), AuthError> {
        persistence
            .delete_session(session_token)
            .map_err(|e| AuthError::AuthenticationFailed {
                reason: format!("Failed to delete session: {e}"),
            })
    }

    /// Generates an opaque 256-bit session token as lowercase hex.
    fn generate_session_token() -> String {
        format!(
            "{:032x}{:032x}",
            rand::random::<u128>(),
            rand::random::<u128>()
        )
    }

    fn invalid_credentials() -> AuthError {
        AuthError::AuthenticationFailed {
            reason: String::from("Invalid email or password"),
        }
    }

    /// Maps persistence errors to authentication errors.
    fn map_persistence_error(err: PersistenceError) -> AuthError {
        match err {
            PersistenceError::SessionExpired(msg) | PersistenceError::SessionNotFound(msg) => {
                AuthError::AuthenticationFailed { reason: msg }
            }
            _ => AuthError::AuthenticationFailed {
                reason: format!("Database error: {err}"),
            },
        }
    }
}
