// Copyright (C) 2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

//! Capability computation for authorization-aware UI gating.
//!
//! Capabilities tell a client which actions an operator may attempt. They
//! are advisory only; every handler still performs its own authorization.

use crate::auth::{AuthenticatedActor, Role};
use crate::request_response::{Capability, GlobalCapabilities, OperatorCapabilities};
use pep_report_persistence::{OperatorData, Persistence};

/// Computes global capabilities for an authenticated operator.
///
/// # Arguments
///
/// * `actor` - The authenticated actor
/// * `operator` - The operator data
///
/// # Returns
///
/// A `GlobalCapabilities` struct with all capability flags set.
#[must_use]
pub const fn compute_global_capabilities(
    actor: &AuthenticatedActor,
    operator: &OperatorData,
) -> GlobalCapabilities {
    if operator.is_disabled {
        return GlobalCapabilities {
            can_manage_operators: Capability::Denied,
            can_create_reports: Capability::Denied,
            can_delete_reports: Capability::Denied,
            can_export_reports: Capability::Denied,
            can_read_settings: Capability::Denied,
            can_write_settings: Capability::Denied,
        };
    }

    match actor.role {
        Role::Admin => GlobalCapabilities {
            can_manage_operators: Capability::Allowed,
            can_create_reports: Capability::Allowed,
            can_delete_reports: Capability::Allowed,
            can_export_reports: Capability::Allowed,
            can_read_settings: Capability::Allowed,
            can_write_settings: Capability::Allowed,
        },
        Role::Supervisor => GlobalCapabilities {
            can_manage_operators: Capability::Denied,
            can_create_reports: Capability::Allowed,
            can_delete_reports: Capability::Denied,
            can_export_reports: Capability::Allowed,
            can_read_settings: Capability::Allowed,
            can_write_settings: Capability::Denied,
        },
        Role::Worker => GlobalCapabilities {
            can_manage_operators: Capability::Denied,
            can_create_reports: Capability::Allowed,
            can_delete_reports: Capability::Denied,
            can_export_reports: Capability::Allowed,
            can_read_settings: Capability::Denied,
            can_write_settings: Capability::Denied,
        },
    }
}

/// Returns true if `target` is the only enabled admin.
///
/// # Errors
///
/// Returns an error if the admin count cannot be read.
pub fn is_last_active_admin(
    persistence: &mut Persistence,
    target: &OperatorData,
) -> Result<bool, String> {
    if target.role != Role::Admin.as_str() || target.is_disabled {
        return Ok(false);
    }
    let active_admin_count: i64 = persistence
        .count_active_admin_operators()
        .map_err(|e| format!("Failed to count active admins: {e}"))?;
    Ok(active_admin_count <= 1)
}

/// Computes what `actor` may do to `target_operator`.
///
/// Only admins act on other operators. Nobody may disable or delete their
/// own account or the last enabled admin.
///
/// # Errors
///
/// Returns an error if database queries fail.
pub fn compute_operator_capabilities(
    actor: &AuthenticatedActor,
    actor_operator: &OperatorData,
    target_operator: &OperatorData,
    persistence: &mut Persistence,
) -> Result<OperatorCapabilities, String> {
    if actor_operator.is_disabled || actor.role != Role::Admin {
        return Ok(OperatorCapabilities {
            can_disable: Capability::Denied,
            can_delete: Capability::Denied,
            can_reset_password: Capability::Denied,
        });
    }

    let is_self: bool = target_operator.operator_id == actor.operator_id;
    let protected: bool = is_self || is_last_active_admin(persistence, target_operator)?;

    Ok(OperatorCapabilities {
        can_disable: Capability::from_bool(!protected),
        can_delete: Capability::from_bool(!protected),
        can_reset_password: Capability::Allowed,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn create_operator_data(operator_id: i64, role: Role, is_disabled: bool) -> OperatorData {
        OperatorData {
            operator_id,
            email: format!("op{operator_id}@pep.co.id"),
            display_name: String::from("Test Operator"),
            password_hash: String::from("hash"),
            role: String::from(role.as_str()),
            phone: None,
            department: None,
            position: None,
            is_disabled,
            created_at: String::from("2026-01-01T00:00:00Z"),
            disabled_at: None,
            last_login_at: None,
        }
    }

    fn actor_for(operator: &OperatorData, role: Role) -> AuthenticatedActor {
        AuthenticatedActor::new(operator.operator_id, operator.email.clone(), role)
    }

    #[test]
    fn test_admin_has_all_global_capabilities() {
        let operator: OperatorData = create_operator_data(1, Role::Admin, false);
        let caps: GlobalCapabilities =
            compute_global_capabilities(&actor_for(&operator, Role::Admin), &operator);

        assert!(caps.can_manage_operators.is_allowed());
        assert!(caps.can_delete_reports.is_allowed());
        assert!(caps.can_write_settings.is_allowed());
    }

    #[test]
    fn test_supervisor_reads_but_does_not_write_settings() {
        let operator: OperatorData = create_operator_data(2, Role::Supervisor, false);
        let caps: GlobalCapabilities =
            compute_global_capabilities(&actor_for(&operator, Role::Supervisor), &operator);

        assert!(caps.can_read_settings.is_allowed());
        assert!(!caps.can_write_settings.is_allowed());
        assert!(!caps.can_manage_operators.is_allowed());
        assert!(caps.can_create_reports.is_allowed());
    }

    #[test]
    fn test_worker_cannot_read_settings() {
        let operator: OperatorData = create_operator_data(3, Role::Worker, false);
        let caps: GlobalCapabilities =
            compute_global_capabilities(&actor_for(&operator, Role::Worker), &operator);

        assert!(!caps.can_read_settings.is_allowed());
        assert!(!caps.can_delete_reports.is_allowed());
        assert!(caps.can_export_reports.is_allowed());
    }

    #[test]
    fn test_disabled_operator_has_no_capabilities() {
        let operator: OperatorData = create_operator_data(1, Role::Admin, true);
        let caps: GlobalCapabilities =
            compute_global_capabilities(&actor_for(&operator, Role::Admin), &operator);

        assert!(!caps.can_manage_operators.is_allowed());
        assert!(!caps.can_create_reports.is_allowed());
    }

    #[test]
    fn test_admin_cannot_disable_self() {
        let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
        let admin: OperatorData = create_operator_data(1, Role::Admin, false);

        let caps: OperatorCapabilities = compute_operator_capabilities(
            &actor_for(&admin, Role::Admin),
            &admin,
            &admin,
            &mut persistence,
        )
        .unwrap();

        assert!(!caps.can_disable.is_allowed());
        assert!(!caps.can_delete.is_allowed());
        assert!(caps.can_reset_password.is_allowed());
    }

    #[test]
    fn test_admin_can_disable_worker() {
        let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
        let admin: OperatorData = create_operator_data(1, Role::Admin, false);
        let worker: OperatorData = create_operator_data(2, Role::Worker, false);

        let caps: OperatorCapabilities = compute_operator_capabilities(
            &actor_for(&admin, Role::Admin),
            &admin,
            &worker,
            &mut persistence,
        )
        .unwrap();

        assert!(caps.can_disable.is_allowed());
        assert!(caps.can_delete.is_allowed());
    }

    #[test]
    fn test_supervisor_has_no_operator_capabilities() {
        let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
        let supervisor: OperatorData = create_operator_data(2, Role::Supervisor, false);
        let worker: OperatorData = create_operator_data(3, Role::Worker, false);

        let caps: OperatorCapabilities = compute_operator_capabilities(
            &actor_for(&supervisor, Role::Supervisor),
            &supervisor,
            &worker,
            &mut persistence,
        )
        .unwrap();

        assert!(!caps.can_disable.is_allowed());
        assert!(!caps.can_reset_password.is_allowed());
    }

    #[test]
    fn test_last_active_admin_is_protected() {
        let mut persistence: Persistence = Persistence::new_in_memory().unwrap();
        let admin_id: i64 = persistence
            .create_operator("boss@pep.co.id", "Boss", "password123", "admin")
            .unwrap();
        let stored_admin: OperatorData = persistence.get_operator_by_id(admin_id).unwrap().unwrap();

        assert!(is_last_active_admin(&mut persistence, &stored_admin).unwrap());

        persistence
            .create_operator("second@pep.co.id", "Second", "password123", "admin")
            .unwrap();

        assert!(!is_last_active_admin(&mut persistence, &stored_admin).unwrap());
    }
}
