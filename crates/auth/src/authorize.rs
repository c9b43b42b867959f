use std::collections::{BTreeMap, HashSet};

use serde::Serialize;
use thiserror::Error;

use aula_core::UserId;

use crate::permissions::{self, Permission};
use crate::{role_permissions, Role};

/// A fully resolved principal for authorization decisions.
///
/// Construction of this object is decoupled from storage and transport: the
/// API derives it from validated JWT claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
    pub permissions: Vec<Permission>,
}

impl Principal {
    /// Resolve a principal's permissions from its role.
    pub fn from_role(user_id: UserId, role: Role) -> Self {
        Self {
            user_id,
            role,
            permissions: role_permissions(role),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Non-failing permission check (used to pick between full and own-row scopes).
    pub fn has(&self, required: &Permission) -> bool {
        authorize(self, required).is_ok()
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

/// Authorize a principal against a single permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    let perms: HashSet<&str> = principal.permissions.iter().map(|p| p.as_str()).collect();

    if perms.contains("*") || perms.contains(required.as_str()) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Role definition with its granted permissions (for audit/display).
#[derive(Debug, Clone, Serialize)]
pub struct RoleDefinition {
    pub name: &'static str,
    pub description: &'static str,
    pub permissions: Vec<String>,
}

/// Registry of all roles and the concrete permissions each one holds.
///
/// The wildcard is expanded against the permission catalog so the listing shows
/// what an admin can actually do.
#[derive(Debug, Clone, Serialize)]
pub struct RbacRegistry {
    pub roles: BTreeMap<&'static str, RoleDefinition>,
}

impl RbacRegistry {
    pub fn build() -> Self {
        let roles = Role::ALL
            .iter()
            .map(|role| {
                let granted = role_permissions(*role);
                let permissions = if granted.iter().any(Permission::is_wildcard) {
                    permissions::CATALOG.iter().map(|p| p.as_str().to_string()).collect()
                } else {
                    granted.iter().map(|p| p.as_str().to_string()).collect()
                };
                (
                    role.as_str(),
                    RoleDefinition {
                        name: role.as_str(),
                        description: role.description(),
                        permissions,
                    },
                )
            })
            .collect();

        Self { roles }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{COURSES_WRITE, ENROLLMENTS_CREATE, USERS_READ};

    #[test]
    fn admin_wildcard_allows_everything() {
        let p = Principal::from_role(UserId::new(), Role::Admin);
        for perm in permissions::CATALOG {
            assert_eq!(authorize(&p, perm), Ok(()));
        }
    }

    #[test]
    fn student_cannot_write_courses() {
        let p = Principal::from_role(UserId::new(), Role::Student);
        assert_eq!(
            authorize(&p, &COURSES_WRITE),
            Err(AuthzError::Forbidden("courses.write".to_string()))
        );
        assert!(p.has(&ENROLLMENTS_CREATE));
        assert!(!p.has(&USERS_READ));
    }

    #[test]
    fn registry_expands_admin_wildcard() {
        let registry = RbacRegistry::build();
        assert_eq!(registry.roles.len(), 3);
        assert_eq!(registry.roles["admin"].permissions.len(), permissions::CATALOG.len());
        assert!(registry.roles["teacher"].permissions.contains(&"enrollments.update".to_string()));
    }
}
