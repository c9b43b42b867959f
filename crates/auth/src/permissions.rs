use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "courses.read").
/// The wildcard permission `"*"` grants everything and is held by admins.
/// `*_own` permissions grant access limited to rows owned by the caller;
/// services enforce the ownership part.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const ALL: Permission = Permission::from_static("*");

pub const USERS_READ: Permission = Permission::from_static("users.read");
pub const USERS_WRITE: Permission = Permission::from_static("users.write");

pub const COURSES_READ: Permission = Permission::from_static("courses.read");
pub const COURSES_WRITE: Permission = Permission::from_static("courses.write");

pub const COMMISSIONS_READ: Permission = Permission::from_static("commissions.read");
pub const COMMISSIONS_WRITE: Permission = Permission::from_static("commissions.write");

pub const ENROLLMENTS_READ: Permission = Permission::from_static("enrollments.read");
pub const ENROLLMENTS_READ_OWN: Permission = Permission::from_static("enrollments.read_own");
pub const ENROLLMENTS_CREATE: Permission = Permission::from_static("enrollments.create");
pub const ENROLLMENTS_UPDATE: Permission = Permission::from_static("enrollments.update");

pub const PAYMENTS_READ: Permission = Permission::from_static("payments.read");
pub const PAYMENTS_READ_OWN: Permission = Permission::from_static("payments.read_own");
pub const PAYMENTS_CREATE: Permission = Permission::from_static("payments.create");
pub const PAYMENTS_UPDATE: Permission = Permission::from_static("payments.update");

pub const FORMS_READ: Permission = Permission::from_static("forms.read");
pub const FORMS_WRITE: Permission = Permission::from_static("forms.write");

pub const RESPONSES_READ: Permission = Permission::from_static("responses.read");
pub const RESPONSES_READ_OWN: Permission = Permission::from_static("responses.read_own");

pub const RBAC_READ: Permission = Permission::from_static("rbac.read");

/// Every concrete permission (the wildcard excluded), for audit listings.
pub const CATALOG: &[Permission] = &[
    USERS_READ,
    USERS_WRITE,
    COURSES_READ,
    COURSES_WRITE,
    COMMISSIONS_READ,
    COMMISSIONS_WRITE,
    ENROLLMENTS_READ,
    ENROLLMENTS_READ_OWN,
    ENROLLMENTS_CREATE,
    ENROLLMENTS_UPDATE,
    PAYMENTS_READ,
    PAYMENTS_READ_OWN,
    PAYMENTS_CREATE,
    PAYMENTS_UPDATE,
    FORMS_READ,
    FORMS_WRITE,
    RESPONSES_READ,
    RESPONSES_READ_OWN,
    RBAC_READ,
];

/// Static role → permission mapping.
pub fn role_permissions(role: Role) -> Vec<Permission> {
    match role {
        Role::Admin => vec![ALL],
        Role::Teacher => vec![
            USERS_READ,
            COURSES_READ,
            COMMISSIONS_READ,
            ENROLLMENTS_READ,
            ENROLLMENTS_UPDATE,
            PAYMENTS_READ,
            FORMS_READ,
            RESPONSES_READ,
        ],
        Role::Student => vec![
            COURSES_READ,
            COMMISSIONS_READ,
            ENROLLMENTS_READ_OWN,
            ENROLLMENTS_CREATE,
            ENROLLMENTS_UPDATE,
            PAYMENTS_READ_OWN,
            PAYMENTS_CREATE,
            FORMS_READ,
            RESPONSES_READ_OWN,
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_admin_holds_the_wildcard() {
        assert!(role_permissions(Role::Admin).iter().any(Permission::is_wildcard));
        assert!(!role_permissions(Role::Teacher).iter().any(Permission::is_wildcard));
        assert!(!role_permissions(Role::Student).iter().any(Permission::is_wildcard));
    }

    #[test]
    fn role_permissions_come_from_the_catalog() {
        for role in [Role::Teacher, Role::Student] {
            for perm in role_permissions(role) {
                assert!(CATALOG.contains(&perm), "{perm} missing from catalog");
            }
        }
    }
}
