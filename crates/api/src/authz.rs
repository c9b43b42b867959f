//! API-side authorization helpers.
//!
//! Coarse permissions guard every service entry point. Several resources come
//! in two flavours (`enrollments.read` vs `enrollments.read_own`); [`scope`]
//! resolves which one the caller holds so services can narrow row access.

use aula_auth::{authorize, AuthzError, Permission, Principal};
use aula_core::UserId;

/// Rows a caller may access.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Scope {
    All,
    Own(UserId),
}

impl Scope {
    pub fn allows(&self, owner: UserId) -> bool {
        match self {
            Scope::All => true,
            Scope::Own(me) => *me == owner,
        }
    }
}

/// `All` when the caller holds `full`, `Own` when it holds `own`.
pub fn scope(principal: &Principal, full: &Permission, own: &Permission) -> Result<Scope, AuthzError> {
    if principal.has(full) {
        return Ok(Scope::All);
    }
    authorize(principal, own)?;
    Ok(Scope::Own(principal.user_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_auth::permissions::{ENROLLMENTS_READ, ENROLLMENTS_READ_OWN, RESPONSES_READ, RESPONSES_READ_OWN};
    use aula_auth::Role;

    #[test]
    fn scopes_follow_role_permissions() {
        let admin = Principal::from_role(UserId::new(), Role::Admin);
        let teacher = Principal::from_role(UserId::new(), Role::Teacher);
        let student = Principal::from_role(UserId::new(), Role::Student);

        assert_eq!(scope(&admin, &ENROLLMENTS_READ, &ENROLLMENTS_READ_OWN), Ok(Scope::All));
        assert_eq!(scope(&teacher, &ENROLLMENTS_READ, &ENROLLMENTS_READ_OWN), Ok(Scope::All));
        assert_eq!(
            scope(&student, &RESPONSES_READ, &RESPONSES_READ_OWN),
            Ok(Scope::Own(student.user_id))
        );
        assert!(Scope::Own(student.user_id).allows(student.user_id));
        assert!(!Scope::Own(student.user_id).allows(teacher.user_id));
    }

    #[test]
    fn missing_both_permissions_is_forbidden() {
        let teacher = Principal::from_role(UserId::new(), Role::Teacher);
        let none = Permission::new("nothing.own");
        assert!(scope(&teacher, &Permission::new("nothing.all"), &none).is_err());
    }
}
