use aula_auth::{Principal, Role};
use aula_core::UserId;

/// Authenticated caller of a request, derived from validated JWT claims.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    user_id: UserId,
    role: Role,
}

impl PrincipalContext {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Resolve the role's permissions for authorization checks.
    pub fn principal(&self) -> Principal {
        Principal::from_role(self.user_id, self.role)
    }
}
