//! `aula-auth` - authentication and authorization boundary.
//!
//! This crate is intentionally decoupled from HTTP and storage. It owns:
//! - roles and the coarse role → permission mapping used to guard routes,
//! - JWT claims, HS256 token issuance/validation and password hashing,
//! - the attribute-level field policy (which fields each role may see/edit).

pub mod authorize;
pub mod claims;
pub mod fields;
pub mod jwt;
pub mod password;
pub mod permissions;
pub mod roles;

pub use authorize::{authorize, AuthzError, Principal, RbacRegistry, RoleDefinition};
pub use claims::{validate_claims, JwtClaims, TokenValidationError};
pub use fields::{FieldPolicyError, FieldRule, Model, ModelPolicySummary};
pub use jwt::{Hs256JwtIssuer, Hs256JwtValidator, JwtError, JwtValidator};
pub use password::{hash_password, verify_password, PasswordError};
pub use permissions::{role_permissions, Permission};
pub use roles::Role;
