//! Endpoints about the caller: profile, effective permissions and the menu
//! the front end renders for them.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use serde_json::{json, Value};

use aula_auth::fields::summary;
use aula_auth::permissions::{
    COMMISSIONS_READ, COURSES_READ, ENROLLMENTS_READ, ENROLLMENTS_READ_OWN, FORMS_WRITE, PAYMENTS_READ,
    PAYMENTS_READ_OWN, RBAC_READ, RESPONSES_READ, RESPONSES_READ_OWN, USERS_READ,
};
use aula_auth::{Model, Permission, Principal, RbacRegistry};

use crate::app::dto;
use crate::app::errors::ServiceError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(get_me).patch(update_me))
        .route("/permissions", get(my_permissions))
}

pub async fn get_me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ServiceError> {
    let user = services.get_user(&principal.principal(), principal.user_id()).await?;
    Ok(Json(dto::view(principal.role(), Model::User, &user)?).into_response())
}

pub async fn update_me(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(patch) = body?;
    let user = services
        .update_user(&principal.principal(), principal.user_id(), &patch)
        .await?;
    Ok(Json(dto::view(principal.role(), Model::User, &user)?).into_response())
}

/// GET /me/permissions - coarse permissions plus the field policy of the
/// caller's role
pub async fn my_permissions(Extension(principal): Extension<PrincipalContext>) -> Response {
    let registry = RbacRegistry::build();
    let permissions = registry
        .roles
        .get(principal.role().as_str())
        .map(|r| r.permissions.clone())
        .unwrap_or_default();

    Json(json!({
        "role": principal.role().as_str(),
        "permissions": permissions,
        "fields": summary(principal.role()),
    }))
    .into_response()
}

#[derive(Debug, Clone, Serialize)]
pub struct MenuEntry {
    pub key: &'static str,
    pub label: &'static str,
    pub path: &'static str,
}

/// Menu entries and the permissions that unlock them (any of).
const MENU: &[(MenuEntry, &[Permission])] = &[
    (
        MenuEntry { key: "courses", label: "Courses", path: "/courses" },
        &[COURSES_READ],
    ),
    (
        MenuEntry { key: "commissions", label: "Commissions", path: "/commissions" },
        &[COMMISSIONS_READ],
    ),
    (
        MenuEntry { key: "enrollments", label: "Enrollments", path: "/enrollments" },
        &[ENROLLMENTS_READ, ENROLLMENTS_READ_OWN],
    ),
    (
        MenuEntry { key: "payments", label: "Payments", path: "/payments" },
        &[PAYMENTS_READ, PAYMENTS_READ_OWN],
    ),
    (
        MenuEntry { key: "responses", label: "Responses", path: "/responses" },
        &[RESPONSES_READ, RESPONSES_READ_OWN],
    ),
    (
        MenuEntry { key: "forms", label: "Forms", path: "/forms" },
        &[FORMS_WRITE],
    ),
    (
        MenuEntry { key: "users", label: "Users", path: "/users" },
        &[USERS_READ],
    ),
    (
        MenuEntry { key: "rbac", label: "Roles", path: "/rbac/roles" },
        &[RBAC_READ],
    ),
];

pub fn menu_for(principal: &Principal) -> Vec<MenuEntry> {
    MENU.iter()
        .filter(|(_, any_of)| any_of.iter().any(|p| principal.has(p)))
        .map(|(entry, _)| entry.clone())
        .collect()
}

/// GET /navigation
pub async fn navigation(Extension(principal): Extension<PrincipalContext>) -> Response {
    let profile = MenuEntry { key: "profile", label: "My profile", path: "/me" };
    let mut entries = vec![profile];
    entries.extend(menu_for(&principal.principal()));
    Json(json!({ "role": principal.role().as_str(), "items": entries })).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_auth::Role;
    use aula_core::UserId;

    fn keys(role: Role) -> Vec<&'static str> {
        menu_for(&Principal::from_role(UserId::new(), role))
            .into_iter()
            .map(|e| e.key)
            .collect()
    }

    #[test]
    fn menu_follows_permissions() {
        assert_eq!(keys(Role::Admin).len(), MENU.len());
        assert_eq!(
            keys(Role::Student),
            vec!["courses", "commissions", "enrollments", "payments", "responses"]
        );
        let teacher = keys(Role::Teacher);
        assert!(teacher.contains(&"users"));
        assert!(!teacher.contains(&"forms"));
        assert!(!teacher.contains(&"rbac"));
    }
}
