//! RBAC audit endpoints: which roles exist and what they may do.

use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use aula_auth::permissions::{CATALOG, RBAC_READ};
use aula_auth::{authorize, RbacRegistry};

use crate::app::errors::ServiceError;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/roles", get(list_roles))
        .route("/roles/:name", get(get_role))
        .route("/permissions", get(list_permissions))
}

/// GET /rbac/roles - every role with its description and permissions
pub async fn list_roles(Extension(principal): Extension<PrincipalContext>) -> Result<Response, ServiceError> {
    authorize(&principal.principal(), &RBAC_READ)?;
    let registry = RbacRegistry::build();
    let roles: Vec<_> = registry.roles.values().cloned().collect();
    Ok(Json(json!({ "roles": roles })).into_response())
}

pub async fn get_role(
    Extension(principal): Extension<PrincipalContext>,
    Path(name): Path<String>,
) -> Result<Response, ServiceError> {
    authorize(&principal.principal(), &RBAC_READ)?;
    let registry = RbacRegistry::build();
    match registry.roles.get(name.as_str()) {
        Some(role) => Ok(Json(json!({ "role": role })).into_response()),
        None => Err(ServiceError::not_found("role")),
    }
}

pub async fn list_permissions(Extension(principal): Extension<PrincipalContext>) -> Result<Response, ServiceError> {
    authorize(&principal.principal(), &RBAC_READ)?;
    let permissions: Vec<&str> = CATALOG.iter().map(|p| p.as_str()).collect();
    Ok(Json(json!({ "permissions": permissions })).into_response())
}
