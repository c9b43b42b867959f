use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use aula_academy::NewUser;
use aula_auth::Model;
use aula_core::UserId;

use crate::app::dto;
use crate::app::errors::ServiceError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user).patch(update_user).delete(delete_user))
}

pub async fn list_users(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ServiceError> {
    let users = services.list_users(&principal.principal()).await?;
    Ok(Json(dto::items(principal.role(), Model::User, &users)?).into_response())
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id: UserId = dto::parse_id(&id)?;
    let user = services.get_user(&principal.principal(), id).await?;
    Ok(Json(dto::view(principal.role(), Model::User, &user)?).into_response())
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(body) = body?;
    let user = services.create_user(&principal.principal(), body).await?;
    Ok((StatusCode::CREATED, Json(dto::view(principal.role(), Model::User, &user)?)).into_response())
}

pub async fn update_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let id: UserId = dto::parse_id(&id)?;
    let Json(patch) = body?;
    let user = services.update_user(&principal.principal(), id, &patch).await?;
    Ok(Json(dto::view(principal.role(), Model::User, &user)?).into_response())
}

pub async fn delete_user(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id: UserId = dto::parse_id(&id)?;
    services.delete_user(&principal.principal(), id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
