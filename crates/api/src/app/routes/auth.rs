//! Public authentication endpoints.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};

use aula_academy::NewUser;

use crate::app::dto::{self, LoginRequest};
use crate::app::errors::ServiceError;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/register", post(register))
}

/// POST /auth/login - exchange credentials for a bearer token
pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(body) = body?;
    let session = services.login(&body.email, &body.password).await?;
    Ok(Json(dto::session_to_json(&session)?).into_response())
}

/// POST /auth/register - student self-registration
pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<NewUser>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(body) = body?;
    let session = services.register(body).await?;
    Ok((StatusCode::CREATED, Json(dto::session_to_json(&session)?)).into_response())
}
