use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use aula_auth::Model;
use aula_core::EnrollmentId;

use crate::app::dto::{self, ByCommission};
use crate::app::errors::ServiceError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_enrollments))
        .route("/:id", get(get_enrollment).patch(update_enrollment))
}

pub async fn list_enrollments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<ByCommission>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(filter) = query?;
    let enrollments = services
        .list_enrollments(&principal.principal(), filter.commission_id)
        .await?;
    Ok(Json(dto::items(principal.role(), Model::Enrollment, &enrollments)?).into_response())
}

pub async fn get_enrollment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id: EnrollmentId = dto::parse_id(&id)?;
    let enrollment = services.get_enrollment(&principal.principal(), id).await?;
    Ok(Json(dto::view(principal.role(), Model::Enrollment, &enrollment)?).into_response())
}

pub async fn update_enrollment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let id: EnrollmentId = dto::parse_id(&id)?;
    let Json(patch) = body?;
    let enrollment = services
        .update_enrollment(&principal.principal(), id, &patch)
        .await?;
    Ok(Json(dto::view(principal.role(), Model::Enrollment, &enrollment)?).into_response())
}
