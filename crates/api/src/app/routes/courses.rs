use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use aula_academy::NewCourse;
use aula_auth::Model;
use aula_core::CourseId;

use crate::app::dto;
use crate::app::errors::ServiceError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_courses).post(create_course))
        .route("/:id", get(get_course).patch(update_course).delete(delete_course))
}

pub async fn list_courses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ServiceError> {
    let courses = services.list_courses(&principal.principal()).await?;
    Ok(Json(dto::items(principal.role(), Model::Course, &courses)?).into_response())
}

pub async fn get_course(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id: CourseId = dto::parse_id(&id)?;
    let course = services.get_course(&principal.principal(), id).await?;
    Ok(Json(dto::view(principal.role(), Model::Course, &course)?).into_response())
}

pub async fn create_course(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NewCourse>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(body) = body?;
    let course = services.create_course(&principal.principal(), body).await?;
    Ok((StatusCode::CREATED, Json(dto::view(principal.role(), Model::Course, &course)?)).into_response())
}

pub async fn update_course(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let id: CourseId = dto::parse_id(&id)?;
    let Json(patch) = body?;
    let course = services.update_course(&principal.principal(), id, &patch).await?;
    Ok(Json(dto::view(principal.role(), Model::Course, &course)?).into_response())
}

pub async fn delete_course(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id: CourseId = dto::parse_id(&id)?;
    services.delete_course(&principal.principal(), id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
