use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use aula_academy::NewForm;
use aula_auth::Model;
use aula_core::FormId;

use crate::app::dto::{self, ReplaceStagesRequest, StageAnswersRequest};
use crate::app::errors::ServiceError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_forms).post(create_form))
        .route("/:id", get(get_form).patch(update_form).delete(delete_form))
        .route("/:id/stages", put(replace_stages))
        .route("/:id/stages/:index/validate", post(validate_stage))
}

pub async fn list_forms(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<Response, ServiceError> {
    let forms = services.list_forms(&principal.principal()).await?;
    Ok(Json(dto::items(principal.role(), Model::Form, &forms)?).into_response())
}

pub async fn get_form(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id: FormId = dto::parse_id(&id)?;
    let form = services.get_form(&principal.principal(), id).await?;
    Ok(Json(dto::view(principal.role(), Model::Form, &form)?).into_response())
}

pub async fn create_form(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NewForm>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(body) = body?;
    let form = services.create_form(&principal.principal(), body).await?;
    Ok((StatusCode::CREATED, Json(dto::view(principal.role(), Model::Form, &form)?)).into_response())
}

pub async fn update_form(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let id: FormId = dto::parse_id(&id)?;
    let Json(patch) = body?;
    let form = services.update_form(&principal.principal(), id, &patch).await?;
    Ok(Json(dto::view(principal.role(), Model::Form, &form)?).into_response())
}

/// PUT /forms/:id/stages - replace the whole stage structure
pub async fn replace_stages(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<ReplaceStagesRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let id: FormId = dto::parse_id(&id)?;
    let Json(body) = body?;
    let form = services
        .replace_stages(&principal.principal(), id, body.stages)
        .await?;
    Ok(Json(dto::view(principal.role(), Model::Form, &form)?).into_response())
}

pub async fn delete_form(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id: FormId = dto::parse_id(&id)?;
    services.delete_form(&principal.principal(), id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

/// POST /forms/:id/stages/:index/validate - check one stage of answers
pub async fn validate_stage(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, index)): Path<(String, String)>,
    body: Result<Json<StageAnswersRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let id: FormId = dto::parse_id(&id)?;
    let index: usize = index
        .parse()
        .map_err(|_| ServiceError::BadRequest(format!("stage index '{index}' is not a number")))?;
    let Json(body) = body?;
    services
        .validate_form_stage(&principal.principal(), id, index, &body.answers)
        .await?;
    Ok(Json(json!({ "stage": index, "valid": true })).into_response())
}
