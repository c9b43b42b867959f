use std::sync::Arc;

use axum::{
    extract::{rejection::QueryRejection, Extension, Path, Query},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use aula_auth::Model;
use aula_core::ResponseId;

use crate::app::dto::{self, ByCommission};
use crate::app::errors::ServiceError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_responses))
        .route("/:id", get(get_response))
}

pub async fn list_responses(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<ByCommission>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(filter) = query?;
    let responses = services
        .list_responses(&principal.principal(), filter.commission_id)
        .await?;
    Ok(Json(dto::items(principal.role(), Model::Response, &responses)?).into_response())
}

pub async fn get_response(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id: ResponseId = dto::parse_id(&id)?;
    let response = services.get_response(&principal.principal(), id).await?;
    Ok(Json(dto::view(principal.role(), Model::Response, &response)?).into_response())
}
