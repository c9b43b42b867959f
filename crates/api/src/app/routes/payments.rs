use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::Value;

use aula_academy::NewPayment;
use aula_auth::Model;
use aula_core::PaymentId;

use crate::app::dto::{self, PaymentFilter};
use crate::app::errors::ServiceError;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_payments).post(create_payment))
        .route("/:id", get(get_payment).patch(update_payment))
}

pub async fn list_payments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<PaymentFilter>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(filter) = query?;
    let payments = services
        .list_payments(&principal.principal(), filter.enrollment_id)
        .await?;
    Ok(Json(dto::items(principal.role(), Model::Payment, &payments)?).into_response())
}

pub async fn get_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id: PaymentId = dto::parse_id(&id)?;
    let payment = services.get_payment(&principal.principal(), id).await?;
    Ok(Json(dto::view(principal.role(), Model::Payment, &payment)?).into_response())
}

pub async fn create_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<NewPayment>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(body) = body?;
    let payment = services.create_payment(&principal.principal(), body).await?;
    Ok((StatusCode::CREATED, Json(dto::view(principal.role(), Model::Payment, &payment)?)).into_response())
}

/// PATCH /payments/:id - review a payment (approve, reject, refund)
pub async fn update_payment(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let id: PaymentId = dto::parse_id(&id)?;
    let Json(patch) = body?;
    let payment = services.update_payment(&principal.principal(), id, &patch).await?;
    Ok(Json(dto::view(principal.role(), Model::Payment, &payment)?).into_response())
}
