use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use aula_academy::{CommissionDraft, RescheduleInput};
use aula_auth::Model;
use aula_core::CommissionId;

use crate::app::dto::{self, CommissionFilter, WizardValidateRequest};
use crate::app::errors::ServiceError;
use crate::app::services::{AppServices, Preinscription};
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_commissions).post(create_commission))
        .route("/wizard/validate", post(validate_wizard_step))
        .route(
            "/:id",
            get(get_commission).patch(update_commission).delete(delete_commission),
        )
        .route("/:id/schedule", put(reschedule_commission))
        .route("/:id/calendar", get(commission_calendar))
        .route("/:id/enrollments", get(commission_enrollments))
        .route("/:id/preinscriptions", post(preinscribe))
}

pub async fn list_commissions(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    query: Result<Query<CommissionFilter>, QueryRejection>,
) -> Result<Response, ServiceError> {
    let Query(filter) = query?;
    let commissions = services
        .list_commissions(&principal.principal(), filter.course_id)
        .await?;
    Ok(Json(dto::commission_items(principal.role(), &commissions)?).into_response())
}

pub async fn get_commission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id: CommissionId = dto::parse_id(&id)?;
    let commission = services.get_commission(&principal.principal(), id).await?;
    Ok(Json(dto::commission_view(principal.role(), &commission)?).into_response())
}

/// POST /commissions - one-shot create from a complete wizard draft
pub async fn create_commission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<CommissionDraft>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(draft) = body?;
    let commission = services.create_commission(&principal.principal(), draft).await?;
    Ok((
        StatusCode::CREATED,
        Json(dto::commission_view(principal.role(), &commission)?),
    )
        .into_response())
}

/// POST /commissions/wizard/validate - check one step, answer with the next
pub async fn validate_wizard_step(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    body: Result<Json<WizardValidateRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let Json(body) = body?;
    let next = services
        .validate_wizard_step(&principal.principal(), body.step, body.data, body.context)
        .await?;
    Ok(Json(json!({
        "step": body.step,
        "valid": true,
        "next": next,
    }))
    .into_response())
}

pub async fn update_commission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let id: CommissionId = dto::parse_id(&id)?;
    let Json(patch) = body?;
    let commission = services
        .update_commission(&principal.principal(), id, &patch)
        .await?;
    Ok(Json(dto::commission_view(principal.role(), &commission)?).into_response())
}

/// GET /commissions/:id/calendar - every class date plus the minute totals
pub async fn commission_calendar(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id: CommissionId = dto::parse_id(&id)?;
    let commission = services.get_commission(&principal.principal(), id).await?;
    Ok(Json(json!({
        "commission_id": commission.id,
        "weekly_minutes": commission.weekly_minutes(),
        "total_minutes": commission.total_minutes(),
        "class_dates": commission.class_dates(),
    }))
    .into_response())
}

/// PUT /commissions/:id/schedule - replace dates and sessions
pub async fn reschedule_commission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<RescheduleInput>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let id: CommissionId = dto::parse_id(&id)?;
    let Json(input) = body?;
    let commission = services
        .reschedule_commission(&principal.principal(), id, input)
        .await?;
    Ok(Json(dto::commission_view(principal.role(), &commission)?).into_response())
}

pub async fn delete_commission(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id: CommissionId = dto::parse_id(&id)?;
    services.delete_commission(&principal.principal(), id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn commission_enrollments(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Result<Response, ServiceError> {
    let id: CommissionId = dto::parse_id(&id)?;
    let enrollments = services
        .commission_enrollments(&principal.principal(), id)
        .await?;
    Ok(Json(dto::items(principal.role(), Model::Enrollment, &enrollments)?).into_response())
}

/// POST /commissions/:id/preinscriptions
pub async fn preinscribe(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    body: Result<Json<Preinscription>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let id: CommissionId = dto::parse_id(&id)?;
    let Json(request) = body?;
    let (enrollment, response) = services
        .preinscribe(&principal.principal(), id, request)
        .await?;

    let response = match &response {
        Some(r) => dto::view(principal.role(), Model::Response, r)?,
        None => Value::Null,
    };
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "enrollment": dto::view(principal.role(), Model::Enrollment, &enrollment)?,
            "response": response,
        })),
    )
        .into_response())
}
