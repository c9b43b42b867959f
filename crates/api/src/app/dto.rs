use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use aula_academy::{Answers, Commission, CommissionDraft, NewStage, WizardStep};
use aula_auth::fields::filter_view;
use aula_auth::{Model, Role};
use aula_core::{CommissionId, CourseId, DomainError, EnrollmentId};

use crate::app::errors::ServiceError;
use crate::app::services::Session;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// One wizard step plus whatever the client collected in earlier steps.
#[derive(Debug, Deserialize)]
pub struct WizardValidateRequest {
    pub step: WizardStep,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub context: CommissionDraft,
}

#[derive(Debug, Deserialize)]
pub struct ReplaceStagesRequest {
    pub stages: Vec<NewStage>,
}

#[derive(Debug, Deserialize)]
pub struct StageAnswersRequest {
    #[serde(default)]
    pub answers: Answers,
}

// -------------------------
// Query filters
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct CommissionFilter {
    pub course_id: Option<CourseId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ByCommission {
    pub commission_id: Option<CommissionId>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PaymentFilter {
    pub enrollment_id: Option<EnrollmentId>,
}

// -------------------------
// Views
// -------------------------

/// Parse a path segment into a typed id (400 on failure).
pub fn parse_id<T>(raw: &str) -> Result<T, ServiceError>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(ServiceError::from)
}

/// Serialize a record and strip what `role` may not see.
pub fn view<T: Serialize>(role: Role, model: Model, record: &T) -> Result<Value, ServiceError> {
    let value = serde_json::to_value(record)
        .map_err(|e| ServiceError::Internal(format!("failed to serialize {}: {e}", model.as_str())))?;
    Ok(filter_view(role, model, value))
}

/// `{"items": [...]}` with every element filtered.
pub fn items<T: Serialize>(role: Role, model: Model, records: &[T]) -> Result<Value, ServiceError> {
    let items = records
        .iter()
        .map(|r| view(role, model, r))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({ "items": items }))
}

/// A commission with its derived calendar figures, filtered like any record.
pub fn commission_view(role: Role, commission: &Commission) -> Result<Value, ServiceError> {
    let mut value = serde_json::to_value(commission)
        .map_err(|e| ServiceError::Internal(format!("failed to serialize commission: {e}")))?;
    if let Some(obj) = value.as_object_mut() {
        obj.insert("weekly_minutes".into(), json!(commission.weekly_minutes()));
        obj.insert("class_count".into(), json!(commission.class_count()));
        obj.insert("total_minutes".into(), json!(commission.total_minutes()));
    }
    Ok(filter_view(role, Model::Commission, value))
}

pub fn commission_items(role: Role, commissions: &[Commission]) -> Result<Value, ServiceError> {
    let items = commissions
        .iter()
        .map(|c| commission_view(role, c))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(json!({ "items": items }))
}

pub fn session_to_json(session: &Session) -> Result<Value, ServiceError> {
    Ok(json!({
        "token": session.token,
        "token_type": "Bearer",
        "expires_at": session.expires_at.to_rfc3339(),
        "user": view(session.user.role, Model::User, &session.user)?,
    }))
}
