use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use thiserror::Error;

use aula_auth::{AuthzError, FieldPolicyError, JwtError, PasswordError};
use aula_core::{DomainError, ValidationErrors};
use aula_infra::StoreError;

/// Error returned by services and handlers.
///
/// Every variant maps to exactly one HTTP status in [`service_error_to_response`].
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    FieldPolicy(FieldPolicyError),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Internal(String),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn invalid(field: &str, msg: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::single(field, msg))
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(errors) => Self::Validation(errors),
            DomainError::InvariantViolation(msg) | DomainError::Conflict(msg) => Self::Conflict(msg),
            DomainError::InvalidId(msg) => Self::BadRequest(msg),
            DomainError::NotFound => Self::NotFound("not found".to_string()),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict { .. } => Self::Conflict(value.to_string()),
            StoreError::NotFound { .. } => Self::NotFound(value.to_string()),
            StoreError::Serialization(_) | StoreError::Backend(_) => Self::Internal(value.to_string()),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(value: AuthzError) -> Self {
        Self::Forbidden(value.to_string())
    }
}

impl From<FieldPolicyError> for ServiceError {
    fn from(value: FieldPolicyError) -> Self {
        match value {
            FieldPolicyError::NotAnObject => Self::BadRequest(value.to_string()),
            other => Self::FieldPolicy(other),
        }
    }
}

impl From<PasswordError> for ServiceError {
    fn from(value: PasswordError) -> Self {
        match value {
            PasswordError::TooShort(_) => Self::invalid("password", value.to_string()),
            PasswordError::Hash(msg) => Self::Internal(msg),
        }
    }
}

impl From<JwtError> for ServiceError {
    fn from(value: JwtError) -> Self {
        Self::Internal(value.to_string())
    }
}

impl From<JsonRejection> for ServiceError {
    fn from(value: JsonRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

impl From<QueryRejection> for ServiceError {
    fn from(value: QueryRejection) -> Self {
        Self::BadRequest(value.body_text())
    }
}

pub fn service_error_to_response(err: ServiceError) -> axum::response::Response {
    match err {
        ServiceError::Validation(errors) => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "message": errors.to_string(),
                "fields": errors,
            })),
        )
            .into_response(),
        ServiceError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, "bad_request", msg),
        ServiceError::Unauthorized(msg) => json_error(StatusCode::UNAUTHORIZED, "unauthorized", msg),
        ServiceError::Forbidden(msg) => json_error(StatusCode::FORBIDDEN, "forbidden", msg),
        ServiceError::FieldPolicy(e) => {
            let code = match e {
                FieldPolicyError::ValueNotAllowed { .. } => "value_not_allowed",
                _ => "field_not_editable",
            };
            (
                StatusCode::FORBIDDEN,
                axum::Json(json!({
                    "error": code,
                    "message": e.to_string(),
                    "field": e.field(),
                })),
            )
                .into_response()
        }
        ServiceError::NotFound(msg) => json_error(StatusCode::NOT_FOUND, "not_found", msg),
        ServiceError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        ServiceError::Internal(msg) => {
            tracing::error!(error = %msg, "internal error");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", "internal server error")
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        service_error_to_response(self)
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use aula_auth::{Model, Role};

    fn status(err: impl Into<ServiceError>) -> StatusCode {
        err.into().into_response().status()
    }

    #[test]
    fn status_mapping() {
        assert_eq!(status(DomainError::validation("name", "empty")), StatusCode::BAD_REQUEST);
        assert_eq!(status(DomainError::invalid_id("CourseId: bad")), StatusCode::BAD_REQUEST);
        assert_eq!(status(DomainError::conflict("taken")), StatusCode::CONFLICT);
        assert_eq!(status(AuthzError::Forbidden("x".into())), StatusCode::FORBIDDEN);
        assert_eq!(
            status(FieldPolicyError::FieldNotEditable {
                role: Role::Student,
                model: Model::User,
                field: "role".into()
            }),
            StatusCode::FORBIDDEN
        );
        assert_eq!(status(FieldPolicyError::NotAnObject), StatusCode::BAD_REQUEST);
        assert_eq!(
            status(StoreError::NotFound { kind: "course", id: uuid::Uuid::nil() }),
            StatusCode::NOT_FOUND
        );
        assert_eq!(status(StoreError::Backend("down".into())), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status(PasswordError::TooShort(8)), StatusCode::BAD_REQUEST);
    }
}
