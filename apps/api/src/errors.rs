use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::collaborator::CollaboratorError;
use crate::session::SessionError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Collaborator error: {0}")]
    Upstream(CollaboratorError),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NoActiveSession => AppError::NotFound(err.to_string()),
            SessionError::DeleteInFlight(_) => AppError::Conflict(err.to_string()),
            SessionError::Remote(e) => AppError::Upstream(e),
            SessionError::Task(msg) => AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "DELETE_IN_FLIGHT", msg.clone()),
            AppError::Upstream(e) => {
                tracing::error!("Collaborator error: {e}");
                match e {
                    CollaboratorError::Timeout(_) => (
                        StatusCode::GATEWAY_TIMEOUT,
                        "COLLABORATOR_TIMEOUT",
                        e.to_string(),
                    ),
                    CollaboratorError::Rejected { .. } => {
                        (StatusCode::BAD_GATEWAY, "COLLABORATOR_REJECTED", e.to_string())
                    }
                    _ => (
                        StatusCode::BAD_GATEWAY,
                        "COLLABORATOR_UNAVAILABLE",
                        "The screening service could not be reached".to_string(),
                    ),
                }
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}
