//! API error handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use core_kernel::PortError;
use domain_claims::ClaimError;

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Another action on the same record is still being processed
    #[error("Already processing: {0}")]
    AlreadyProcessing(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// The store returned something this service cannot use
    #[error("Bad gateway: {0}")]
    BadGateway(String),

    /// The store is temporarily unreachable; the request may be retried
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "unauthorized", msg.clone()),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, "forbidden", msg.clone()),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone()),
            ApiError::AlreadyProcessing(msg) => (StatusCode::CONFLICT, "already_processing", msg.clone()),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, "validation_error", msg.clone()),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, "bad_gateway", msg.clone()),
            ApiError::ServiceUnavailable(msg) => {
                (StatusCode::SERVICE_UNAVAILABLE, "service_unavailable", msg.clone())
            }
            ApiError::Internal(msg) => {
                error!(error = %msg, "Internal error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", msg.clone())
            }
        };

        let body = ErrorResponse {
            error: error_type.to_string(),
            message,
            details: None,
        };

        (status, Json(body)).into_response()
    }
}

impl From<PortError> for ApiError {
    fn from(err: PortError) -> Self {
        match &err {
            PortError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            PortError::Validation { .. } => ApiError::Validation(err.to_string()),
            PortError::Conflict { .. } => ApiError::Conflict(err.to_string()),
            PortError::Unauthorized { .. } => ApiError::Unauthorized(err.to_string()),
            PortError::Transformation { .. } => ApiError::BadGateway(err.to_string()),
            _ if err.is_transient() => ApiError::ServiceUnavailable(err.to_string()),
            _ => ApiError::Internal(err.to_string()),
        }
    }
}

impl From<ClaimError> for ApiError {
    fn from(err: ClaimError) -> Self {
        match err {
            ClaimError::ClaimNotFound(_) | ClaimError::AnalysisNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            ClaimError::Validation(_) => ApiError::Validation(err.to_string()),
            ClaimError::InvalidStatusTransition { .. } => ApiError::Conflict(err.to_string()),
            ClaimError::AlreadyProcessing(_) => ApiError::AlreadyProcessing(err.to_string()),
            ClaimError::Unauthenticated(_) => ApiError::Unauthorized(err.to_string()),
            ClaimError::Persistence(port) => port.into(),
            ClaimError::Internal(msg) => ApiError::Internal(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingPermission(_) => ApiError::Forbidden(err.to_string()),
            AuthError::InvalidToken | AuthError::TokenExpired => ApiError::Unauthorized(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(err: validator::ValidationErrors) -> Self {
        ApiError::Validation(err.to_string())
    }
}
