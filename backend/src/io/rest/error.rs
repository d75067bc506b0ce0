use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use shared::ErrorResponse;
use thiserror::Error;
use tracing::error;

use crate::domain::errors::DomainError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Missing or invalid user identity")]
    Unauthorized,

    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Domain(#[from] DomainError),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// Report a permission failure exactly like a missing resource
    pub fn conceal(self) -> Self {
        match self {
            ApiError::Domain(DomainError::PermissionDenied(reason)) => {
                ApiError::Domain(DomainError::NotFound(reason))
            }
            other => other,
        }
    }
}

fn body(error: &str, code: &str, fields: BTreeMap<String, String>) -> Json<ErrorResponse> {
    Json(ErrorResponse { error: error.to_string(), code: code.to_string(), fields })
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, payload) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                body("Authentication required", "UNAUTHORIZED", BTreeMap::new()),
            ),
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, body(&message, "BAD_REQUEST", BTreeMap::new()))
            }
            ApiError::Domain(DomainError::Validation(fields)) => (
                StatusCode::BAD_REQUEST,
                body("Validation failed", "VALIDATION_ERROR", fields.into_inner()),
            ),
            // The reason stays server-side so a 404 never says why.
            ApiError::Domain(DomainError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, body("Not found", "NOT_FOUND", BTreeMap::new()))
            }
            ApiError::Domain(DomainError::PermissionDenied(_)) => {
                (StatusCode::FORBIDDEN, body("Permission denied", "FORBIDDEN", BTreeMap::new()))
            }
            ApiError::Domain(e) => {
                error!("Request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    body("Internal server error", "INTERNAL_ERROR", BTreeMap::new()),
                )
            }
        };

        (status, payload).into_response()
    }
}
