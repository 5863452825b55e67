use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

/// Per-field validation messages, keyed by request field name.
pub type FieldErrors = BTreeMap<&'static str, Vec<String>>;

pub(crate) const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred.";

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Authentication failed")]
    AuthError,
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Validation failed: {0:?}")]
    Validation(FieldErrors),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Internal server error")]
    Internal,
}

pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    #[must_use]
    pub fn field(field: &'static str, messages: Vec<String>) -> Self {
        Self::Validation(FieldErrors::from([(field, messages)]))
    }
}

/// Body shared by every non-success response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl ErrorBody {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self { status: "error", message: message.into(), errors: None }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Database(e) => {
                tracing::error!(error = %e, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(GENERIC_ERROR_MESSAGE))
            }
            Self::AuthError => {
                tracing::debug!("Authentication failed");
                let mut response = (StatusCode::UNAUTHORIZED, Json(ErrorBody::new("Unauthorized"))).into_response();
                response.headers_mut().insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                return response;
            }
            Self::NotFound(msg) => {
                tracing::debug!(message = %msg, "Resource not found");
                (StatusCode::NOT_FOUND, ErrorBody::new(msg))
            }
            Self::Validation(errors) => {
                tracing::debug!(fields = ?errors.keys().collect::<Vec<_>>(), "Validation failed");
                (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorBody { status: "error", message: "Validation failed".to_string(), errors: Some(errors) },
                )
            }
            Self::BadRequest(msg) => {
                tracing::debug!(message = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, ErrorBody::new(msg))
            }
            Self::Internal => {
                tracing::error!("Internal server error occurred");
                (StatusCode::INTERNAL_SERVER_ERROR, ErrorBody::new(GENERIC_ERROR_MESSAGE))
            }
        };

        (status, Json(body)).into_response()
    }
}
