use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::captcha::VerifyError;
use crate::storage::StoreError;

#[derive(Debug)]
pub enum AppError {
    NotFound,
    MethodNotAllowed,
    BadRequest(String),
    Verification(VerifyError),
    Storage(StoreError),
    Internal(String),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::NotFound => write!(f, "Not Found"),
            AppError::MethodNotAllowed => write!(f, "Method Not Allowed"),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {msg}"),
            AppError::Verification(err) => write!(f, "Verification Error: {err}"),
            AppError::Storage(err) => write!(f, "Storage Error: {err}"),
            AppError::Internal(msg) => write!(f, "Internal Error: {msg}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound => (StatusCode::NOT_FOUND, "Not Found".to_string()),
            AppError::MethodNotAllowed => (
                StatusCode::METHOD_NOT_ALLOWED,
                "Method Not Allowed".to_string(),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Verification(err) => {
                tracing::error!("CAPTCHA verification failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to verify CAPTCHA".to_string(),
                )
            }
            AppError::Storage(err) => {
                tracing::error!("Record storage failed: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to create record".to_string(),
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

impl From<VerifyError> for AppError {
    fn from(err: VerifyError) -> Self {
        AppError::Verification(err)
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        AppError::Storage(err)
    }
}
