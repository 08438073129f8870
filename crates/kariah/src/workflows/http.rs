use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use super::kariah::RepositoryError;

pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    let payload = json!({ "error": message.into() });
    (status, axum::Json(payload)).into_response()
}

pub(crate) fn repository_error_response(error: &RepositoryError) -> Response {
    let status = match error {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict
        | RepositoryError::Duplicate
        | RepositoryError::StaleVersion { .. } => StatusCode::CONFLICT,
        RepositoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(status, error.to_string())
}
