//! Shared response types for API endpoints.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Standard error body for API responses.
pub struct ApiErrorType {
    status: StatusCode,
    message: String,
    detail: Option<String>,
}

impl From<(StatusCode, &str, Option<String>)> for ApiErrorType {
    fn from((status, message, detail): (StatusCode, &str, Option<String>)) -> Self {
        Self {
            status,
            message: message.to_string(),
            detail,
        }
    }
}

impl IntoResponse for ApiErrorType {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({
                "error": self.message,
                "detail": self.detail,
            })),
        )
            .into_response()
    }
}
