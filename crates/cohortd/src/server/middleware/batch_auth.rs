//! Shared-secret bearer check for the batch trigger.

use crate::server::types::ApiErrorType;
use crate::types::AppState;
use axum::extract::{Request, State};
use axum::http::{header::AUTHORIZATION, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::warn;

/// Rejects the request unless it carries the configured bearer token.
/// A mismatch produces no side effects.
pub async fn require_batch_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let expected = state.config.batch_token.as_str();
    let presented = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match presented {
        Some(token) if !expected.is_empty() && token == expected => next.run(request).await,
        _ => {
            warn!("Batch trigger rejected: missing or invalid bearer token");
            ApiErrorType::from((StatusCode::UNAUTHORIZED, "Unauthorized", None)).into_response()
        }
    }
}
