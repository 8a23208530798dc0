//! Batch trigger endpoint.

use crate::batch::run_batch;
use crate::server::types::ApiErrorType;
use crate::types::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use tracing::{error, info};

/// POST /batch/run
///
/// Runs one full provisioning + reconciliation pass. Invoked on a daily
/// schedule and safe to re-invoke manually: every internal check is
/// re-derived from current row state, so a repeat run only skips.
pub async fn post_run_batch(State(s): State<Arc<AppState>>) -> Response {
    // Missing credentials are fatal for the whole batch: nothing attempted.
    if let Err(message) = s.config.validate_for_batch() {
        error!(%message, "Batch rejected due to configuration error");
        return ApiErrorType::from((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Batch is not configured",
            Some(message),
        ))
        .into_response();
    }

    info!("POST /batch/run - starting batch");

    let run = run_batch(
        &s.store,
        &s.meetings,
        &s.drive,
        &s.recording_cache,
        &s.config.fallback_tables,
    );

    match tokio::time::timeout(s.config.batch_deadline, run).await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(_) => {
            error!(
                deadline_secs = s.config.batch_deadline.as_secs(),
                "Batch run exceeded its deadline"
            );
            ApiErrorType::from((
                StatusCode::GATEWAY_TIMEOUT,
                "Batch run exceeded its deadline",
                None,
            ))
            .into_response()
        }
    }
}
