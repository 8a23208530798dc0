//! Mutation endpoints invoked by the dashboard.

use crate::mutation::{
    candidate_dates, mentor_swap, reschedule, Direction, MutationError, RescheduleRequest,
    SwapRequest,
};
use crate::notify::{FanoutTemplates, FANOUT_PACING};
use crate::server::types::ApiErrorType;
use crate::types::{today_ist, AppState};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

fn mutation_error_to_response(error: MutationError) -> Response {
    let status = if error.is_validation() {
        StatusCode::BAD_REQUEST
    } else if error.is_not_found() {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };
    ApiErrorType::from((status, "Mutation failed", Some(error.to_string()))).into_response()
}

/// POST /sessions/reschedule
pub async fn post_reschedule(
    State(s): State<Arc<AppState>>,
    Json(req): Json<RescheduleRequest>,
) -> Response {
    info!(
        table = %req.table,
        session_id = req.session_id,
        direction = ?req.direction,
        "POST /sessions/reschedule"
    );

    match reschedule(&s.store, &req, today_ist()) {
        Ok(session) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "table": req.table,
                "session_id": session.id,
                "date": session.date,
                "time": session.time,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(table = %req.table, session_id = req.session_id, error = %e, "Reschedule failed");
            mutation_error_to_response(e)
        }
    }
}

/// POST /sessions/mentor_swap
pub async fn post_mentor_swap(
    State(s): State<Arc<AppState>>,
    Json(req): Json<SwapRequest>,
) -> Response {
    info!(
        table = %req.table,
        session_id = req.session_id,
        new_mentor = ?req.new_mentor_id,
        "POST /sessions/mentor_swap"
    );

    let templates = FanoutTemplates {
        alert_template: s.config.swap_alert_template.clone(),
        assign_template: s.config.swap_assign_template.clone(),
    };

    match mentor_swap(
        &s.store,
        &s.email,
        &s.chat,
        &templates,
        FANOUT_PACING,
        &req,
    )
    .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "table": req.table,
                "session_id": outcome.session_id,
                "swapped_mentor_id": outcome.swapped_to,
            })),
        )
            .into_response(),
        Err(e) => {
            error!(table = %req.table, session_id = req.session_id, error = %e, "Mentor swap failed");
            mutation_error_to_response(e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RescheduleOptionsParams {
    pub direction: Direction,
}

/// GET /sessions/:table/:id/reschedule_options
///
/// Returns the offerable candidate dates so the dashboard can render
/// only valid choices.
pub async fn get_reschedule_options(
    Path((table, id)): Path<(String, i64)>,
    Query(params): Query<RescheduleOptionsParams>,
    State(s): State<Arc<AppState>>,
) -> Response {
    info!(table = %table, session_id = id, direction = ?params.direction, "GET reschedule_options");

    let session = match s.store.session_by_id(&table, id) {
        Ok(Some(session)) => session,
        Ok(None) => {
            return mutation_error_to_response(MutationError::SessionNotFound { table, id });
        }
        Err(e) => return mutation_error_to_response(e.into()),
    };

    match candidate_dates(&s.store, &table, &session, params.direction, today_ist()) {
        Ok(dates) => (
            StatusCode::OK,
            Json(json!({
                "table": table,
                "session_id": id,
                "direction": params.direction,
                "candidate_dates": dates,
            })),
        )
            .into_response(),
        Err(e) => mutation_error_to_response(e),
    }
}
