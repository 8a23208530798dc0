use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware as mw, Router};

use crate::server::endpoints::{batch, sessions, status};
use crate::server::middleware::batch_auth;
use crate::types::AppState;

mod endpoints;
mod middleware;
mod types;

/// Creates the service router.
///
/// # Parameters
/// - `app_state`: The shared app state.
///
/// # Returns
/// The router.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    // The batch trigger requires the shared-secret bearer token.
    let batch_router = Router::new()
        .route("/batch/run", post(batch::post_run_batch))
        .layer(mw::from_fn_with_state(
            app_state.clone(),
            batch_auth::require_batch_token,
        ));

    // Mutation endpoints invoked by the dashboard.
    let session_router = Router::new()
        .route("/sessions/reschedule", post(sessions::post_reschedule))
        .route("/sessions/mentor_swap", post(sessions::post_mentor_swap))
        .route(
            "/sessions/:table/:id/reschedule_options",
            get(sessions::get_reschedule_options),
        );

    Router::new()
        .route("/health", get(status::get_health))
        .merge(session_router)
        .merge(batch_router)
        .with_state(app_state)
}
