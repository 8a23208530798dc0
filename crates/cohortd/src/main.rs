use anyhow::Context;
use cohortd::config::AppConfig;
use cohortd::db::ScheduleStore;
use cohortd::drive::{DriveClient, RecordingCache};
use cohortd::graph::{build_http_client, GraphMeetingClient, TokenSource};
use cohortd::notify::{ChatClient, EmailClient};
use cohortd::server::create_router;
use cohortd::types::AppState;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();
    info!(db_path = %config.db_path, bind = %config.bind_addr, "Starting cohortd");

    let store = ScheduleStore::new(&config.db_path)
        .with_context(|| format!("failed to open database at {}", config.db_path))?;

    let http = build_http_client().context("failed to build HTTP client")?;
    let tokens = Arc::new(TokenSource::new(http.clone(), config.graph.clone()));

    let state = Arc::new(AppState {
        meetings: GraphMeetingClient::new(tokens.clone()),
        drive: DriveClient::new(tokens),
        recording_cache: RecordingCache::new(),
        email: EmailClient::new(http.clone(), config.email_send_url.clone()),
        chat: ChatClient::new(http, config.chat_send_url.clone()),
        store,
        config,
    });

    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", state.config.bind_addr))?;
    info!(addr = %state.config.bind_addr, "Listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to install shutdown handler");
    }
    info!("Shutdown signal received");
}
