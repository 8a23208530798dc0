//! Configuration for the orchestrator, loaded from the environment.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default chat template for the super-mentor swap announcement.
pub const DEFAULT_SWAP_ALERT_TEMPLATE: &str = "mentor_swap_alert";
/// Default chat template for the newly assigned mentor.
pub const DEFAULT_SWAP_ASSIGN_TEMPLATE: &str = "mentor_swap_assignment";

/// Top-level service configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database holding cohort tables and directories
    pub db_path: String,
    /// Address the HTTP server binds to
    pub bind_addr: String,
    /// Shared secret expected as a bearer token on the batch trigger
    pub batch_token: String,
    /// Meeting/drive provider credentials
    pub graph: GraphConfig,
    /// Tables used when dynamic cohort-table discovery fails
    pub fallback_tables: Vec<String>,
    /// Collaborator endpoint for the email-send function (blank disables)
    pub email_send_url: String,
    /// Collaborator endpoint for the chat-message-send function (blank disables)
    pub chat_send_url: String,
    /// Chat template id for super-mentor swap alerts
    pub swap_alert_template: String,
    /// Chat template id for the newly assigned mentor
    pub swap_assign_template: String,
    /// Upper bound on one batch run's wall-clock duration
    pub batch_deadline: Duration,
}

/// Credentials and identities for the meeting/drive provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphConfig {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    /// User under whose calendar/drive events and recordings live
    pub organizer_id: String,
    /// Name of the well-known recordings folder in the organizer's drive
    pub recordings_folder: String,
}

impl AppConfig {
    /// Loads configuration from the environment, applying defaults for
    /// everything except provider credentials (which may legitimately be
    /// absent until a batch run is attempted).
    pub fn from_env() -> Self {
        Self {
            db_path: env_or("COHORTD_DB_PATH", "cohorts.db"),
            bind_addr: env_or("COHORTD_BIND_ADDR", "0.0.0.0:8080"),
            batch_token: env_or("COHORTD_BATCH_TOKEN", ""),
            graph: GraphConfig {
                tenant_id: env_or("GRAPH_TENANT_ID", ""),
                client_id: env_or("GRAPH_CLIENT_ID", ""),
                client_secret: env_or("GRAPH_CLIENT_SECRET", ""),
                organizer_id: env_or("GRAPH_ORGANIZER_ID", ""),
                recordings_folder: env_or("GRAPH_RECORDINGS_FOLDER", "Recordings"),
            },
            fallback_tables: env::var("COHORTD_FALLBACK_TABLES")
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect()
                })
                .unwrap_or_else(|_| {
                    vec![
                        "basic1_1_schedule".to_string(),
                        "basic1_2_schedule".to_string(),
                        "advanced1_1_schedule".to_string(),
                    ]
                }),
            email_send_url: env_or("COHORTD_EMAIL_SEND_URL", ""),
            chat_send_url: env_or("COHORTD_CHAT_SEND_URL", ""),
            swap_alert_template: env_or("COHORTD_SWAP_ALERT_TEMPLATE", DEFAULT_SWAP_ALERT_TEMPLATE),
            swap_assign_template: env_or(
                "COHORTD_SWAP_ASSIGN_TEMPLATE",
                DEFAULT_SWAP_ASSIGN_TEMPLATE,
            ),
            batch_deadline: Duration::from_secs(
                env::var("COHORTD_BATCH_DEADLINE_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(600),
            ),
        }
    }

    /// Validates that provider credentials are present.
    ///
    /// A missing credential is a configuration error: the batch must fail
    /// immediately with nothing attempted.
    pub fn validate_for_batch(&self) -> Result<(), String> {
        let g = &self.graph;
        for (name, value) in [
            ("GRAPH_TENANT_ID", &g.tenant_id),
            ("GRAPH_CLIENT_ID", &g.client_id),
            ("GRAPH_CLIENT_SECRET", &g.client_secret),
            ("GRAPH_ORGANIZER_ID", &g.organizer_id),
        ] {
            if value.trim().is_empty() {
                return Err(format!("missing required configuration: {name}"));
            }
        }
        Ok(())
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}
