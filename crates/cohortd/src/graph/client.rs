//! HTTP client for the meeting provider.
//!
//! Two creation tiers:
//! 1. Calendar event with online meeting enabled and the full attendee
//!    list (implicitly creates a group chat), followed by a best-effort
//!    patch to enable automatic recording.
//! 2. Standalone online meeting with automatic recording on by default,
//!    used when the calendar path fails.

use super::error::GraphError;
use super::types::*;
use crate::config::GraphConfig;
use reqwest::Client;
use serde_json::json;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const LOGIN_BASE_URL: &str = "https://login.microsoftonline.com";
const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

/// Wall-clock identifier the provider expects for IST date-times.
const PROVIDER_TIMEZONE: &str = "India Standard Time";

struct CachedToken {
    access_token: String,
    fetched_at: Instant,
    expires_in: Duration,
}

/// Client-credentials token source, shared by the meeting and drive clients.
///
/// The provider sits behind a single shared access token; callers all go
/// through this one cache rather than fetching their own.
pub struct TokenSource {
    http: Client,
    config: GraphConfig,
    cached: Mutex<Option<CachedToken>>,
}

impl TokenSource {
    pub fn new(http: Client, config: GraphConfig) -> Self {
        Self {
            http,
            config,
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid bearer token, fetching a new one when the cached
    /// token is missing or within a minute of expiry.
    pub async fn bearer(&self) -> Result<String, GraphError> {
        let mut guard = self.cached.lock().await;
        if let Some(token) = guard.as_ref() {
            if token.fetched_at.elapsed() + Duration::from_secs(60) < token.expires_in {
                return Ok(token.access_token.clone());
            }
        }

        debug!("Fetching new provider access token");
        let url = format!(
            "{LOGIN_BASE_URL}/{}/oauth2/v2.0/token",
            self.config.tenant_id
        );
        let response = self
            .http
            .post(&url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", "https://graph.microsoft.com/.default"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GraphError::Token {
                message: format!("token endpoint returned {status}: {body}"),
            });
        }

        let token: TokenResponse =
            response.json().await.map_err(|e| GraphError::Token {
                message: format!("malformed token response: {e}"),
            })?;

        let access_token = token.access_token.clone();
        *guard = Some(CachedToken {
            access_token: token.access_token,
            fetched_at: Instant::now(),
            expires_in: Duration::from_secs(token.expires_in.max(300)),
        });
        Ok(access_token)
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn config(&self) -> &GraphConfig {
        &self.config
    }
}

/// Builds the HTTP client both provider clients share, with explicit
/// timeouts so a stuck external call cannot stall a batch run.
pub fn build_http_client() -> Result<Client, GraphError> {
    Client::builder()
        .connect_timeout(Duration::from_secs(10))
        .timeout(Duration::from_secs(30))
        .build()
        .map_err(|e| GraphError::Network {
            message: format!("Failed to build HTTP client: {e}"),
        })
}

/// Client for creating online meetings.
pub struct GraphMeetingClient {
    tokens: Arc<TokenSource>,
}

impl GraphMeetingClient {
    pub fn new(tokens: Arc<TokenSource>) -> Self {
        Self { tokens }
    }

    /// Primary tier: creates a calendar event with online meeting enabled
    /// and the full attendee list. Returns the join URL.
    pub async fn create_calendar_meeting(
        &self,
        req: &MeetingRequest,
    ) -> Result<String, GraphError> {
        let token = self.tokens.bearer().await?;
        let organizer = &self.tokens.config().organizer_id;
        let url = format!("{GRAPH_BASE_URL}/users/{organizer}/events");

        let attendees: Vec<_> = req
            .attendees
            .iter()
            .map(|email| {
                json!({
                    "emailAddress": { "address": email },
                    "type": "required"
                })
            })
            .collect();

        let body = json!({
            "subject": req.subject,
            "start": {
                "dateTime": req.start.naive_local().format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": PROVIDER_TIMEZONE
            },
            "end": {
                "dateTime": req.end.naive_local().format("%Y-%m-%dT%H:%M:%S").to_string(),
                "timeZone": PROVIDER_TIMEZONE
            },
            "isOnlineMeeting": true,
            "onlineMeetingProvider": "teamsForBusiness",
            "attendees": attendees
        });

        info!(
            subject = %req.subject,
            attendees = req.attendees.len(),
            "Creating calendar meeting"
        );

        let response = self
            .http_post(&url, &token, body)
            .await?
            .error_for_status()
            .map_err(|e| GraphError::UnexpectedResponse {
                message: format!("event creation failed: {e}"),
            })?;

        let event: CreatedEvent = response.json().await?;
        event
            .online_meeting
            .and_then(|m| m.join_url)
            .ok_or(GraphError::MissingJoinUrl)
    }

    /// Fallback tier: creates a standalone online meeting (no attendees,
    /// no chat) with automatic recording enabled by default.
    pub async fn create_standalone_meeting(
        &self,
        req: &MeetingRequest,
    ) -> Result<String, GraphError> {
        let token = self.tokens.bearer().await?;
        let organizer = &self.tokens.config().organizer_id;
        let url = format!("{GRAPH_BASE_URL}/users/{organizer}/onlineMeetings");

        let body = json!({
            "subject": req.subject,
            "startDateTime": req.start.to_rfc3339(),
            "endDateTime": req.end.to_rfc3339(),
            "recordAutomatically": true
        });

        info!(subject = %req.subject, "Creating standalone meeting (fallback)");

        let response = self
            .http_post(&url, &token, body)
            .await?
            .error_for_status()
            .map_err(|e| GraphError::UnexpectedResponse {
                message: format!("standalone meeting creation failed: {e}"),
            })?;

        let meeting: CreatedOnlineMeeting = response.json().await?;
        meeting.join_web_url.ok_or(GraphError::MissingJoinUrl)
    }

    /// Best-effort: looks up the online meeting behind `join_url` and
    /// patches it to record automatically. Callers swallow failures.
    pub async fn enable_auto_recording(&self, join_url: &str) -> Result<(), GraphError> {
        let token = self.tokens.bearer().await?;
        let organizer = &self.tokens.config().organizer_id;

        let filter = format!("JoinWebUrl eq '{join_url}'");
        let list_url = url::Url::parse_with_params(
            &format!("{GRAPH_BASE_URL}/users/{organizer}/onlineMeetings"),
            [("$filter", filter.as_str())],
        )?;

        let response = self
            .tokens
            .http()
            .get(list_url)
            .bearer_auth(&token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| GraphError::UnexpectedResponse {
                message: format!("online meeting lookup failed: {e}"),
            })?;

        let list: OnlineMeetingList = response.json().await?;
        let meeting = list.value.into_iter().next().ok_or_else(|| {
            GraphError::UnexpectedResponse {
                message: "no online meeting matched the join URL".to_string(),
            }
        })?;

        let patch_url = format!(
            "{GRAPH_BASE_URL}/users/{organizer}/onlineMeetings/{}",
            meeting.id
        );
        self.tokens
            .http()
            .patch(&patch_url)
            .bearer_auth(&token)
            .json(&json!({ "recordAutomatically": true }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| GraphError::UnexpectedResponse {
                message: format!("auto-recording patch failed: {e}"),
            })?;

        debug!(meeting_id = %meeting.id, "Automatic recording enabled");
        Ok(())
    }

    async fn http_post(
        &self,
        url: &str,
        token: &str,
        body: serde_json::Value,
    ) -> Result<reqwest::Response, GraphError> {
        let response = self
            .tokens
            .http()
            .post(url)
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;
        if response.status().is_server_error() {
            warn!(url = %url, status = %response.status(), "Provider returned a server error");
        }
        Ok(response)
    }
}
