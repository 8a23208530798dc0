//! HTTP clients for the outbound notification transports.
//!
//! The transports themselves (email delivery, chat-platform delivery) are
//! external collaborators; each exposes a single send endpoint with a
//! boolean success contract. An unconfigured or failing transport simply
//! reports false and the fanout counters absorb it.

use super::{ChatSender, EmailSender};
use reqwest::Client;
use serde_json::json;
use tracing::warn;

/// Client for the collaborator email-send function.
pub struct EmailClient {
    http: Client,
    send_url: String,
}

impl EmailClient {
    pub fn new(http: Client, send_url: String) -> Self {
        Self { http, send_url }
    }
}

impl EmailSender for EmailClient {
    async fn send_email(&self, to: &str, subject: &str, html_body: &str) -> bool {
        if self.send_url.is_empty() {
            warn!("Email transport not configured, send skipped");
            return false;
        }
        let result = self
            .http
            .post(&self.send_url)
            .json(&json!({
                "to": to,
                "subject": subject,
                "html": html_body,
            }))
            .send()
            .await;
        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "Email transport call failed");
                false
            }
        }
    }
}

/// Client for the collaborator chat-message-send function.
pub struct ChatClient {
    http: Client,
    send_url: String,
}

impl ChatClient {
    pub fn new(http: Client, send_url: String) -> Self {
        Self { http, send_url }
    }
}

impl ChatSender for ChatClient {
    async fn send_template(&self, phone: &str, template_id: &str, params: &[String]) -> bool {
        if self.send_url.is_empty() {
            warn!("Chat transport not configured, send skipped");
            return false;
        }
        let result = self
            .http
            .post(&self.send_url)
            .json(&json!({
                "phone": phone,
                "template": template_id,
                "params": params,
            }))
            .send()
            .await;
        match result {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                warn!(error = %e, "Chat transport call failed");
                false
            }
        }
    }
}
