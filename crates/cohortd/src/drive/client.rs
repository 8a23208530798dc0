//! HTTP client for the cloud-drive recording store.

use super::{Recording, RecordingStore};
use crate::graph::client::TokenSource;
use crate::graph::GraphError;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info};

const GRAPH_BASE_URL: &str = "https://graph.microsoft.com/v1.0";

#[derive(Debug, Deserialize)]
struct DriveItem {
    id: String,
}

#[derive(Debug, Deserialize)]
struct DriveChildren {
    value: Vec<Recording>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareLinkResponse {
    link: ShareLink,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ShareLink {
    web_url: String,
}

/// Client for the recordings folder in the organizer's drive.
pub struct DriveClient {
    tokens: Arc<TokenSource>,
}

impl DriveClient {
    pub fn new(tokens: Arc<TokenSource>) -> Self {
        Self { tokens }
    }

    /// Resolves the well-known recordings folder to its drive item id.
    async fn resolve_recordings_folder(&self) -> Result<String, GraphError> {
        let token = self.tokens.bearer().await?;
        let config = self.tokens.config();
        let url = format!(
            "{GRAPH_BASE_URL}/users/{}/drive/root:/{}",
            config.organizer_id, config.recordings_folder
        );

        let response = self
            .tokens
            .http()
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(GraphError::ItemNotFound {
                name: config.recordings_folder.clone(),
            });
        }

        let item: DriveItem = response
            .error_for_status()
            .map_err(|e| GraphError::UnexpectedResponse {
                message: format!("folder lookup failed: {e}"),
            })?
            .json()
            .await?;

        debug!(folder = %config.recordings_folder, id = %item.id, "Resolved recordings folder");
        Ok(item.id)
    }
}

impl RecordingStore for DriveClient {
    async fn list_recordings(&self) -> Result<Vec<Recording>, GraphError> {
        let folder_id = self.resolve_recordings_folder().await?;
        let token = self.tokens.bearer().await?;
        let organizer = &self.tokens.config().organizer_id;
        let url = format!(
            "{GRAPH_BASE_URL}/users/{organizer}/drive/items/{folder_id}/children?$top=200"
        );

        let children: DriveChildren = self
            .tokens
            .http()
            .get(&url)
            .bearer_auth(&token)
            .send()
            .await?
            .error_for_status()
            .map_err(|e| GraphError::UnexpectedResponse {
                message: format!("folder listing failed: {e}"),
            })?
            .json()
            .await?;

        info!(count = children.value.len(), "Listed recordings folder");
        Ok(children.value)
    }

    async fn create_share_link(&self, item_id: &str) -> Result<String, GraphError> {
        let token = self.tokens.bearer().await?;
        let organizer = &self.tokens.config().organizer_id;
        let url = format!("{GRAPH_BASE_URL}/users/{organizer}/drive/items/{item_id}/createLink");

        let response: ShareLinkResponse = self
            .tokens
            .http()
            .post(&url)
            .bearer_auth(&token)
            .json(&json!({ "type": "view", "scope": "anonymous" }))
            .send()
            .await?
            .error_for_status()
            .map_err(|e| GraphError::UnexpectedResponse {
                message: format!("share-link creation failed: {e}"),
            })?
            .json()
            .await?;

        Ok(response.link.web_url)
    }
}
