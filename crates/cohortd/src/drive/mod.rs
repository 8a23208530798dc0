//! Recording store module: cloud-drive folder listing and share links.

pub mod cache;
pub mod client;

pub use cache::RecordingCache;
pub use client::DriveClient;

use crate::graph::GraphError;
use serde::{Deserialize, Serialize};

/// A recording file as listed by the drive provider. Ephemeral: held only
/// in the per-run cache, never persisted as its own entity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recording {
    pub id: String,
    pub name: String,
    pub web_url: String,
    #[serde(default)]
    pub created_date_time: Option<String>,
}

/// Seam for the drive provider so reconciliation can run against fakes.
#[allow(async_fn_in_trait)]
pub trait RecordingStore {
    /// Lists the immediate children of the well-known recordings folder.
    async fn list_recordings(&self) -> Result<Vec<Recording>, GraphError>;
    /// Creates an anonymous, view-only share link for a drive item.
    async fn create_share_link(&self, item_id: &str) -> Result<String, GraphError>;
}
