//! Per-run cache of the recordings folder listing.
//!
//! The listing is fetched once per batch run and reused across every
//! cohort table. The cache is an explicit object with a reset method,
//! invalidated at the start of each run.

use super::{Recording, RecordingStore};
use std::sync::Mutex;
use tracing::warn;

/// In-process cache for one batch run's recording listing.
pub struct RecordingCache {
    entries: Mutex<Option<Vec<Recording>>>,
}

impl RecordingCache {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(None),
        }
    }

    /// Empties the cache. Called at the start of every batch run.
    pub fn reset(&self) {
        *self.entries.lock().unwrap() = None;
    }

    /// Returns the cached listing, fetching it on first use this run.
    ///
    /// Any listing failure (folder missing, listing error) yields an empty
    /// list: reconciliation then finds no matches, it never aborts.
    pub async fn get_or_fetch<S: RecordingStore>(&self, store: &S) -> Vec<Recording> {
        if let Some(cached) = self.entries.lock().unwrap().as_ref() {
            return cached.clone();
        }

        let listing = match store.list_recordings().await {
            Ok(recordings) => recordings,
            Err(e) => {
                warn!(error = %e, "Failed to list recordings, treating as empty");
                Vec::new()
            }
        };

        *self.entries.lock().unwrap() = Some(listing.clone());
        listing
    }
}

impl Default for RecordingCache {
    fn default() -> Self {
        Self::new()
    }
}
