//! Recording reconciliation job: look-behind pass over one cohort table.
//!
//! The batch runs early morning, so only yesterday's sessions can
//! plausibly have finished and been recorded.

use super::matching::match_recording;
use super::meeting_subject;
use super::types::TableReconcileReport;
use crate::cohort::Cohort;
use crate::db::{ScheduleStore, Session};
use crate::drive::{RecordingCache, RecordingStore};
use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

/// Attaches recordings to yesterday's sessions in `table`.
///
/// Returns a report only when at least one recording was actually fetched;
/// tables with nothing to do stay out of the summary.
pub async fn reconcile_table<S: RecordingStore>(
    store: &ScheduleStore,
    drive: &S,
    cache: &RecordingCache,
    table: &str,
    yesterday: NaiveDate,
) -> Option<TableReconcileReport> {
    let Some(cohort) = Cohort::from_table_name(table) else {
        return None;
    };

    let sessions = match store.sessions_on_date(table, yesterday) {
        Ok(sessions) => sessions,
        Err(e) => {
            warn!(table = %table, error = %e, "Reconciliation query failed, skipping table");
            return None;
        }
    };

    let pending: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.has_meeting_link() && !s.has_recording())
        .collect();
    if pending.is_empty() {
        return None;
    }

    let recordings = cache.get_or_fetch(drive).await;
    let mut fetched = 0u32;

    for session in pending {
        let mentor_name = match session.mentor_id {
            Some(id) => store
                .mentor_by_id(id)
                .ok()
                .flatten()
                .map(|m| m.name),
            None => None,
        };
        let subject = meeting_subject(
            &cohort,
            session.subject_name.as_deref(),
            mentor_name.as_deref(),
        );

        let Some(hit) = match_recording(&recordings, &subject, yesterday) else {
            debug!(
                table = %table,
                session_id = session.id,
                subject = %subject,
                "No recording matched"
            );
            continue;
        };

        // Share-link failure degrades to the raw web URL (not anonymous),
        // a documented degraded outcome rather than an error.
        let url = match drive.create_share_link(&hit.id).await {
            Ok(share_url) => share_url,
            Err(e) => {
                warn!(
                    table = %table,
                    session_id = session.id,
                    recording = %hit.name,
                    error = %e,
                    "Share-link creation failed, using raw web URL"
                );
                hit.web_url.clone()
            }
        };

        match store.update_recording(table, session.id, &url) {
            Ok(_) => {
                info!(
                    table = %table,
                    session_id = session.id,
                    recording = %hit.name,
                    "Recording attached"
                );
                fetched += 1;
            }
            Err(e) => {
                error!(
                    table = %table,
                    session_id = session.id,
                    error = %e,
                    "Failed to persist recording URL"
                );
            }
        }
    }

    if fetched > 0 {
        Some(TableReconcileReport {
            table: table.to_string(),
            recordings_fetched: fetched,
        })
    } else {
        None
    }
}
