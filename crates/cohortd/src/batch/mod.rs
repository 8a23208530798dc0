//! Batch driver: one daily pass of provisioning and reconciliation.

pub mod matching;
pub mod provisioning;
pub mod reconcile;
mod types;

pub use types::{BatchReport, TableProvisionOutcome, TableProvisionReport, TableReconcileReport};

use crate::cohort::Cohort;
use crate::db::ScheduleStore;
use crate::drive::{RecordingCache, RecordingStore};
use crate::graph::MeetingProvider;
use crate::types::today_ist;
use chrono::Days;
use dashmap::DashMap;
use rand::Rng;
use std::time::Instant;
use tracing::info;

/// Builds the human-readable meeting subject:
/// `"Cohort {Type} {Number} - {subject} [- {mentor}]"`.
///
/// Provisioning and reconciliation must build this identically, since the
/// reconstructed subject is what recording filenames are matched against.
pub fn meeting_subject(
    cohort: &Cohort,
    subject_name: Option<&str>,
    mentor_name: Option<&str>,
) -> String {
    let mut subject = cohort.display_name();
    if let Some(name) = subject_name.filter(|s| !s.trim().is_empty()) {
        subject.push_str(" - ");
        subject.push_str(name.trim());
    }
    if let Some(mentor) = mentor_name.filter(|s| !s.trim().is_empty()) {
        subject.push_str(" - ");
        subject.push_str(mentor.trim());
    }
    subject
}

/// Runs one full batch: reset the recording cache, discover cohort tables,
/// provision the look-ahead window, then reconcile yesterday's sessions.
///
/// Sequential across tables and sessions on purpose: the provider sits
/// behind one shared token and is itself the bottleneck.
pub async fn run_batch<P: MeetingProvider, S: RecordingStore>(
    store: &ScheduleStore,
    provider: &P,
    drive: &S,
    cache: &RecordingCache,
    fallback_tables: &[String],
) -> BatchReport {
    let run_id = generate_run_id();
    let started = Instant::now();
    let today = today_ist();
    let yesterday = today
        .checked_sub_days(Days::new(1))
        .unwrap_or(today);

    info!(run_id = %run_id, %today, "Starting batch run");

    cache.reset();
    let tables = store.list_cohort_tables(fallback_tables);
    info!(run_id = %run_id, tables = tables.len(), "Cohort tables resolved");

    // Per-run cache of student emails keyed by cohort, so sessions in the
    // same cohort share one lookup.
    let student_cache: DashMap<String, Vec<String>> = DashMap::new();

    let mut provisioning = Vec::with_capacity(tables.len());
    for table in &tables {
        provisioning
            .push(provisioning::provision_table(store, provider, table, today, &student_cache).await);
    }

    let mut reconciliation = Vec::new();
    for table in &tables {
        if let Some(report) =
            reconcile::reconcile_table(store, drive, cache, table, yesterday).await
        {
            reconciliation.push(report);
        }
    }

    let total_recordings_fetched = reconciliation.iter().map(|r| r.recordings_fetched).sum();

    info!(
        run_id = %run_id,
        duration_ms = started.elapsed().as_millis() as u64,
        tables = tables.len(),
        recordings_fetched = total_recordings_fetched,
        "Batch run finished"
    );

    BatchReport {
        run_id,
        provisioning,
        reconciliation,
        total_recordings_fetched,
    }
}

/// Generates a unique id for correlating one run's log lines.
fn generate_run_id() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros();
    let random: u32 = rand::thread_rng().gen();
    format!("{:x}-{:08x}", timestamp & 0xFFFFFFFF, random)
}
