//! Meeting provisioning job: look-ahead pass over one cohort table.

use super::meeting_subject;
use super::types::{TableProvisionOutcome, TableProvisionReport};
use crate::cohort::Cohort;
use crate::db::{is_schema_error, ScheduleStore, Session};
use crate::graph::{create_with_fallback, MeetingProvider, MeetingRequest};
use crate::types::ist;
use chrono::{DateTime, Days, FixedOffset, NaiveDate, NaiveTime};
use dashmap::DashMap;
use tracing::{error, info, warn};

/// Sessions without an explicit time default to 19:00 IST.
const DEFAULT_START: (u32, u32, u32) = (19, 0, 0);
/// Every session runs for 90 minutes.
const SESSION_MINUTES: i64 = 90;
/// How far ahead provisioning looks, inclusive.
const LOOKAHEAD_DAYS: u64 = 7;

/// Provisions meetings for every eligible session in `table` dated within
/// `[today, today + 7]`.
///
/// One session's failure never blocks the others; the per-table report
/// carries counts for this run only.
pub async fn provision_table<P: MeetingProvider>(
    store: &ScheduleStore,
    provider: &P,
    table: &str,
    today: NaiveDate,
    student_cache: &DashMap<String, Vec<String>>,
) -> TableProvisionReport {
    let outcome = provision_table_inner(store, provider, table, today, student_cache).await;
    TableProvisionReport {
        table: table.to_string(),
        outcome,
    }
}

async fn provision_table_inner<P: MeetingProvider>(
    store: &ScheduleStore,
    provider: &P,
    table: &str,
    today: NaiveDate,
    student_cache: &DashMap<String, Vec<String>>,
) -> TableProvisionOutcome {
    let Some(cohort) = Cohort::from_table_name(table) else {
        return TableProvisionOutcome::Failed {
            message: format!("table name does not follow the cohort convention: {table}"),
        };
    };

    let window_end = today
        .checked_add_days(Days::new(LOOKAHEAD_DAYS))
        .unwrap_or(today);
    let sessions = match store.sessions_in_window(table, today, window_end) {
        Ok(sessions) => sessions,
        Err(e) if is_schema_error(&e) => {
            warn!(table = %table, error = %e, "Schedule table schema not ready");
            return TableProvisionOutcome::SchemaNotReady;
        }
        Err(e) => {
            error!(table = %table, error = %e, "Failed to query sessions");
            return TableProvisionOutcome::Failed {
                message: e.to_string(),
            };
        }
    };

    // Sessions without a type (placeholder rows) are not provisioned.
    let eligible: Vec<&Session> = sessions
        .iter()
        .filter(|s| s.session_type.is_some() && s.date.is_some())
        .collect();
    if eligible.is_empty() {
        return TableProvisionOutcome::NoSessions;
    }

    let students = student_cache
        .entry(cohort.cache_key())
        .or_insert_with(|| match store.student_emails(&cohort) {
            Ok(emails) => emails,
            Err(e) => {
                warn!(table = %table, error = %e, "Student lookup failed, provisioning without student attendees");
                Vec::new()
            }
        })
        .clone();

    let sessions_found = eligible.len() as u32;
    let mut meetings_created = 0u32;

    for session in eligible {
        if session.has_meeting_link() {
            continue;
        }
        if provision_session(store, provider, table, &cohort, session, &students).await {
            meetings_created += 1;
        }
    }

    info!(
        table = %table,
        sessions_found,
        meetings_created,
        students = students.len(),
        "Provisioning pass finished"
    );

    TableProvisionOutcome::Provisioned {
        sessions_found,
        meetings_created,
        students_in_cohort: students.len() as u32,
    }
}

/// Provisions one session. Returns true when a link was created and
/// persisted; all failures are logged and absorbed here.
async fn provision_session<P: MeetingProvider>(
    store: &ScheduleStore,
    provider: &P,
    table: &str,
    cohort: &Cohort,
    session: &Session,
    students: &[String],
) -> bool {
    let Some(date) = session.date else {
        return false;
    };
    let Some(start) = session_start(date, session.time) else {
        warn!(table = %table, session_id = session.id, "Could not compute session start time");
        return false;
    };
    let end = start + chrono::Duration::minutes(SESSION_MINUTES);

    // Provisioning reads the original assignment; swap handling is a
    // separate concern with its own notifications.
    let mentor = match session.mentor_id {
        Some(id) => store.mentor_by_id(id).unwrap_or_else(|e| {
            warn!(table = %table, mentor_id = id, error = %e, "Mentor lookup failed");
            None
        }),
        None => None,
    };

    let subject = meeting_subject(
        cohort,
        session.subject_name.as_deref(),
        mentor.as_ref().map(|m| m.name.as_str()),
    );

    let mut attendees: Vec<String> = Vec::with_capacity(students.len() + 1);
    if let Some(m) = &mentor {
        attendees.push(m.email.clone());
    }
    attendees.extend(students.iter().cloned());

    let request = MeetingRequest {
        subject: subject.clone(),
        attendees,
        start,
        end,
    };

    let meeting = match create_with_fallback(provider, &request).await {
        Ok(meeting) => meeting,
        Err(e) => {
            error!(
                table = %table,
                session_id = session.id,
                subject = %subject,
                error = %e,
                "Meeting creation failed on both tiers"
            );
            return false;
        }
    };

    match store.update_meeting_link(table, session.id, &meeting.join_url) {
        Ok(_) => {
            info!(
                table = %table,
                session_id = session.id,
                tier = ?meeting.tier,
                "Meeting link persisted"
            );
            true
        }
        Err(e) => {
            error!(
                table = %table,
                session_id = session.id,
                error = %e,
                "Failed to persist meeting link"
            );
            false
        }
    }
}

/// Combines date and wall-clock time into an IST instant.
fn session_start(date: NaiveDate, time: Option<NaiveTime>) -> Option<DateTime<FixedOffset>> {
    let (h, m, s) = DEFAULT_START;
    let time = time.or_else(|| NaiveTime::from_hms_opt(h, m, s))?;
    date.and_time(time).and_local_timezone(ist()).single()
}
