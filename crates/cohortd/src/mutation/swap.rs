//! Mentor-swap handling.

use super::MutationError;
use crate::cohort::Cohort;
use crate::db::{Mentor, ScheduleStore};
use crate::notify::{
    notify_mentor_swap, ChatSender, EmailSender, FanoutStats, FanoutTemplates, SwapContext,
};
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};

/// A mentor-swap request against a single session row. `new_mentor_id`
/// of null removes an active swap.
#[derive(Debug, Clone, Deserialize)]
pub struct SwapRequest {
    pub table: String,
    pub session_id: i64,
    pub new_mentor_id: Option<i64>,
    /// Human name of whoever is performing the swap
    pub actor: String,
}

/// Result of a swap. Notification stats are operational detail; the swap
/// itself succeeded once the database write went through.
#[derive(Debug)]
pub struct SwapOutcome {
    pub session_id: i64,
    pub swapped_to: Option<i64>,
    pub notifications: Option<FanoutStats>,
}

/// Applies a mentor swap (or removal) and, when swapping to a mentor,
/// fans out both notification sets.
///
/// The persistence write is the only step whose failure aborts the
/// request. Every notification failure is caught inside the fanout and
/// reflected only in the returned counters.
pub async fn mentor_swap<E: EmailSender, C: ChatSender>(
    store: &ScheduleStore,
    email: &E,
    chat: &C,
    templates: &FanoutTemplates,
    pacing: Duration,
    req: &SwapRequest,
) -> Result<SwapOutcome, MutationError> {
    let session = store
        .session_by_id(&req.table, req.session_id)?
        .ok_or_else(|| MutationError::SessionNotFound {
            table: req.table.clone(),
            id: req.session_id,
        })?;

    // The removal path needs no profile; the swap path needs the new
    // mentor's full contact details before anything is written.
    let new_mentor = match req.new_mentor_id {
        Some(id) => Some(
            store
                .mentor_by_id(id)?
                .ok_or(MutationError::MentorNotFound { id })?,
        ),
        None => None,
    };

    let updated = store.update_swapped_mentor(&req.table, req.session_id, req.new_mentor_id)?;
    if updated == 0 {
        return Err(MutationError::SessionNotFound {
            table: req.table.clone(),
            id: req.session_id,
        });
    }

    info!(
        table = %req.table,
        session_id = req.session_id,
        new_mentor = ?req.new_mentor_id,
        actor = %req.actor,
        "Mentor swap persisted"
    );

    let Some(new_mentor) = new_mentor else {
        // Removing a swap sends no notifications.
        return Ok(SwapOutcome {
            session_id: req.session_id,
            swapped_to: None,
            notifications: None,
        });
    };

    let original_mentor = match session.mentor_id {
        Some(id) => store.mentor_by_id(id).ok().flatten(),
        None => None,
    }
    .unwrap_or_else(|| Mentor {
        id: 0,
        name: "the original mentor".to_string(),
        email: String::new(),
        phone: None,
        is_super: false,
    });

    let super_mentors = store.super_mentors().unwrap_or_else(|e| {
        warn!(error = %e, "Super-mentor lookup failed, alert set will be empty");
        Vec::new()
    });

    let cohort_label = Cohort::from_table_name(&req.table)
        .map(|c| c.display_name())
        .unwrap_or_else(|| req.table.clone());

    let ctx = SwapContext {
        cohort_label,
        subject_name: session.subject_name.clone().unwrap_or_default(),
        date: session.date,
        time: session.time,
        join_link: session.teams_meeting_link.clone(),
        original_mentor,
        new_mentor,
        actor: req.actor.clone(),
    };

    let stats = notify_mentor_swap(email, chat, &super_mentors, &ctx, templates, pacing).await;

    Ok(SwapOutcome {
        session_id: req.session_id,
        swapped_to: req.new_mentor_id,
        notifications: Some(stats),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;
    use std::sync::atomic::{AtomicU32, Ordering};

    const TABLE: &str = "basic1_1_schedule";

    struct CountingEmail {
        sent: AtomicU32,
    }
    struct CountingChat {
        sent: AtomicU32,
    }

    impl EmailSender for CountingEmail {
        async fn send_email(&self, _to: &str, _subject: &str, _body: &str) -> bool {
            self.sent.fetch_add(1, Ordering::Relaxed);
            true
        }
    }

    impl ChatSender for CountingChat {
        async fn send_template(&self, _phone: &str, _template: &str, _params: &[String]) -> bool {
            self.sent.fetch_add(1, Ordering::Relaxed);
            true
        }
    }

    fn fixture() -> (ScheduleStore, CountingEmail, CountingChat, FanoutTemplates) {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE basic1_1_schedule (
                id INTEGER PRIMARY KEY,
                date TEXT,
                time TEXT,
                week_number INTEGER NOT NULL,
                session_number INTEGER NOT NULL,
                subject_name TEXT,
                subject_topic TEXT,
                session_type TEXT,
                mentor_id INTEGER,
                swapped_mentor_id INTEGER,
                teams_meeting_link TEXT,
                session_recording TEXT,
                material_links TEXT
            );
            INSERT INTO basic1_1_schedule
                (id, date, time, week_number, session_number, subject_name, session_type, mentor_id)
             VALUES (1, '2026-01-05', '19:00:00', 1, 1, 'Web Development', 'Live Session', 5);",
        )
        .unwrap();
        let store = ScheduleStore::from_connection(conn).unwrap();
        {
            let conn = store.raw_connection();
            conn.execute_batch(
                "INSERT INTO mentors (id, name, email, phone, is_super) VALUES
                    (5, 'Saswata', 'saswata@example.com', '9876543210', 0),
                    (6, 'Priya', 'priya@example.com', '9123456780', 0),
                    (7, 'Super One', 'super1@example.com', '9000000001', 1),
                    (8, 'Super Two', 'super2@example.com', '9000000002', 1);",
            )
            .unwrap();
        }
        (
            store,
            CountingEmail {
                sent: AtomicU32::new(0),
            },
            CountingChat {
                sent: AtomicU32::new(0),
            },
            FanoutTemplates {
                alert_template: "alert".to_string(),
                assign_template: "assign".to_string(),
            },
        )
    }

    fn request(new_mentor_id: Option<i64>) -> SwapRequest {
        SwapRequest {
            table: TABLE.to_string(),
            session_id: 1,
            new_mentor_id,
            actor: "Admin".to_string(),
        }
    }

    #[tokio::test]
    async fn test_swap_persists_and_notifies_both_sets() {
        let (store, email, chat, templates) = fixture();

        let outcome = mentor_swap(&store, &email, &chat, &templates, Duration::ZERO, &request(Some(6)))
            .await
            .unwrap();

        let session = store.session_by_id(TABLE, 1).unwrap().unwrap();
        assert_eq!(session.swapped_mentor_id, Some(6));
        assert_eq!(session.effective_mentor_id(), Some(6));

        // Two super-mentors plus the newly assigned mentor
        let stats = outcome.notifications.unwrap();
        assert_eq!(stats.emails_sent, 3);
        assert_eq!(stats.chats_sent, 3);
        assert_eq!(email.sent.load(Ordering::Relaxed), 3);
        assert_eq!(chat.sent.load(Ordering::Relaxed), 3);
    }

    #[tokio::test]
    async fn test_removal_sends_no_notifications() {
        let (store, email, chat, templates) = fixture();
        store.update_swapped_mentor(TABLE, 1, Some(6)).unwrap();

        let outcome = mentor_swap(&store, &email, &chat, &templates, Duration::ZERO, &request(None))
            .await
            .unwrap();

        assert!(outcome.notifications.is_none());
        assert_eq!(email.sent.load(Ordering::Relaxed), 0);
        let session = store.session_by_id(TABLE, 1).unwrap().unwrap();
        assert_eq!(session.swapped_mentor_id, None);
        assert_eq!(session.effective_mentor_id(), Some(5));
    }

    #[tokio::test]
    async fn test_unknown_new_mentor_aborts_before_write() {
        let (store, email, chat, templates) = fixture();

        let err = mentor_swap(&store, &email, &chat, &templates, Duration::ZERO, &request(Some(99)))
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::MentorNotFound { id: 99 }));

        let session = store.session_by_id(TABLE, 1).unwrap().unwrap();
        assert_eq!(session.swapped_mentor_id, None);
    }

    #[tokio::test]
    async fn test_missing_session_is_not_found() {
        let (store, email, chat, templates) = fixture();
        let mut req = request(Some(6));
        req.session_id = 42;
        let err = mentor_swap(&store, &email, &chat, &templates, Duration::ZERO, &req)
            .await
            .unwrap_err();
        assert!(matches!(err, MutationError::SessionNotFound { .. }));
    }
}
