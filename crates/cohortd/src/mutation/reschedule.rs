//! Reschedule (prepone/postpone) handling.

use super::MutationError;
use crate::db::{ScheduleStore, Session};
use chrono::{Days, NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::info;

/// When a session has no explicit time, comparisons use the same 19:00
/// default that provisioning applies.
fn default_time() -> NaiveTime {
    NaiveTime::from_hms_opt(19, 0, 0).expect("valid constant time")
}

/// Window applied when there is no adjacent session to bound the move.
const FALLBACK_WINDOW_DAYS: u64 = 30;

/// Which way the session is being moved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Prepone,
    Postpone,
}

/// A reschedule request against a single session row.
#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleRequest {
    pub table: String,
    pub session_id: i64,
    pub new_date: Option<NaiveDate>,
    pub new_time: Option<NaiveTime>,
    pub direction: Direction,
}

/// Computes the offerable candidate dates for moving `session` in the
/// given direction.
///
/// Postpone: after the current date, before the next session in table
/// order (or +30 days when there is none). Prepone: before the current
/// date, after the previous session (or -30 days), never before today.
/// Dates already occupied by a sibling session are excluded entirely.
pub fn candidate_dates(
    store: &ScheduleStore,
    table: &str,
    session: &Session,
    direction: Direction,
    today: NaiveDate,
) -> Result<Vec<NaiveDate>, MutationError> {
    let current = session.date.ok_or(MutationError::Unscheduled)?;
    let occupied: HashSet<NaiveDate> = store
        .occupied_dates(table, session.id)?
        .into_iter()
        .collect();

    let (lower_exclusive, upper_exclusive) = match direction {
        Direction::Postpone => {
            let upper = store
                .next_session(table, session.week_number, session.session_number)?
                .and_then(|s| s.date)
                .unwrap_or_else(|| plus_days(current, FALLBACK_WINDOW_DAYS + 1));
            (current, upper)
        }
        Direction::Prepone => {
            let lower = store
                .previous_session(table, session.week_number, session.session_number)?
                .and_then(|s| s.date)
                .unwrap_or_else(|| minus_days(current, FALLBACK_WINDOW_DAYS + 1));
            // Never offer a date in the past.
            let lower = lower.max(minus_days(today, 1));
            (lower, current)
        }
    };

    let mut dates = Vec::new();
    let mut day = plus_days(lower_exclusive, 1);
    while day < upper_exclusive {
        if !occupied.contains(&day) {
            dates.push(day);
        }
        day = plus_days(day, 1);
    }
    Ok(dates)
}

/// Applies a reschedule. On success the session's meeting link is cleared
/// in the same write, forcing re-provisioning on the next batch run.
pub fn reschedule(
    store: &ScheduleStore,
    req: &RescheduleRequest,
    today: NaiveDate,
) -> Result<Session, MutationError> {
    let session = store
        .session_by_id(&req.table, req.session_id)?
        .ok_or_else(|| MutationError::SessionNotFound {
            table: req.table.clone(),
            id: req.session_id,
        })?;

    let current_date = session.date.ok_or(MutationError::Unscheduled)?;
    let current_time = session.time.unwrap_or_else(default_time);

    let target_date = req.new_date.unwrap_or(current_date);
    let target_time = req.new_time.unwrap_or(current_time);

    if target_date == current_date && target_time == current_time {
        return Err(MutationError::NoChange);
    }

    if target_date != current_date {
        let candidates = candidate_dates(store, &req.table, &session, req.direction, today)?;
        if !candidates.contains(&target_date) {
            return Err(MutationError::DateUnavailable { date: target_date });
        }
    } else {
        // Same-day move: the time must strictly follow the direction.
        match req.direction {
            Direction::Postpone if target_time <= current_time => {
                return Err(MutationError::InvalidTimeDirection {
                    message: "postpone requires a later time on the same day".to_string(),
                });
            }
            Direction::Prepone if target_time >= current_time => {
                return Err(MutationError::InvalidTimeDirection {
                    message: "prepone requires an earlier time on the same day".to_string(),
                });
            }
            _ => {}
        }
    }

    let updated = store.update_schedule(&req.table, req.session_id, target_date, target_time)?;
    if updated == 0 {
        return Err(MutationError::SessionNotFound {
            table: req.table.clone(),
            id: req.session_id,
        });
    }

    info!(
        table = %req.table,
        session_id = req.session_id,
        from = %current_date,
        to = %target_date,
        direction = ?req.direction,
        "Session rescheduled, meeting link cleared"
    );

    store
        .session_by_id(&req.table, req.session_id)?
        .ok_or_else(|| MutationError::SessionNotFound {
            table: req.table.clone(),
            id: req.session_id,
        })
}

fn plus_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_add_days(Days::new(days)).unwrap_or(date)
}

fn minus_days(date: NaiveDate, days: u64) -> NaiveDate {
    date.checked_sub_days(Days::new(days)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    const TABLE: &str = "basic1_1_schedule";

    fn test_store() -> ScheduleStore {
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
            );",
        )
        .unwrap();
        ScheduleStore::from_connection(conn).unwrap()
    }

    fn insert(store: &ScheduleStore, id: i64, date: &str, time: &str, week: i64, number: i64) {
        store
            .raw_connection()
            .execute(
                &format!(
                    "INSERT INTO {TABLE}
                        (id, date, time, week_number, session_number, subject_name,
                         session_type, mentor_id, teams_meeting_link)
                     VALUES (?1, ?2, ?3, ?4, ?5, 'Web Development', 'Live Session', 5,
                             'https://teams.example/j/' || ?1)"
                ),
                (id, date, time, week, number),
            )
            .unwrap();
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()
    }

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 1, d).unwrap()
    }

    #[test]
    fn test_postpone_window_bounded_by_next_session() {
        let store = test_store();
        insert(&store, 1, "2026-01-05", "19:00:00", 1, 1);
        insert(&store, 2, "2026-01-10", "19:00:00", 1, 2);

        let session = store.session_by_id(TABLE, 1).unwrap().unwrap();
        let dates = candidate_dates(&store, TABLE, &session, Direction::Postpone, today()).unwrap();
        // Strictly between current (Jan 5) and next session (Jan 10)
        assert_eq!(dates, vec![date(6), date(7), date(8), date(9)]);
    }

    #[test]
    fn test_prepone_clamped_to_today_and_excludes_occupied() {
        let store = test_store();
        insert(&store, 1, "2026-01-05", "19:00:00", 1, 2);
        insert(&store, 2, "2026-01-03", "19:00:00", 1, 1);

        let session = store.session_by_id(TABLE, 1).unwrap().unwrap();
        let dates = candidate_dates(&store, TABLE, &session, Direction::Prepone, today()).unwrap();
        // Between previous session (Jan 3, exclusive) and current (Jan 5, exclusive)
        assert_eq!(dates, vec![date(4)]);
    }

    #[test]
    fn test_occupied_date_excluded_from_candidates() {
        let store = test_store();
        insert(&store, 1, "2026-01-05", "19:00:00", 1, 1);
        insert(&store, 2, "2026-01-07", "19:00:00", 2, 1);

        let session = store.session_by_id(TABLE, 1).unwrap().unwrap();
        let dates = candidate_dates(&store, TABLE, &session, Direction::Postpone, today()).unwrap();
        assert!(!dates.contains(&date(7)));
        assert!(dates.contains(&date(6)));
    }

    #[test]
    fn test_noop_rejected() {
        let store = test_store();
        insert(&store, 1, "2026-01-05", "19:00:00", 1, 1);

        let req = RescheduleRequest {
            table: TABLE.to_string(),
            session_id: 1,
            new_date: Some(date(5)),
            new_time: NaiveTime::from_hms_opt(19, 0, 0),
            direction: Direction::Postpone,
        };
        assert!(matches!(
            reschedule(&store, &req, today()),
            Err(MutationError::NoChange)
        ));
    }

    #[test]
    fn test_same_day_time_must_follow_direction() {
        let store = test_store();
        insert(&store, 1, "2026-01-05", "19:00:00", 1, 1);

        let req = RescheduleRequest {
            table: TABLE.to_string(),
            session_id: 1,
            new_date: None,
            new_time: NaiveTime::from_hms_opt(18, 0, 0),
            direction: Direction::Postpone,
        };
        assert!(matches!(
            reschedule(&store, &req, today()),
            Err(MutationError::InvalidTimeDirection { .. })
        ));

        let req = RescheduleRequest {
            new_time: NaiveTime::from_hms_opt(20, 0, 0),
            direction: Direction::Prepone,
            ..req
        };
        assert!(matches!(
            reschedule(&store, &req, today()),
            Err(MutationError::InvalidTimeDirection { .. })
        ));
    }

    #[test]
    fn test_successful_reschedule_clears_link() {
        let store = test_store();
        insert(&store, 1, "2026-01-05", "19:00:00", 1, 1);

        let req = RescheduleRequest {
            table: TABLE.to_string(),
            session_id: 1,
            new_date: Some(date(8)),
            new_time: None,
            direction: Direction::Postpone,
        };
        let updated = reschedule(&store, &req, today()).unwrap();
        assert_eq!(updated.date, Some(date(8)));
        assert!(!updated.has_meeting_link());
    }

    #[test]
    fn test_missing_session_is_not_found() {
        let store = test_store();
        let req = RescheduleRequest {
            table: TABLE.to_string(),
            session_id: 99,
            new_date: Some(date(8)),
            new_time: None,
            direction: Direction::Postpone,
        };
        assert!(matches!(
            reschedule(&store, &req, today()),
            Err(MutationError::SessionNotFound { .. })
        ));
    }
}
