//! Database module for cohort schedule tables and directory data.

mod types;

pub use types::{is_blank_link, join_material_links, split_material_links, Mentor, Session};

use crate::cohort::Cohort;
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{Connection, OptionalExtension, Result, Row};
use std::sync::Mutex;
use tracing::warn;

const SCHEMA_SQL: &str = include_str!("../../sql/init_cohorts.sql");

const SESSION_COLUMNS: &str = "id, date, time, week_number, session_number, subject_name, \
     subject_topic, session_type, mentor_id, swapped_mentor_id, \
     teams_meeting_link, session_recording, material_links";

/// Store over the cohort schedule tables and the mentor/student directories.
///
/// One SQLite connection guarded by a mutex; the batch is sequential by
/// design so contention is not a concern.
pub struct ScheduleStore {
    db: Mutex<Connection>,
}

impl ScheduleStore {
    /// Opens the database at `db_path` and initializes the directory schema.
    pub fn new(db_path: &str) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Wraps an existing connection (used by tests with in-memory databases).
    pub fn from_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            db: Mutex::new(conn),
        })
    }

    /// Lists active cohort schedule tables from the catalog.
    ///
    /// Discovery failure must not abort the batch: on any error, or when
    /// the catalog holds no cohort tables at all, the configured fallback
    /// list is returned instead and the condition is only logged.
    pub fn list_cohort_tables(&self, fallback: &[String]) -> Vec<String> {
        tables_or_fallback(self.query_cohort_tables(), fallback)
    }

    fn query_cohort_tables(&self) -> Result<Vec<String>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name LIKE '%_schedule'",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>>>()?;
        Ok(names
            .into_iter()
            .filter(|name| Cohort::from_table_name(name).is_some())
            .collect())
    }

    /// Sessions whose date falls within `[from, to]` inclusive.
    pub fn sessions_in_window(
        &self,
        table: &str,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<Session>> {
        ensure_valid_table(table)?;
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&format!(
            "SELECT {SESSION_COLUMNS} FROM {table} \
             WHERE date IS NOT NULL AND date >= ?1 AND date <= ?2 \
             ORDER BY week_number, session_number"
        ))?;
        let sessions = stmt.query_map((from, to), row_to_session)?;
        sessions.collect()
    }

    /// All sessions dated exactly `date`.
    pub fn sessions_on_date(&self, table: &str, date: NaiveDate) -> Result<Vec<Session>> {
        self.sessions_in_window(table, date, date)
    }

    /// Loads a single session by id.
    pub fn session_by_id(&self, table: &str, id: i64) -> Result<Option<Session>> {
        ensure_valid_table(table)?;
        let db = self.db.lock().unwrap();
        db.query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM {table} WHERE id = ?1"),
            [id],
            row_to_session,
        )
        .optional()
    }

    /// Dates already occupied by sessions in `table`, excluding `except_id`.
    pub fn occupied_dates(&self, table: &str, except_id: i64) -> Result<Vec<NaiveDate>> {
        ensure_valid_table(table)?;
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(&format!(
            "SELECT date FROM {table} WHERE date IS NOT NULL AND id != ?1"
        ))?;
        let dates = stmt.query_map([except_id], |row| row.get::<_, NaiveDate>(0))?;
        dates.collect()
    }

    /// The session immediately after the given `(week_number, session_number)`
    /// position, in table order. Table order, not date, is authoritative.
    pub fn next_session(&self, table: &str, week: i64, number: i64) -> Result<Option<Session>> {
        ensure_valid_table(table)?;
        let db = self.db.lock().unwrap();
        db.query_row(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM {table} \
                 WHERE week_number > ?1 OR (week_number = ?1 AND session_number > ?2) \
                 ORDER BY week_number ASC, session_number ASC LIMIT 1"
            ),
            (week, number),
            row_to_session,
        )
        .optional()
    }

    /// The session immediately before the given position, in table order.
    pub fn previous_session(&self, table: &str, week: i64, number: i64) -> Result<Option<Session>> {
        ensure_valid_table(table)?;
        let db = self.db.lock().unwrap();
        db.query_row(
            &format!(
                "SELECT {SESSION_COLUMNS} FROM {table} \
                 WHERE week_number < ?1 OR (week_number = ?1 AND session_number < ?2) \
                 ORDER BY week_number DESC, session_number DESC LIMIT 1"
            ),
            (week, number),
            row_to_session,
        )
        .optional()
    }

    /// Persists a freshly created meeting link.
    pub fn update_meeting_link(&self, table: &str, id: i64, link: &str) -> Result<usize> {
        ensure_valid_table(table)?;
        let db = self.db.lock().unwrap();
        db.execute(
            &format!("UPDATE {table} SET teams_meeting_link = ?1 WHERE id = ?2"),
            (link, id),
        )
    }

    /// Persists a recording share URL.
    pub fn update_recording(&self, table: &str, id: i64, url: &str) -> Result<usize> {
        ensure_valid_table(table)?;
        let db = self.db.lock().unwrap();
        db.execute(
            &format!("UPDATE {table} SET session_recording = ?1 WHERE id = ?2"),
            (url, id),
        )
    }

    /// Moves a session to a new date/time and clears its meeting link in the
    /// same statement, so a reschedule can never leave a stale link behind.
    pub fn update_schedule(
        &self,
        table: &str,
        id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<usize> {
        ensure_valid_table(table)?;
        let db = self.db.lock().unwrap();
        db.execute(
            &format!(
                "UPDATE {table} SET date = ?1, time = ?2, teams_meeting_link = NULL WHERE id = ?3"
            ),
            (date, time, id),
        )
    }

    /// Sets or removes the mentor-swap override.
    pub fn update_swapped_mentor(
        &self,
        table: &str,
        id: i64,
        mentor_id: Option<i64>,
    ) -> Result<usize> {
        ensure_valid_table(table)?;
        let db = self.db.lock().unwrap();
        db.execute(
            &format!("UPDATE {table} SET swapped_mentor_id = ?1 WHERE id = ?2"),
            (mentor_id, id),
        )
    }

    /// Replaces the material-links list for a session.
    pub fn update_material_links(&self, table: &str, id: i64, links: &[String]) -> Result<usize> {
        ensure_valid_table(table)?;
        let db = self.db.lock().unwrap();
        db.execute(
            &format!("UPDATE {table} SET material_links = ?1 WHERE id = ?2"),
            (join_material_links(links), id),
        )
    }

    /// Appends one material link to a session's list.
    pub fn append_material_link(&self, table: &str, id: i64, link: &str) -> Result<usize> {
        let session = self
            .session_by_id(table, id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        let mut links = session.material_links;
        links.push(link.to_string());
        self.update_material_links(table, id, &links)
    }

    /// Removes one material link from a session's list, if present.
    pub fn remove_material_link(&self, table: &str, id: i64, link: &str) -> Result<usize> {
        let session = self
            .session_by_id(table, id)?
            .ok_or(rusqlite::Error::QueryReturnedNoRows)?;
        let links: Vec<String> = session
            .material_links
            .into_iter()
            .filter(|l| l != link)
            .collect();
        self.update_material_links(table, id, &links)
    }

    /// Direct connection access for test fixtures.
    #[cfg(test)]
    pub(crate) fn raw_connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.db.lock().unwrap()
    }

    /// Looks up one mentor from the directory.
    pub fn mentor_by_id(&self, id: i64) -> Result<Option<Mentor>> {
        let db = self.db.lock().unwrap();
        db.query_row(
            "SELECT id, name, email, phone, is_super FROM mentors WHERE id = ?1",
            [id],
            row_to_mentor,
        )
        .optional()
    }

    /// All super-mentors (flat directory, not cohort-scoped).
    pub fn super_mentors(&self) -> Result<Vec<Mentor>> {
        let db = self.db.lock().unwrap();
        let mut stmt =
            db.prepare("SELECT id, name, email, phone, is_super FROM mentors WHERE is_super = 1")?;
        let mentors = stmt.query_map([], row_to_mentor)?;
        mentors.collect()
    }

    /// Emails of every student enrolled in the given cohort.
    pub fn student_emails(&self, cohort: &Cohort) -> Result<Vec<String>> {
        let db = self.db.lock().unwrap();
        let mut stmt = db.prepare(
            "SELECT email FROM students WHERE cohort_type = ?1 AND cohort_number = ?2",
        )?;
        let emails = stmt.query_map(
            (&cohort.cohort_type, &cohort.number),
            |row| row.get::<_, String>(0),
        )?;
        emails.collect()
    }
}

fn tables_or_fallback(result: Result<Vec<String>>, fallback: &[String]) -> Vec<String> {
    match result {
        Ok(tables) if !tables.is_empty() => tables,
        Ok(_) => {
            warn!("No cohort tables discovered, using fallback list");
            fallback.to_vec()
        }
        Err(e) => {
            warn!(error = %e, "Cohort table discovery failed, using fallback list");
            fallback.to_vec()
        }
    }
}

/// True for errors caused by a cohort table that has not been migrated to
/// the expected schema yet (missing table or column).
pub fn is_schema_error(e: &rusqlite::Error) -> bool {
    let msg = e.to_string();
    msg.contains("no such table") || msg.contains("no such column")
}

// Table names cannot be bound parameters; only names matching the cohort
// convention are ever interpolated.
fn ensure_valid_table(table: &str) -> Result<()> {
    if Cohort::from_table_name(table).is_some() {
        Ok(())
    } else {
        Err(rusqlite::Error::InvalidQuery)
    }
}

fn row_to_session(row: &Row<'_>) -> Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        date: row.get(1)?,
        time: row.get::<_, Option<NaiveTime>>(2)?,
        week_number: row.get(3)?,
        session_number: row.get(4)?,
        subject_name: row.get(5)?,
        subject_topic: row.get(6)?,
        session_type: row.get(7)?,
        mentor_id: row.get(8)?,
        swapped_mentor_id: row.get(9)?,
        teams_meeting_link: row.get(10)?,
        session_recording: row.get(11)?,
        material_links: split_material_links(row.get::<_, Option<String>>(12)?.as_deref()),
    })
}

fn row_to_mentor(row: &Row<'_>) -> Result<Mentor> {
    Ok(Mentor {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        is_super: row.get::<_, i64>(4)? != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

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

    fn insert_session(store: &ScheduleStore, id: i64, date: &str, week: i64, number: i64) {
        let db = store.db.lock().unwrap();
        db.execute(
            "INSERT INTO basic1_1_schedule
                (id, date, time, week_number, session_number, subject_name, session_type, mentor_id)
             VALUES (?1, ?2, '19:00:00', ?3, ?4, 'Web Development', 'Live Session', 5)",
            (id, date, week, number),
        )
        .unwrap();
    }

    #[test]
    fn test_discovery_filters_by_convention() {
        let store = test_store();
        let tables = store.list_cohort_tables(&[]);
        assert_eq!(tables, vec!["basic1_1_schedule".to_string()]);
    }

    #[test]
    fn test_discovery_error_degrades_to_fallback() {
        let fallback = vec!["basic1_1_schedule".to_string()];
        let tables = tables_or_fallback(Err(rusqlite::Error::InvalidQuery), &fallback);
        assert_eq!(tables, fallback);
    }

    #[test]
    fn test_empty_discovery_degrades_to_fallback() {
        let fallback = vec!["basic1_1_schedule".to_string()];
        assert_eq!(tables_or_fallback(Ok(Vec::new()), &fallback), fallback);
    }

    #[test]
    fn test_adjacent_sessions_follow_table_order() {
        let store = test_store();
        // Dates deliberately out of order relative to (week, session) order
        insert_session(&store, 1, "2026-01-10", 1, 1);
        insert_session(&store, 2, "2026-01-05", 1, 2);
        insert_session(&store, 3, "2026-01-20", 2, 1);

        let next = store.next_session("basic1_1_schedule", 1, 1).unwrap().unwrap();
        assert_eq!(next.id, 2);
        let prev = store.previous_session("basic1_1_schedule", 2, 1).unwrap().unwrap();
        assert_eq!(prev.id, 2);
        assert!(store.previous_session("basic1_1_schedule", 1, 1).unwrap().is_none());
    }

    #[test]
    fn test_update_schedule_clears_meeting_link() {
        let store = test_store();
        insert_session(&store, 1, "2026-01-10", 1, 1);
        store
            .update_meeting_link("basic1_1_schedule", 1, "https://teams.example/j/1")
            .unwrap();

        store
            .update_schedule(
                "basic1_1_schedule",
                1,
                NaiveDate::from_ymd_opt(2026, 1, 12).unwrap(),
                NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
            )
            .unwrap();

        let session = store.session_by_id("basic1_1_schedule", 1).unwrap().unwrap();
        assert_eq!(session.date, NaiveDate::from_ymd_opt(2026, 1, 12));
        assert!(!session.has_meeting_link());
    }

    #[test]
    fn test_invalid_table_name_rejected() {
        let store = test_store();
        let err = store.session_by_id("mentors; DROP TABLE mentors", 1);
        assert!(err.is_err());
    }

    #[test]
    fn test_material_link_append_remove() {
        let store = test_store();
        insert_session(&store, 1, "2026-01-10", 1, 1);
        store
            .append_material_link("basic1_1_schedule", 1, "https://notes.example/a")
            .unwrap();
        store
            .append_material_link("basic1_1_schedule", 1, "https://notes.example/b")
            .unwrap();
        store
            .remove_material_link("basic1_1_schedule", 1, "https://notes.example/a")
            .unwrap();

        let session = store.session_by_id("basic1_1_schedule", 1).unwrap().unwrap();
        assert_eq!(session.material_links, vec!["https://notes.example/b".to_string()]);
    }
}
