//! Session mutation operations: reschedule and mentor swap.
//!
//! A session's schedule has exactly one transition:
//! `Scheduled(date, time, link)` -> reschedule -> `Scheduled(date', time', link=null)`.
//! The link is always cleared so the next batch run re-provisions it.
//! Mentor swap toggles the `swapped_mentor_id` override; only setting it
//! to a value fans out notifications.

pub mod reschedule;
pub mod swap;

pub use reschedule::{candidate_dates, reschedule, Direction, RescheduleRequest};
pub use swap::{mentor_swap, SwapOutcome, SwapRequest};

use chrono::NaiveDate;
use thiserror::Error;

/// Errors surfaced to the dashboard from mutation operations.
#[derive(Debug, Error)]
pub enum MutationError {
    #[error("Session {id} not found in {table}")]
    SessionNotFound { table: String, id: i64 },

    #[error("Mentor {id} not found")]
    MentorNotFound { id: i64 },

    #[error("Session has no scheduled date")]
    Unscheduled,

    #[error("No change requested: date and time are unchanged")]
    NoChange,

    #[error("Requested date {date} is not in the offerable candidate set")]
    DateUnavailable { date: NaiveDate },

    #[error("Invalid time change: {message}")]
    InvalidTimeDirection { message: String },

    #[error("Database error: {message}")]
    Persistence { message: String },
}

impl MutationError {
    /// True for errors the dashboard should present as validation issues
    /// rather than server failures.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            MutationError::NoChange
                | MutationError::Unscheduled
                | MutationError::DateUnavailable { .. }
                | MutationError::InvalidTimeDirection { .. }
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            MutationError::SessionNotFound { .. } | MutationError::MentorNotFound { .. }
        )
    }
}

impl From<rusqlite::Error> for MutationError {
    fn from(err: rusqlite::Error) -> Self {
        MutationError::Persistence {
            message: err.to_string(),
        }
    }
}
