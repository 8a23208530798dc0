//! Row types for cohort schedule and directory tables.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// One scheduled class occurrence in a cohort schedule table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub week_number: i64,
    pub session_number: i64,
    pub subject_name: Option<String>,
    pub subject_topic: Option<String>,
    pub session_type: Option<String>,
    pub mentor_id: Option<i64>,
    pub swapped_mentor_id: Option<i64>,
    pub teams_meeting_link: Option<String>,
    pub session_recording: Option<String>,
    /// Supplementary material links; comma-joined in the database column
    pub material_links: Vec<String>,
}

impl Session {
    /// The mentor actually presenting: the swap override when present,
    /// otherwise the original assignment.
    pub fn effective_mentor_id(&self) -> Option<i64> {
        self.swapped_mentor_id.or(self.mentor_id)
    }

    /// True if the session already carries a usable meeting link.
    pub fn has_meeting_link(&self) -> bool {
        !is_blank_link(self.teams_meeting_link.as_deref())
    }

    /// True if a recording has already been attached.
    pub fn has_recording(&self) -> bool {
        !is_blank_link(self.session_recording.as_deref())
    }
}

/// Returns true for absent link values: null, blank, whitespace, or the
/// literal string "null" left behind by older writers.
pub fn is_blank_link(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => {
            let trimmed = v.trim();
            trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null")
        }
    }
}

/// Serializes material links into the comma-joined column representation.
pub fn join_material_links(links: &[String]) -> String {
    links.join(",")
}

/// Parses the comma-joined column representation into an ordered list.
pub fn split_material_links(raw: Option<&str>) -> Vec<String> {
    match raw {
        None => Vec::new(),
        Some(s) => s
            .split(',')
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .collect(),
    }
}

/// A mentor from the read-only directory table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Mentor {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub is_super: bool,
}
