//! Request/response types for the meeting provider API.

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

/// Everything needed to create one online meeting for a session.
#[derive(Debug, Clone)]
pub struct MeetingRequest {
    /// Human-readable subject, e.g. "Cohort Basic 1.1 - Web Development - Saswata"
    pub subject: String,
    /// Attendee emails: effective mentor plus all enrolled students
    pub attendees: Vec<String>,
    /// Session start in the fixed regional timezone
    pub start: DateTime<FixedOffset>,
    /// Session end (start + 90 minutes)
    pub end: DateTime<FixedOffset>,
}

/// Which creation tier produced the meeting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeetingTier {
    /// Calendar event with attendees and group chat (primary path)
    CalendarEvent,
    /// Standalone online meeting, no attendees or chat (fallback path)
    Standalone,
}

/// A successfully created meeting.
#[derive(Debug, Clone)]
pub struct ProvisionedMeeting {
    pub join_url: String,
    pub tier: MeetingTier,
}

#[derive(Debug, Deserialize)]
pub(super) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreatedEvent {
    pub online_meeting: Option<EventOnlineMeeting>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct EventOnlineMeeting {
    pub join_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OnlineMeeting {
    pub id: String,
    #[allow(dead_code)]
    pub join_web_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct OnlineMeetingList {
    pub value: Vec<OnlineMeeting>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CreatedOnlineMeeting {
    pub join_web_url: Option<String>,
}
