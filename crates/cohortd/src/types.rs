//! Shared application state and regional time helpers.

use crate::config::AppConfig;
use crate::db::ScheduleStore;
use crate::drive::{DriveClient, RecordingCache};
use crate::graph::GraphMeetingClient;
use crate::notify::{ChatClient, EmailClient};
use chrono::{FixedOffset, NaiveDate, Utc};

/// All session times are interpreted in a fixed regional timezone (IST).
pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(5 * 3600 + 30 * 60).expect("IST offset is valid")
}

/// Today's calendar date in IST.
pub fn today_ist() -> NaiveDate {
    Utc::now().with_timezone(&ist()).date_naive()
}

/// Shared server state, wrapped in an `Arc` by the router.
pub struct AppState {
    pub config: AppConfig,
    pub store: ScheduleStore,
    pub meetings: GraphMeetingClient,
    pub drive: DriveClient,
    pub recording_cache: RecordingCache,
    pub email: EmailClient,
    pub chat: ChatClient,
}
