//! Port for the calendar / video-meeting integration.
//!
//! Meeting creation is best-effort: adapters log failures and return `None`
//! so session flows proceed without a link rather than failing the request.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::session::MeetingDetails;

/// Request to schedule a video meeting for a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRequest {
    /// Event summary (session title).
    pub title: String,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Scheduled end.
    pub end_time: DateTime<Utc>,
    /// Attendee emails, shared through the app rather than invited directly.
    pub attendee_emails: Vec<String>,
}

/// Port for creating and cancelling meetings.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MeetingScheduler: Send + Sync {
    /// Create a meeting; `None` when the integration is unavailable.
    async fn schedule_meeting(&self, request: &MeetingRequest) -> Option<MeetingDetails>;

    /// Delete the calendar event backing a meeting; best-effort.
    async fn cancel_meeting(&self, event_id: &str);
}

/// Scheduler used when the calendar integration is not configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledMeetingScheduler;

#[async_trait]
impl MeetingScheduler for DisabledMeetingScheduler {
    async fn schedule_meeting(&self, _request: &MeetingRequest) -> Option<MeetingDetails> {
        None
    }

    async fn cancel_meeting(&self, _event_id: &str) {}
}
