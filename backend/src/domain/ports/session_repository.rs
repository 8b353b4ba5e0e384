//! Port for learning-session persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::session::{
    Difficulty, LearningSession, MeetingDetails, SessionParticipant,
};

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by session repository adapters.
    pub enum SessionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "session repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "session repository query failed: {message}",
    }
}

/// Payload for inserting a new session.
#[derive(Debug, Clone)]
pub struct NewSessionRecord {
    /// Pre-generated primary key.
    pub id: Uuid,
    /// Headline.
    pub title: String,
    /// Session content description.
    pub description: String,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Derived end.
    pub end_time: DateTime<Utc>,
    /// Planned length in minutes.
    pub duration_minutes: i32,
    /// Capacity limit.
    pub max_participants: i32,
    /// Advertised difficulty.
    pub difficulty: Difficulty,
    /// Creator user id (also enrolled as host).
    pub created_by: Uuid,
}

/// A session as listed for one caller.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionListing {
    /// The session itself.
    pub session: LearningSession,
    /// Number of active participant rows.
    pub active_participants: i64,
    /// Whether the caller holds an active participation.
    pub joined: bool,
}

/// Caller-independent dashboard counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionDashboard {
    /// Sessions created by or joined by the user.
    pub total_sessions: i64,
    /// Of those, sessions that completed.
    pub completed_sessions: i64,
    /// Running sessions the user actively joined.
    pub active_joined: i64,
}

/// Port for session reads and state transitions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Insert a session and enrol the creator as host, atomically.
    async fn create(
        &self,
        record: &NewSessionRecord,
    ) -> Result<LearningSession, SessionRepositoryError>;

    /// All sessions, newest start first, annotated for `for_user`.
    async fn list_all(
        &self,
        for_user: Uuid,
    ) -> Result<Vec<SessionListing>, SessionRepositoryError>;

    /// Find a session by id.
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<LearningSession>, SessionRepositoryError>;

    /// Count participant rows in an active status.
    async fn active_participant_count(
        &self,
        session_id: Uuid,
    ) -> Result<i64, SessionRepositoryError>;

    /// Find the caller's active participation row, if any.
    async fn find_active_participation(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<SessionParticipant>, SessionRepositoryError>;

    /// Purge the caller's stale terminal rows and enrol them, atomically.
    async fn join(&self, session_id: Uuid, user_id: Uuid)
    -> Result<(), SessionRepositoryError>;

    /// All participant rows of a session.
    async fn participants(
        &self,
        session_id: Uuid,
    ) -> Result<Vec<SessionParticipant>, SessionRepositoryError>;

    /// Attach meeting details to a session.
    async fn set_meeting(
        &self,
        session_id: Uuid,
        meeting: &MeetingDetails,
    ) -> Result<(), SessionRepositoryError>;

    /// Move a session to `IN_PROGRESS`.
    async fn mark_started(&self, session_id: Uuid) -> Result<(), SessionRepositoryError>;

    /// Complete the session and the caller's participation rows, atomically.
    async fn complete(
        &self,
        session_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), SessionRepositoryError>;

    /// How many sessions the user has completed overall.
    async fn completed_count_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<i64, SessionRepositoryError>;

    /// Aggregate dashboard counters for the user.
    async fn dashboard_stats(
        &self,
        user_id: Uuid,
    ) -> Result<SessionDashboard, SessionRepositoryError>;

    /// Upcoming scheduled sessions the user created or joined.
    async fn upcoming_for_user(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<LearningSession>, SessionRepositoryError>;
}
