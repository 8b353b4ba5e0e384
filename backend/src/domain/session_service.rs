//! Learning-session use-cases: list, create, join, start, complete.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde_json::json;
use uuid::Uuid;

use super::challenge::QUICK_STARTER_BADGE;
use super::error::Error;
use super::notification::{NewNotification, NotificationKind, RelatedEntity};
use super::ports::{
    ChallengeRepository, ChallengeRepositoryError, MeetingRequest, MeetingScheduler,
    NewSessionRecord, NotificationRepository, NotificationRepositoryError, SessionListing,
    SessionRepository, SessionRepositoryError, UserRepository, UserRepositoryError,
};
use super::session::{
    DEFAULT_MAX_PARTICIPANTS, Difficulty, LearningSession, SessionStatus, StartRefusal,
};

fn map_session_error(error: SessionRepositoryError) -> Error {
    match error {
        SessionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("session repository unavailable: {message}"))
        }
        SessionRepositoryError::Query { message } => {
            Error::internal(format!("session repository error: {message}"))
        }
    }
}

fn map_user_error(error: UserRepositoryError) -> Error {
    match error {
        UserRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("user repository unavailable: {message}"))
        }
        other => Error::internal(format!("user repository error: {other}")),
    }
}

fn map_notification_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("notification repository unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification repository error: {message}"))
        }
    }
}

fn map_challenge_error(error: ChallengeRepositoryError) -> Error {
    match error {
        ChallengeRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("challenge repository unavailable: {message}"))
        }
        ChallengeRepositoryError::Query { message } => {
            Error::internal(format!("challenge repository error: {message}"))
        }
    }
}

/// Validated payload for creating a session.
#[derive(Debug, Clone)]
pub struct SessionDraft {
    /// Headline.
    pub title: String,
    /// Session content description.
    pub description: String,
    /// Scheduled start.
    pub start_time: DateTime<Utc>,
    /// Planned length in minutes.
    pub duration_minutes: i32,
    /// Capacity limit; defaults to [`DEFAULT_MAX_PARTICIPANTS`].
    pub max_participants: Option<i32>,
    /// Advertised difficulty; defaults to intermediate.
    pub difficulty: Option<Difficulty>,
}

/// Result of starting a session.
#[derive(Debug, Clone, PartialEq)]
pub struct StartedSession {
    /// Meeting link participants should use, when one exists.
    pub meet_link: Option<String>,
}

/// Result of completing a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionResult {
    /// Whether this completion earned the first-session badge.
    pub badge_awarded: bool,
}

/// Session service over the session, user, badge, and notification ports plus
/// the calendar integration.
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn SessionRepository>,
    users: Arc<dyn UserRepository>,
    challenges: Arc<dyn ChallengeRepository>,
    notifications: Arc<dyn NotificationRepository>,
    scheduler: Arc<dyn MeetingScheduler>,
}

impl SessionService {
    /// Create the service from its ports.
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        users: Arc<dyn UserRepository>,
        challenges: Arc<dyn ChallengeRepository>,
        notifications: Arc<dyn NotificationRepository>,
        scheduler: Arc<dyn MeetingScheduler>,
    ) -> Self {
        Self {
            sessions,
            users,
            challenges,
            notifications,
            scheduler,
        }
    }

    /// All sessions annotated for the caller.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<SessionListing>, Error> {
        self.sessions
            .list_all(user_id)
            .await
            .map_err(map_session_error)
    }

    /// Create a session, request a meeting link, and notify the creator.
    ///
    /// Meeting creation is best-effort: when the scheduler yields nothing the
    /// session is returned without a link.
    pub async fn create(
        &self,
        user_id: Uuid,
        draft: SessionDraft,
    ) -> Result<LearningSession, Error> {
        let record = validate_draft(user_id, draft)?;

        let mut session = self
            .sessions
            .create(&record)
            .await
            .map_err(map_session_error)?;

        let creator_email = self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .map(|user| user.email.to_string());

        let meeting_request = MeetingRequest {
            title: session.title.clone(),
            start_time: session.start_time,
            end_time: session.end_time,
            attendee_emails: creator_email.into_iter().collect(),
        };
        if let Some(meeting) = self.scheduler.schedule_meeting(&meeting_request).await {
            self.sessions
                .set_meeting(session.id, &meeting)
                .await
                .map_err(map_session_error)?;
            session.meet_link = Some(meeting.meet_link);
            session.calendar_event_id = Some(meeting.event_id);
        }

        self.notifications
            .insert(&NewNotification::about(
                user_id,
                NotificationKind::SessionCreated,
                "Session Created",
                format!(
                    "Your session \"{}\" has been created successfully.",
                    session.title
                ),
                RelatedEntity::Session,
                session.id,
            ))
            .await
            .map_err(map_notification_error)?;

        Ok(session)
    }

    /// Enrol the caller in a scheduled session.
    pub async fn join(&self, user_id: Uuid, session_id: Uuid) -> Result<(), Error> {
        let session = self.find_session(session_id).await?;

        if session.status != SessionStatus::Scheduled {
            return Err(Error::invalid_request(
                "session is not available for joining",
            ));
        }

        let active = self
            .sessions
            .active_participant_count(session_id)
            .await
            .map_err(map_session_error)?;
        if !session.has_capacity(active) {
            return Err(Error::invalid_request("session is full"));
        }

        if self
            .sessions
            .find_active_participation(session_id, user_id)
            .await
            .map_err(map_session_error)?
            .is_some()
        {
            return Err(Error::conflict("already joined this session"));
        }

        self.sessions
            .join(session_id, user_id)
            .await
            .map_err(map_session_error)?;

        let joiner = self.display_name(user_id).await?;
        self.notifications
            .insert(&NewNotification::about(
                session.created_by,
                NotificationKind::SessionJoined,
                "New Session Participant",
                format!("{joiner} has joined your session \"{}\"", session.title),
                RelatedEntity::Session,
                session_id,
            ))
            .await
            .map_err(map_notification_error)?;

        Ok(())
    }

    /// Start a scheduled session, creating a meeting link when none exists.
    pub async fn start(&self, user_id: Uuid, session_id: Uuid) -> Result<StartedSession, Error> {
        let session = self.find_session(session_id).await?;

        session
            .check_start(user_id, Utc::now())
            .map_err(|refusal| map_start_refusal(&session, refusal))?;

        let participants = self
            .sessions
            .participants(session_id)
            .await
            .map_err(map_session_error)?;

        let mut meet_link = session.meet_link.clone();
        if meet_link.is_none() {
            let mut attendee_emails = Vec::with_capacity(participants.len());
            for participant in &participants {
                let user = self
                    .users
                    .find_by_id(participant.user_id)
                    .await
                    .map_err(map_user_error)?;
                if let Some(user) = user {
                    attendee_emails.push(user.email.to_string());
                }
            }
            let request = MeetingRequest {
                title: session.title.clone(),
                start_time: session.start_time,
                end_time: session.end_time,
                attendee_emails,
            };
            if let Some(meeting) = self.scheduler.schedule_meeting(&request).await {
                self.sessions
                    .set_meeting(session_id, &meeting)
                    .await
                    .map_err(map_session_error)?;
                meet_link = Some(meeting.meet_link);
            }
        }

        self.sessions
            .mark_started(session_id)
            .await
            .map_err(map_session_error)?;

        let join_hint = if meet_link.is_some() {
            " Click to join the meeting."
        } else {
            ""
        };
        let batch: Vec<NewNotification> = participants
            .iter()
            .map(|participant| {
                NewNotification::about(
                    participant.user_id,
                    NotificationKind::SessionStarted,
                    "Session Started",
                    format!(
                        "The session \"{}\" has started.{join_hint}",
                        session.title
                    ),
                    RelatedEntity::Session,
                    session_id,
                )
            })
            .collect();
        self.notifications
            .insert_many(&batch)
            .await
            .map_err(map_notification_error)?;

        Ok(StartedSession { meet_link })
    }

    /// Complete a session for the caller, awarding the first-session badge.
    pub async fn complete(
        &self,
        user_id: Uuid,
        session_id: Uuid,
    ) -> Result<CompletionResult, Error> {
        let session = self.find_session(session_id).await?;

        let participation = self
            .sessions
            .find_active_participation(session_id, user_id)
            .await
            .map_err(map_session_error)?;
        if participation.is_none() && session.created_by != user_id {
            return Err(Error::forbidden("not a participant of this session"));
        }

        self.sessions
            .complete(session_id, user_id)
            .await
            .map_err(map_session_error)?;

        let completed = self
            .sessions
            .completed_count_for_user(user_id)
            .await
            .map_err(map_session_error)?;

        let mut badge_awarded = false;
        if completed == 1 {
            badge_awarded = self
                .challenges
                .award_badge(user_id, &QUICK_STARTER_BADGE)
                .await
                .map_err(map_challenge_error)?;
            if badge_awarded {
                self.notifications
                    .insert(&NewNotification::plain(
                        user_id,
                        NotificationKind::BadgeEarned,
                        "Badge Earned!",
                        format!(
                            "Congratulations! You've earned the {} badge for completing your first session!",
                            QUICK_STARTER_BADGE.name
                        ),
                    ))
                    .await
                    .map_err(map_notification_error)?;
            }
        }

        if session.created_by != user_id {
            let completer = self.display_name(user_id).await?;
            self.notifications
                .insert(&NewNotification::about(
                    session.created_by,
                    NotificationKind::SessionCompleted,
                    "Session Completed",
                    format!("{completer} has completed the session \"{}\"", session.title),
                    RelatedEntity::Session,
                    session_id,
                ))
                .await
                .map_err(map_notification_error)?;
        }

        Ok(CompletionResult { badge_awarded })
    }

    async fn find_session(&self, session_id: Uuid) -> Result<LearningSession, Error> {
        self.sessions
            .find_by_id(session_id)
            .await
            .map_err(map_session_error)?
            .ok_or_else(|| Error::not_found("session not found"))
    }

    async fn display_name(&self, user_id: Uuid) -> Result<String, Error> {
        Ok(self
            .users
            .find_by_id(user_id)
            .await
            .map_err(map_user_error)?
            .map_or_else(|| "A user".to_owned(), |user| user.name.to_string()))
    }
}

fn validate_draft(user_id: Uuid, draft: SessionDraft) -> Result<NewSessionRecord, Error> {
    let title = draft.title.trim().to_owned();
    if title.is_empty() {
        return Err(
            Error::invalid_request("title must not be empty")
                .with_details(json!({ "field": "title" })),
        );
    }
    let description = draft.description.trim().to_owned();
    if description.is_empty() {
        return Err(Error::invalid_request("description must not be empty")
            .with_details(json!({ "field": "description" })));
    }
    if draft.duration_minutes <= 0 {
        return Err(Error::invalid_request("duration must be positive")
            .with_details(json!({ "field": "duration", "value": draft.duration_minutes })));
    }
    let max_participants = draft.max_participants.unwrap_or(DEFAULT_MAX_PARTICIPANTS);
    if max_participants < 1 {
        return Err(Error::invalid_request("maxParticipants must be at least 1")
            .with_details(json!({ "field": "maxParticipants", "value": max_participants })));
    }

    let end_time = draft.start_time + Duration::minutes(i64::from(draft.duration_minutes));
    Ok(NewSessionRecord {
        id: Uuid::new_v4(),
        title,
        description,
        start_time: draft.start_time,
        end_time,
        duration_minutes: draft.duration_minutes,
        max_participants,
        difficulty: draft.difficulty.unwrap_or(Difficulty::Intermediate),
        created_by: user_id,
    })
}

fn map_start_refusal(session: &LearningSession, refusal: StartRefusal) -> Error {
    match refusal {
        StartRefusal::NotCreator => {
            Error::forbidden("only the session creator can start the session")
        }
        StartRefusal::WrongStatus { status } => Error::invalid_request(format!(
            "session cannot be started - current status is {status}"
        ))
        .with_details(json!({
            "currentStatus": status.as_str(),
            "requiredStatus": SessionStatus::Scheduled.as_str(),
        })),
        StartRefusal::TooEarly { earliest } => Error::invalid_request(
            "session cannot be started yet - sessions open 30 minutes before the scheduled start",
        )
        .with_details(json!({
            "startTime": session.start_time.to_rfc3339(),
            "earliestStartTime": earliest.to_rfc3339(),
        })),
    }
}

#[cfg(test)]
#[path = "session_service_tests.rs"]
mod tests;
