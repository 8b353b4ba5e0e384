//! Behaviour coverage for [`super::SessionService`] over mocked ports.

use std::sync::Arc;

use chrono::{Duration, Utc};
use mockall::predicate::eq;
use uuid::Uuid;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{
    MockChallengeRepository, MockMeetingScheduler, MockNotificationRepository,
    MockSessionRepository, MockUserRepository,
};
use crate::domain::session::{MeetingDetails, ParticipantRole, ParticipantStatus, SessionParticipant};
use crate::domain::user::{EmailAddress, User, UserName};

struct Mocks {
    sessions: MockSessionRepository,
    users: MockUserRepository,
    challenges: MockChallengeRepository,
    notifications: MockNotificationRepository,
    scheduler: MockMeetingScheduler,
}

impl Mocks {
    fn new() -> Self {
        Self {
            sessions: MockSessionRepository::new(),
            users: MockUserRepository::new(),
            challenges: MockChallengeRepository::new(),
            notifications: MockNotificationRepository::new(),
            scheduler: MockMeetingScheduler::new(),
        }
    }

    fn into_service(self) -> SessionService {
        SessionService::new(
            Arc::new(self.sessions),
            Arc::new(self.users),
            Arc::new(self.challenges),
            Arc::new(self.notifications),
            Arc::new(self.scheduler),
        )
    }
}

fn scheduled_session(created_by: Uuid) -> LearningSession {
    let start = Utc::now() + Duration::minutes(10);
    LearningSession {
        id: Uuid::new_v4(),
        title: "Lifetimes workshop".to_owned(),
        description: "Hands-on lifetimes".to_owned(),
        start_time: start,
        end_time: start + Duration::minutes(60),
        duration_minutes: 60,
        max_participants: 2,
        difficulty: Difficulty::Intermediate,
        status: SessionStatus::Scheduled,
        meet_link: None,
        calendar_event_id: None,
        created_by,
        created_at: Utc::now(),
    }
}

fn participant(session_id: Uuid, user_id: Uuid) -> SessionParticipant {
    SessionParticipant {
        id: Uuid::new_v4(),
        session_id,
        user_id,
        role: ParticipantRole::Participant,
        status: ParticipantStatus::Joined,
        joined_at: Utc::now(),
    }
}

fn account(id: Uuid, name: &str, email: &str) -> User {
    User {
        id,
        name: UserName::new(name).expect("valid name"),
        email: EmailAddress::new(email).expect("valid email"),
        bio: None,
        created_at: Utc::now(),
    }
}

fn draft() -> SessionDraft {
    SessionDraft {
        title: "Lifetimes workshop".to_owned(),
        description: "Hands-on lifetimes".to_owned(),
        start_time: Utc::now() + Duration::hours(2),
        duration_minutes: 60,
        max_participants: None,
        difficulty: None,
    }
}

#[tokio::test]
async fn create_attaches_meeting_when_scheduler_succeeds() {
    let creator = Uuid::new_v4();
    let mut mocks = Mocks::new();

    let created = scheduled_session(creator);
    let session_id = created.id;
    mocks
        .sessions
        .expect_create()
        .withf(|record| record.max_participants == DEFAULT_MAX_PARTICIPANTS)
        .return_once(move |_| Ok(created));
    mocks
        .users
        .expect_find_by_id()
        .return_once(move |id| Ok(Some(account(id, "Host", "host@example.com"))));
    mocks.scheduler.expect_schedule_meeting().returning(|_| {
        Some(MeetingDetails {
            meet_link: "https://meet.example/abc".to_owned(),
            event_id: "evt_1".to_owned(),
        })
    });
    mocks
        .sessions
        .expect_set_meeting()
        .with(eq(session_id), eq(MeetingDetails {
            meet_link: "https://meet.example/abc".to_owned(),
            event_id: "evt_1".to_owned(),
        }))
        .returning(|_, _| Ok(()));
    mocks
        .notifications
        .expect_insert()
        .withf(|note| note.kind == NotificationKind::SessionCreated)
        .returning(|_| Ok(()));

    let svc = mocks.into_service();
    let session = svc.create(creator, draft()).await.expect("create succeeds");
    assert_eq!(session.meet_link.as_deref(), Some("https://meet.example/abc"));
}

#[tokio::test]
async fn create_proceeds_without_meeting_when_scheduler_fails() {
    let creator = Uuid::new_v4();
    let mut mocks = Mocks::new();

    let created = scheduled_session(creator);
    mocks.sessions.expect_create().return_once(move |_| Ok(created));
    mocks
        .users
        .expect_find_by_id()
        .return_once(move |id| Ok(Some(account(id, "Host", "host@example.com"))));
    mocks.scheduler.expect_schedule_meeting().returning(|_| None);
    mocks.sessions.expect_set_meeting().never();
    mocks.notifications.expect_insert().returning(|_| Ok(()));

    let svc = mocks.into_service();
    let session = svc.create(creator, draft()).await.expect("create succeeds");
    assert!(session.meet_link.is_none());
}

#[tokio::test]
async fn create_rejects_blank_title() {
    let svc = Mocks::new().into_service();
    let mut bad = draft();
    bad.title = "   ".to_owned();
    let err = svc
        .create(Uuid::new_v4(), bad)
        .await
        .expect_err("blank title fails");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn join_rejects_full_session() {
    let creator = Uuid::new_v4();
    let joiner = Uuid::new_v4();
    let session = scheduled_session(creator);
    let session_id = session.id;

    let mut mocks = Mocks::new();
    mocks
        .sessions
        .expect_find_by_id()
        .with(eq(session_id))
        .return_once(move |_| Ok(Some(session)));
    mocks
        .sessions
        .expect_active_participant_count()
        .returning(|_| Ok(2));
    mocks.sessions.expect_join().never();

    let svc = mocks.into_service();
    let err = svc
        .join(joiner, session_id)
        .await
        .expect_err("full session refuses joins");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    assert_eq!(err.message(), "session is full");
}

#[tokio::test]
async fn join_rejects_double_enrolment() {
    let creator = Uuid::new_v4();
    let joiner = Uuid::new_v4();
    let session = scheduled_session(creator);
    let session_id = session.id;

    let mut mocks = Mocks::new();
    mocks
        .sessions
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(session)));
    mocks
        .sessions
        .expect_active_participant_count()
        .returning(|_| Ok(0));
    mocks
        .sessions
        .expect_find_active_participation()
        .return_once(move |sid, uid| Ok(Some(participant(sid, uid))));
    mocks.sessions.expect_join().never();

    let svc = mocks.into_service();
    let err = svc
        .join(joiner, session_id)
        .await
        .expect_err("double join refused");
    assert_eq!(err.code(), ErrorCode::Conflict);
}

#[tokio::test]
async fn join_notifies_the_creator() {
    let creator = Uuid::new_v4();
    let joiner = Uuid::new_v4();
    let session = scheduled_session(creator);
    let session_id = session.id;

    let mut mocks = Mocks::new();
    mocks
        .sessions
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(session)));
    mocks
        .sessions
        .expect_active_participant_count()
        .returning(|_| Ok(0));
    mocks
        .sessions
        .expect_find_active_participation()
        .returning(|_, _| Ok(None));
    mocks
        .sessions
        .expect_join()
        .with(eq(session_id), eq(joiner))
        .returning(|_, _| Ok(()));
    mocks
        .users
        .expect_find_by_id()
        .return_once(move |id| Ok(Some(account(id, "Joy", "joy@example.com"))));
    mocks
        .notifications
        .expect_insert()
        .withf(move |note| {
            note.user_id == creator
                && note.kind == NotificationKind::SessionJoined
                && note.message.contains("Joy")
        })
        .returning(|_| Ok(()));

    let svc = mocks.into_service();
    svc.join(joiner, session_id).await.expect("join succeeds");
}

#[tokio::test]
async fn start_requires_the_creator() {
    let creator = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let session = scheduled_session(creator);
    let session_id = session.id;

    let mut mocks = Mocks::new();
    mocks
        .sessions
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(session)));
    mocks.sessions.expect_mark_started().never();

    let svc = mocks.into_service();
    let err = svc
        .start(stranger, session_id)
        .await
        .expect_err("stranger cannot start");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}

#[tokio::test]
async fn start_creates_meeting_and_notifies_participants() {
    let creator = Uuid::new_v4();
    let other = Uuid::new_v4();
    let session = scheduled_session(creator);
    let session_id = session.id;

    let mut mocks = Mocks::new();
    mocks
        .sessions
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(session)));
    mocks.sessions.expect_participants().return_once(move |sid| {
        Ok(vec![participant(sid, creator), participant(sid, other)])
    });
    mocks
        .users
        .expect_find_by_id()
        .returning(|id| Ok(Some(account(id, "Someone", "someone@example.com"))));
    mocks.scheduler.expect_schedule_meeting().returning(|_| {
        Some(MeetingDetails {
            meet_link: "https://meet.example/xyz".to_owned(),
            event_id: "evt_2".to_owned(),
        })
    });
    mocks.sessions.expect_set_meeting().returning(|_, _| Ok(()));
    mocks
        .sessions
        .expect_mark_started()
        .with(eq(session_id))
        .returning(|_| Ok(()));
    mocks
        .notifications
        .expect_insert_many()
        .withf(|batch| {
            batch.len() == 2
                && batch
                    .iter()
                    .all(|note| note.kind == NotificationKind::SessionStarted)
        })
        .returning(|_| Ok(()));

    let svc = mocks.into_service();
    let started = svc.start(creator, session_id).await.expect("start succeeds");
    assert_eq!(started.meet_link.as_deref(), Some("https://meet.example/xyz"));
}

#[tokio::test]
async fn complete_awards_badge_on_first_completion() {
    let creator = Uuid::new_v4();
    let session = scheduled_session(creator);
    let session_id = session.id;

    let mut mocks = Mocks::new();
    mocks
        .sessions
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(session)));
    mocks
        .sessions
        .expect_find_active_participation()
        .return_once(move |sid, uid| Ok(Some(participant(sid, uid))));
    mocks
        .sessions
        .expect_complete()
        .with(eq(session_id), eq(creator))
        .returning(|_, _| Ok(()));
    mocks
        .sessions
        .expect_completed_count_for_user()
        .returning(|_| Ok(1));
    mocks
        .challenges
        .expect_award_badge()
        .withf(|_, spec| spec.name == "Quick Starter")
        .returning(|_, _| Ok(true));
    mocks
        .notifications
        .expect_insert()
        .withf(|note| note.kind == NotificationKind::BadgeEarned)
        .returning(|_| Ok(()));

    let svc = mocks.into_service();
    let result = svc
        .complete(creator, session_id)
        .await
        .expect("complete succeeds");
    assert!(result.badge_awarded);
}

#[tokio::test]
async fn complete_refuses_non_participants() {
    let creator = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let session = scheduled_session(creator);
    let session_id = session.id;

    let mut mocks = Mocks::new();
    mocks
        .sessions
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(session)));
    mocks
        .sessions
        .expect_find_active_participation()
        .returning(|_, _| Ok(None));
    mocks.sessions.expect_complete().never();

    let svc = mocks.into_service();
    let err = svc
        .complete(stranger, session_id)
        .await
        .expect_err("stranger refused");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}
