//! Challenge use-cases: listing, creation, joining, progress updates.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use super::challenge::{
    CHALLENGE_CHAMPION_BADGE, Challenge, DEFAULT_GOAL_TARGET, DEFAULT_REWARD_POINTS,
    UserChallenge,
};
use super::error::Error;
use super::notification::{NewNotification, NotificationKind, RelatedEntity};
use super::ports::{
    ChallengeRepository, ChallengeRepositoryError, ChallengeWithProgress, NewChallengeRecord,
    NotificationRepository, NotificationRepositoryError, ProgressUpdate,
};

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

/// Validated payload for creating a challenge.
#[derive(Debug, Clone)]
pub struct ChallengeDraft {
    /// Headline.
    pub title: String,
    /// What must be achieved.
    pub description: String,
    /// Goal; defaults to [`DEFAULT_GOAL_TARGET`].
    pub goal_target: Option<i32>,
    /// Reward; defaults to [`DEFAULT_REWARD_POINTS`].
    pub reward_points: Option<i32>,
    /// Owning team, when raised for one.
    pub team_id: Option<Uuid>,
}

/// Result of a progress update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressResult {
    /// The refreshed progress row.
    pub user_challenge: UserChallenge,
    /// Whether this update completed the challenge and awarded a badge.
    pub badge_awarded: bool,
}

/// Challenge service over the challenge and notification ports.
#[derive(Clone)]
pub struct ChallengeService {
    challenges: Arc<dyn ChallengeRepository>,
    notifications: Arc<dyn NotificationRepository>,
}

impl ChallengeService {
    /// Create the service from its ports.
    pub fn new(
        challenges: Arc<dyn ChallengeRepository>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            challenges,
            notifications,
        }
    }

    /// Active challenges merged with the caller's progress.
    pub async fn list(&self, user_id: Uuid) -> Result<Vec<ChallengeWithProgress>, Error> {
        self.challenges
            .list_active_with_progress(user_id)
            .await
            .map_err(map_challenge_error)
    }

    /// Create a challenge.
    pub async fn create(&self, draft: ChallengeDraft) -> Result<Challenge, Error> {
        let title = draft.title.trim().to_owned();
        let description = draft.description.trim().to_owned();
        if title.is_empty() || description.is_empty() {
            return Err(Error::invalid_request("title and description are required"));
        }
        let goal_target = draft.goal_target.unwrap_or(DEFAULT_GOAL_TARGET);
        if goal_target < 1 {
            return Err(Error::invalid_request("goal target must be at least 1"));
        }

        self.challenges
            .create(&NewChallengeRecord {
                id: Uuid::new_v4(),
                title,
                description,
                goal_target,
                reward_points: draft.reward_points.unwrap_or(DEFAULT_REWARD_POINTS),
                team_id: draft.team_id,
            })
            .await
            .map_err(map_challenge_error)
    }

    /// Enrol the caller in an active challenge.
    pub async fn join(&self, user_id: Uuid, challenge_id: Uuid) -> Result<(), Error> {
        let challenge = self.find_challenge(challenge_id).await?;
        if !challenge.is_active() {
            return Err(Error::invalid_request(
                "challenge is not available for joining",
            ));
        }

        if self
            .challenges
            .find_user_challenge(user_id, challenge_id)
            .await
            .map_err(map_challenge_error)?
            .is_some()
        {
            return Err(Error::conflict("already joined this challenge"));
        }

        self.challenges
            .join(user_id, challenge_id)
            .await
            .map_err(map_challenge_error)
    }

    /// Record the caller's progress; crossing the goal awards the badge once.
    pub async fn update_progress(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
        progress: i32,
    ) -> Result<ProgressResult, Error> {
        if progress < 0 {
            return Err(Error::invalid_request("progress must not be negative"));
        }
        let challenge = self.find_challenge(challenge_id).await?;
        if !challenge.is_active() {
            return Err(Error::invalid_request("challenge is no longer active"));
        }

        let existing = self
            .challenges
            .find_user_challenge(user_id, challenge_id)
            .await
            .map_err(map_challenge_error)?;

        let completed = challenge.reaches_goal(progress);
        let newly_completed =
            completed && !existing.as_ref().is_some_and(|row| row.completed);

        let user_challenge = self
            .challenges
            .upsert_progress(&ProgressUpdate {
                user_id,
                challenge_id,
                progress,
                completed,
                completed_at: completed.then(Utc::now),
            })
            .await
            .map_err(map_challenge_error)?;

        let mut badge_awarded = false;
        if newly_completed {
            badge_awarded = self
                .challenges
                .award_badge(user_id, &CHALLENGE_CHAMPION_BADGE)
                .await
                .map_err(map_challenge_error)?;

            self.notifications
                .insert(&NewNotification::about(
                    user_id,
                    NotificationKind::ChallengeCompleted,
                    "Challenge Completed!",
                    format!(
                        "Congratulations! You've completed the \"{}\" challenge and earned a badge!",
                        challenge.title
                    ),
                    RelatedEntity::Challenge,
                    challenge_id,
                ))
                .await
                .map_err(map_notification_error)?;
        }

        Ok(ProgressResult {
            user_challenge,
            badge_awarded,
        })
    }

    async fn find_challenge(&self, challenge_id: Uuid) -> Result<Challenge, Error> {
        self.challenges
            .find_by_id(challenge_id)
            .await
            .map_err(map_challenge_error)?
            .ok_or_else(|| Error::not_found("challenge not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::challenge::ChallengeStatus;
    use crate::domain::ports::{MockChallengeRepository, MockNotificationRepository};
    use mockall::predicate::eq;

    fn challenge(goal: i32, status: ChallengeStatus) -> Challenge {
        Challenge {
            id: Uuid::new_v4(),
            title: "Ten katas".to_owned(),
            description: "Finish ten katas".to_owned(),
            goal_target: goal,
            reward_points: DEFAULT_REWARD_POINTS,
            status,
            team_id: None,
            created_at: Utc::now(),
        }
    }

    fn row(user_id: Uuid, challenge_id: Uuid, progress: i32, completed: bool) -> UserChallenge {
        UserChallenge {
            user_id,
            challenge_id,
            progress,
            completed,
            completed_at: completed.then(Utc::now),
        }
    }

    fn service(
        challenges: MockChallengeRepository,
        notifications: MockNotificationRepository,
    ) -> ChallengeService {
        ChallengeService::new(Arc::new(challenges), Arc::new(notifications))
    }

    #[tokio::test]
    async fn join_rejects_inactive_challenges() {
        let inactive = challenge(5, ChallengeStatus::Archived);
        let id = inactive.id;

        let mut challenges = MockChallengeRepository::new();
        challenges
            .expect_find_by_id()
            .with(eq(id))
            .return_once(move |_| Ok(Some(inactive)));
        challenges.expect_join().never();

        let svc = service(challenges, MockNotificationRepository::new());
        let err = svc
            .join(Uuid::new_v4(), id)
            .await
            .expect_err("inactive refused");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
    }

    #[tokio::test]
    async fn join_rejects_duplicate_enrolment() {
        let active = challenge(5, ChallengeStatus::Active);
        let id = active.id;
        let user = Uuid::new_v4();

        let mut challenges = MockChallengeRepository::new();
        challenges
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(active)));
        challenges
            .expect_find_user_challenge()
            .return_once(move |uid, cid| Ok(Some(row(uid, cid, 2, false))));
        challenges.expect_join().never();

        let svc = service(challenges, MockNotificationRepository::new());
        let err = svc.join(user, id).await.expect_err("duplicate refused");
        assert_eq!(err.code(), ErrorCode::Conflict);
    }

    #[tokio::test]
    async fn crossing_the_goal_awards_the_badge_once() {
        let active = challenge(5, ChallengeStatus::Active);
        let id = active.id;
        let user = Uuid::new_v4();

        let mut challenges = MockChallengeRepository::new();
        challenges
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(active)));
        challenges
            .expect_find_user_challenge()
            .return_once(move |uid, cid| Ok(Some(row(uid, cid, 4, false))));
        challenges
            .expect_upsert_progress()
            .withf(|update| update.progress == 5 && update.completed)
            .return_once(move |update| {
                Ok(row(update.user_id, update.challenge_id, update.progress, true))
            });
        challenges
            .expect_award_badge()
            .withf(|_, spec| spec.name == "Challenge Champion")
            .returning(|_, _| Ok(true));

        let mut notifications = MockNotificationRepository::new();
        notifications
            .expect_insert()
            .withf(|note| note.kind == NotificationKind::ChallengeCompleted)
            .returning(|_| Ok(()));

        let svc = service(challenges, notifications);
        let result = svc
            .update_progress(user, id, 5)
            .await
            .expect("update succeeds");
        assert!(result.badge_awarded);
        assert!(result.user_challenge.completed);
    }

    #[tokio::test]
    async fn repeat_updates_after_completion_do_not_re_award() {
        let active = challenge(5, ChallengeStatus::Active);
        let id = active.id;
        let user = Uuid::new_v4();

        let mut challenges = MockChallengeRepository::new();
        challenges
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(active)));
        challenges
            .expect_find_user_challenge()
            .return_once(move |uid, cid| Ok(Some(row(uid, cid, 5, true))));
        challenges
            .expect_upsert_progress()
            .return_once(move |update| {
                Ok(row(update.user_id, update.challenge_id, update.progress, true))
            });
        challenges.expect_award_badge().never();

        let mut notifications = MockNotificationRepository::new();
        notifications.expect_insert().never();

        let svc = service(challenges, notifications);
        let result = svc
            .update_progress(user, id, 6)
            .await
            .expect("update succeeds");
        assert!(!result.badge_awarded);
    }
}
