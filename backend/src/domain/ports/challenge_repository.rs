//! Port for challenge, progress, and badge persistence.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::challenge::{Badge, BadgeSpec, Challenge, UserChallenge};

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by challenge repository adapters.
    pub enum ChallengeRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "challenge repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "challenge repository query failed: {message}",
    }
}

/// Payload for inserting a new challenge.
#[derive(Debug, Clone)]
pub struct NewChallengeRecord {
    /// Pre-generated primary key.
    pub id: Uuid,
    /// Headline.
    pub title: String,
    /// What must be achieved.
    pub description: String,
    /// Progress value that counts as completion.
    pub goal_target: i32,
    /// Points granted on completion.
    pub reward_points: i32,
    /// Owning team, when raised for one.
    pub team_id: Option<Uuid>,
}

/// A challenge merged with the caller's progress.
#[derive(Debug, Clone, PartialEq)]
pub struct ChallengeWithProgress {
    /// The challenge itself.
    pub challenge: Challenge,
    /// The caller's progress row, if they joined.
    pub progress: Option<UserChallenge>,
}

/// Upsert payload for a progress update.
#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    /// Participating user.
    pub user_id: Uuid,
    /// Challenge being attempted.
    pub challenge_id: Uuid,
    /// New progress value.
    pub progress: i32,
    /// Whether the goal is now reached.
    pub completed: bool,
    /// Completion time when the goal is reached.
    pub completed_at: Option<DateTime<Utc>>,
}

/// A badge paired with its award time.
#[derive(Debug, Clone, PartialEq)]
pub struct EarnedBadge {
    /// The badge itself.
    pub badge: Badge,
    /// When the user earned it.
    pub earned_at: DateTime<Utc>,
}

/// A completed challenge as shown on the dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedChallenge {
    /// Challenge id.
    pub challenge_id: Uuid,
    /// Challenge headline.
    pub title: String,
    /// When the user completed it.
    pub completed_at: DateTime<Utc>,
}

/// Port for challenge reads and writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChallengeRepository: Send + Sync {
    /// Insert a challenge.
    async fn create(
        &self,
        record: &NewChallengeRecord,
    ) -> Result<Challenge, ChallengeRepositoryError>;

    /// Active challenges ordered by reward, merged with `for_user` progress.
    async fn list_active_with_progress(
        &self,
        for_user: Uuid,
    ) -> Result<Vec<ChallengeWithProgress>, ChallengeRepositoryError>;

    /// Find a challenge by id.
    async fn find_by_id(
        &self,
        id: Uuid,
    ) -> Result<Option<Challenge>, ChallengeRepositoryError>;

    /// Find a user's progress row for a challenge.
    async fn find_user_challenge(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> Result<Option<UserChallenge>, ChallengeRepositoryError>;

    /// Enrol a user with zero progress.
    async fn join(
        &self,
        user_id: Uuid,
        challenge_id: Uuid,
    ) -> Result<(), ChallengeRepositoryError>;

    /// Insert or update a progress row.
    async fn upsert_progress(
        &self,
        update: &ProgressUpdate,
    ) -> Result<UserChallenge, ChallengeRepositoryError>;

    /// Upsert the badge by name and award it unless already held.
    ///
    /// Returns `true` when the badge was newly awarded.
    async fn award_badge(
        &self,
        user_id: Uuid,
        spec: &BadgeSpec,
    ) -> Result<bool, ChallengeRepositoryError>;

    /// The user's most recent badges.
    async fn recent_badges(
        &self,
        user_id: Uuid,
        limit: i64,
    ) -> Result<Vec<EarnedBadge>, ChallengeRepositoryError>;

    /// How many challenges the user has completed.
    async fn completed_count_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<i64, ChallengeRepositoryError>;

    /// The user's completions since `since`, newest first.
    async fn recent_completions(
        &self,
        user_id: Uuid,
        since: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<CompletedChallenge>, ChallengeRepositoryError>;
}
