//! Challenge, progress, and badge entities.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::session::{UnknownVariant, string_enum};

/// Default goal when a challenge is created without one.
pub const DEFAULT_GOAL_TARGET: i32 = 1;

/// Default reward when a challenge is created without one.
pub const DEFAULT_REWARD_POINTS: i32 = 100;

/// Badge awarded for the first completed session.
pub const QUICK_STARTER_BADGE: BadgeSpec = BadgeSpec {
    name: "Quick Starter",
    description: "Completed your first learning session",
    image_url: "/badges/quick-starter.png",
};

/// Badge awarded for joining a first team.
pub const TEAM_PLAYER_BADGE: BadgeSpec = BadgeSpec {
    name: "Team Player",
    description: "Joined your first team",
    image_url: "/badges/team-player.png",
};

/// Badge awarded for completing a challenge.
pub const CHALLENGE_CHAMPION_BADGE: BadgeSpec = BadgeSpec {
    name: "Challenge Champion",
    description: "Awarded for completing a learning challenge",
    image_url: "/badges/challenge-champion.png",
};

string_enum! {
    /// Lifecycle of a challenge.
    pub enum ChallengeStatus {
        /// Open for joining and progress updates.
        Active => "ACTIVE",
        /// Goal reached; counts towards team achievements.
        Completed => "COMPLETED",
        /// Withdrawn from listings.
        Archived => "ARCHIVED",
    }
}

/// Static description of a badge upserted at award time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeSpec {
    /// Unique badge name.
    pub name: &'static str,
    /// Shown under the badge.
    pub description: &'static str,
    /// Asset path served by the frontend.
    pub image_url: &'static str,
}

/// A gamified challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct Challenge {
    /// Primary key.
    pub id: Uuid,
    /// Headline.
    pub title: String,
    /// What must be achieved.
    pub description: String,
    /// Progress value that counts as completion.
    pub goal_target: i32,
    /// Points granted on completion.
    pub reward_points: i32,
    /// Lifecycle status.
    pub status: ChallengeStatus,
    /// Owning team, when the challenge was raised for one.
    pub team_id: Option<Uuid>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}

/// A user's progress within a challenge.
#[derive(Debug, Clone, PartialEq)]
pub struct UserChallenge {
    /// Participating user.
    pub user_id: Uuid,
    /// Challenge being attempted.
    pub challenge_id: Uuid,
    /// Current progress value.
    pub progress: i32,
    /// Whether the goal has been reached.
    pub completed: bool,
    /// When the goal was reached.
    pub completed_at: Option<DateTime<Utc>>,
}

/// An earned or earnable badge.
#[derive(Debug, Clone, PartialEq)]
pub struct Badge {
    /// Primary key.
    pub id: Uuid,
    /// Unique badge name.
    pub name: String,
    /// Shown under the badge.
    pub description: String,
    /// Asset path served by the frontend.
    pub image_url: String,
}

/// A badge held by a user.
#[derive(Debug, Clone, PartialEq)]
pub struct UserBadge {
    /// Badge owner.
    pub user_id: Uuid,
    /// The badge itself.
    pub badge_id: Uuid,
    /// Award time.
    pub earned_at: DateTime<Utc>,
}

impl Challenge {
    /// Whether the challenge accepts joins and progress updates.
    pub fn is_active(&self) -> bool {
        self.status == ChallengeStatus::Active
    }

    /// Whether `progress` reaches this challenge's goal.
    pub fn reaches_goal(&self, progress: i32) -> bool {
        progress >= self.goal_target
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn challenge(goal_target: i32, status: ChallengeStatus) -> Challenge {
        Challenge {
            id: Uuid::new_v4(),
            title: "Five sessions".to_owned(),
            description: "Complete five sessions".to_owned(),
            goal_target,
            reward_points: DEFAULT_REWARD_POINTS,
            status,
            team_id: None,
            created_at: Utc::now(),
        }
    }

    #[rstest]
    #[case(4, false)]
    #[case(5, true)]
    #[case(6, true)]
    fn goal_is_inclusive(#[case] progress: i32, #[case] expected: bool) {
        assert_eq!(
            challenge(5, ChallengeStatus::Active).reaches_goal(progress),
            expected
        );
    }

    #[rstest]
    #[case(ChallengeStatus::Active, true)]
    #[case(ChallengeStatus::Completed, false)]
    #[case(ChallengeStatus::Archived, false)]
    fn only_active_challenges_accept_participants(
        #[case] status: ChallengeStatus,
        #[case] expected: bool,
    ) {
        assert_eq!(challenge(1, status).is_active(), expected);
    }
}
