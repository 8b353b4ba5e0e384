//! Dashboard aggregation.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use super::error::Error;
use super::ports::{
    ChallengeRepository, ChallengeRepositoryError, CompletedChallenge, SessionRepository,
    SessionRepositoryError,
};
use super::session::LearningSession;

/// How many upcoming sessions and recent achievements the dashboard lists.
const DASHBOARD_LIMIT: i64 = 5;

/// How far back recent achievements reach.
const ACHIEVEMENT_WINDOW_DAYS: i64 = 30;

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

/// Aggregate dashboard payload.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardView {
    /// Sessions the user created or joined.
    pub total_sessions: i64,
    /// Of those, sessions that completed.
    pub completed_sessions: i64,
    /// Running sessions the user actively joined.
    pub active_sessions: i64,
    /// Challenges the user has completed.
    pub completed_challenges: i64,
    /// Completed share of the user's sessions, as a whole percentage.
    pub progress_percent: i64,
    /// Next scheduled sessions, soonest first.
    pub upcoming_sessions: Vec<LearningSession>,
    /// Challenge completions in the last thirty days.
    pub recent_achievements: Vec<CompletedChallenge>,
}

/// Dashboard service over the session and challenge ports.
#[derive(Clone)]
pub struct DashboardService {
    sessions: Arc<dyn SessionRepository>,
    challenges: Arc<dyn ChallengeRepository>,
}

impl DashboardService {
    /// Create the service from its ports.
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        challenges: Arc<dyn ChallengeRepository>,
    ) -> Self {
        Self {
            sessions,
            challenges,
        }
    }

    /// Assemble the dashboard for a user.
    pub async fn overview(&self, user_id: Uuid) -> Result<DashboardView, Error> {
        let stats = self
            .sessions
            .dashboard_stats(user_id)
            .await
            .map_err(map_session_error)?;

        let upcoming_sessions = self
            .sessions
            .upcoming_for_user(user_id, DASHBOARD_LIMIT)
            .await
            .map_err(map_session_error)?;

        let completed_challenges = self
            .challenges
            .completed_count_for_user(user_id)
            .await
            .map_err(map_challenge_error)?;

        let since = Utc::now() - Duration::days(ACHIEVEMENT_WINDOW_DAYS);
        let recent_achievements = self
            .challenges
            .recent_completions(user_id, since, DASHBOARD_LIMIT)
            .await
            .map_err(map_challenge_error)?;

        let progress_percent = if stats.total_sessions > 0 {
            stats.completed_sessions * 100 / stats.total_sessions
        } else {
            0
        };

        Ok(DashboardView {
            total_sessions: stats.total_sessions,
            completed_sessions: stats.completed_sessions,
            active_sessions: stats.active_joined,
            completed_challenges,
            progress_percent,
            upcoming_sessions,
            recent_achievements,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{
        MockChallengeRepository, MockSessionRepository, SessionDashboard,
    };
    use rstest::rstest;

    fn mocked(total: i64, completed: i64) -> DashboardService {
        let mut sessions = MockSessionRepository::new();
        sessions.expect_dashboard_stats().returning(move |_| {
            Ok(SessionDashboard {
                total_sessions: total,
                completed_sessions: completed,
                active_joined: 1,
            })
        });
        sessions
            .expect_upcoming_for_user()
            .returning(|_, _| Ok(vec![]));

        let mut challenges = MockChallengeRepository::new();
        challenges
            .expect_completed_count_for_user()
            .returning(|_| Ok(3));
        challenges
            .expect_recent_completions()
            .returning(|_, _, _| Ok(vec![]));

        DashboardService::new(Arc::new(sessions), Arc::new(challenges))
    }

    #[rstest]
    #[case(0, 0, 0)]
    #[case(4, 1, 25)]
    #[case(3, 3, 100)]
    #[tokio::test]
    async fn progress_is_a_whole_percentage(
        #[case] total: i64,
        #[case] completed: i64,
        #[case] expected: i64,
    ) {
        let view = mocked(total, completed)
            .overview(Uuid::new_v4())
            .await
            .expect("overview loads");
        assert_eq!(view.progress_percent, expected);
        assert_eq!(view.completed_challenges, 3);
    }
}
