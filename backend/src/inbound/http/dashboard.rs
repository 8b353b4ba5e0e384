//! Dashboard API handler.
//!
//! ```text
//! GET /api/v1/dashboard
//! ```

use actix_web::{get, web};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{DashboardView, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Aggregate dashboard payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponseBody {
    /// Sessions the caller created or joined.
    pub total_sessions: i64,
    /// Of those, sessions that completed.
    pub completed_sessions: i64,
    /// Running sessions the caller actively joined.
    pub active_sessions: i64,
    /// Challenges the caller has completed.
    pub earned_badges: i64,
    /// Completed share of the caller's sessions, whole percentage.
    pub progress: i64,
    /// Next scheduled sessions, soonest first.
    pub upcoming_sessions: Vec<UpcomingSessionBody>,
    /// Challenge completions in the last thirty days.
    pub recent_achievements: Vec<AchievementBody>,
}

/// An upcoming session entry.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingSessionBody {
    /// Session id.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Scheduled start.
    pub start_time: String,
}

/// A recent challenge completion.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AchievementBody {
    /// Challenge id.
    pub id: String,
    /// Challenge headline.
    pub title: String,
    /// Completion time.
    pub date: String,
}

impl From<DashboardView> for DashboardResponseBody {
    fn from(view: DashboardView) -> Self {
        Self {
            total_sessions: view.total_sessions,
            completed_sessions: view.completed_sessions,
            active_sessions: view.active_sessions,
            earned_badges: view.completed_challenges,
            progress: view.progress_percent,
            upcoming_sessions: view
                .upcoming_sessions
                .into_iter()
                .map(|session| UpcomingSessionBody {
                    id: session.id.to_string(),
                    title: session.title,
                    start_time: session.start_time.to_rfc3339(),
                })
                .collect(),
            recent_achievements: view
                .recent_achievements
                .into_iter()
                .map(|completion| AchievementBody {
                    id: completion.challenge_id.to_string(),
                    title: completion.title,
                    date: completion.completed_at.to_rfc3339(),
                })
                .collect(),
        }
    }
}

/// Fetch the caller's dashboard.
#[utoipa::path(
    get,
    path = "/api/v1/dashboard",
    responses(
        (status = 200, description = "Dashboard", body = DashboardResponseBody),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["dashboard"],
    operation_id = "getDashboard",
    security(("SessionCookie" = []))
)]
#[get("/dashboard")]
pub async fn get_dashboard(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<DashboardResponseBody>> {
    let user_id = session.require_user_id()?;
    let view = state.dashboard.overview(user_id).await?;
    Ok(web::Json(DashboardResponseBody::from(view)))
}
