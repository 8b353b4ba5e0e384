//! Learning-session API handlers.
//!
//! ```text
//! GET  /api/v1/sessions
//! POST /api/v1/sessions
//! POST /api/v1/sessions/{sessionId}/join
//! POST /api/v1/sessions/{sessionId}/start
//! POST /api/v1/sessions/{sessionId}/complete
//! ```

use actix_web::{HttpResponse, get, post, web};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::ports::SessionListing;
use crate::domain::session::{Difficulty, LearningSession};
use crate::domain::{Error, SessionDraft};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Request body for creating a session.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequestBody {
    /// Headline.
    pub title: String,
    /// Session content description.
    pub description: String,
    /// Scheduled start (RFC 3339).
    #[schema(format = "date-time")]
    pub start_time: DateTime<Utc>,
    /// Planned length in minutes.
    pub duration: i32,
    /// Capacity limit; defaults to 10.
    pub max_participants: Option<i32>,
    /// Advertised difficulty; defaults to intermediate.
    pub difficulty: Option<Difficulty>,
}

/// A session as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponseBody {
    /// Session id.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Session content description.
    pub description: String,
    /// Scheduled start.
    pub start_time: String,
    /// Derived end.
    pub end_time: String,
    /// Planned length in minutes.
    pub duration: i32,
    /// Lifecycle status.
    pub status: String,
    /// Advertised difficulty.
    pub difficulty: String,
    /// Capacity limit.
    pub max_participants: i32,
    /// Video-meeting link, once one exists.
    pub meet_link: Option<String>,
}

/// A session annotated for the caller.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionListingBody {
    #[serde(flatten)]
    #[schema(inline)]
    session: SessionResponseBody,
    /// Active participant count.
    current_participants: i64,
    /// Whether the caller created this session.
    is_creator: bool,
    /// Whether the caller holds an active participation.
    has_joined: bool,
}

/// Response body for starting a session.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponseBody {
    /// Always true on success.
    pub success: bool,
    /// Meeting link participants should use, when one exists.
    pub meet_link: Option<String>,
}

fn session_body(session: &LearningSession) -> SessionResponseBody {
    SessionResponseBody {
        id: session.id.to_string(),
        title: session.title.clone(),
        description: session.description.clone(),
        start_time: session.start_time.to_rfc3339(),
        end_time: session.end_time.to_rfc3339(),
        duration: session.duration_minutes,
        status: session.status.to_string(),
        difficulty: session.difficulty.to_string(),
        max_participants: session.max_participants,
        meet_link: session.meet_link.clone(),
    }
}

fn listing_body(listing: &SessionListing, caller: uuid::Uuid) -> SessionListingBody {
    SessionListingBody {
        session: session_body(&listing.session),
        current_participants: listing.active_participants,
        is_creator: listing.session.created_by == caller,
        has_joined: listing.joined,
    }
}

/// List all sessions annotated for the caller.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    responses(
        (status = 200, description = "Sessions", body = [SessionListingBody]),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "listSessions",
    security(("SessionCookie" = []))
)]
#[get("/sessions")]
pub async fn list_sessions(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<SessionListingBody>>> {
    let user_id = session.require_user_id()?;
    let listings = state.sessions.list(user_id).await?;
    Ok(web::Json(
        listings
            .iter()
            .map(|listing| listing_body(listing, user_id))
            .collect(),
    ))
}

/// Create a session hosted by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    request_body = CreateSessionRequestBody,
    responses(
        (status = 200, description = "Session created", body = SessionResponseBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "createSession",
    security(("SessionCookie" = []))
)]
#[post("/sessions")]
pub async fn create_session(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateSessionRequestBody>,
) -> ApiResult<web::Json<SessionResponseBody>> {
    let user_id = session.require_user_id()?;
    let body = payload.into_inner();

    let created = state
        .sessions
        .create(
            user_id,
            SessionDraft {
                title: body.title,
                description: body.description,
                start_time: body.start_time,
                duration_minutes: body.duration,
                max_participants: body.max_participants,
                difficulty: body.difficulty,
            },
        )
        .await?;
    Ok(web::Json(session_body(&created)))
}

/// Join a scheduled session.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/join",
    params(("sessionId" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Joined"),
        (status = 400, description = "Not joinable", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Already joined", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "joinSession",
    security(("SessionCookie" = []))
)]
#[post("/sessions/{sessionId}/join")]
pub async fn join_session(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let session_id = parse_uuid(&path.into_inner(), FieldName::new("sessionId"))?;

    state.sessions.join(user_id, session_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully joined session" })))
}

/// Start a scheduled session (creator only).
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/start",
    params(("sessionId" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Started", body = StartSessionResponseBody),
        (status = 400, description = "Not startable", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Not the creator", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "startSession",
    security(("SessionCookie" = []))
)]
#[post("/sessions/{sessionId}/start")]
pub async fn start_session(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<StartSessionResponseBody>> {
    let user_id = session.require_user_id()?;
    let session_id = parse_uuid(&path.into_inner(), FieldName::new("sessionId"))?;

    let started = state.sessions.start(user_id, session_id).await?;
    Ok(web::Json(StartSessionResponseBody {
        success: true,
        meet_link: started.meet_link,
    }))
}

/// Complete a session for the caller.
#[utoipa::path(
    post,
    path = "/api/v1/sessions/{sessionId}/complete",
    params(("sessionId" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Completed"),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Not a participant", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["sessions"],
    operation_id = "completeSession",
    security(("SessionCookie" = []))
)]
#[post("/sessions/{sessionId}/complete")]
pub async fn complete_session(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let session_id = parse_uuid(&path.into_inner(), FieldName::new("sessionId"))?;

    let result = state.sessions.complete(user_id, session_id).await?;
    Ok(HttpResponse::Ok().json(json!({
        "message": "Session marked as completed",
        "badgeAwarded": result.badge_awarded,
    })))
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
