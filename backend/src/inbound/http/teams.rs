//! Team API handlers.
//!
//! ```text
//! GET  /api/v1/teams
//! POST /api/v1/teams
//! POST /api/v1/teams/{teamId}/join
//! POST /api/v1/teams/{teamId}/payments
//! POST /api/v1/teams/{teamId}/leave
//! GET  /api/v1/teams/{teamId}/messages
//! POST /api/v1/teams/{teamId}/messages
//! ```

use actix_web::{HttpResponse, get, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::phone::PhoneNumber;
use crate::domain::ports::{TeamMessageWithSender, TeamOverview};
use crate::domain::team::Team;
use crate::domain::{Error, TeamDeparture, TeamDraft};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Request body for creating a team.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequestBody {
    /// Team name.
    pub name: String,
    /// What the team is about.
    pub description: String,
    /// Membership cap (2–10).
    pub max_members: i32,
    /// Optional joining fee in whole KES.
    pub entry_fee_kes: Option<i64>,
}

/// Request body for initiating a paid join.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamPaymentRequestBody {
    /// Subscriber number for the STK push.
    pub phone_number: String,
}

/// Request body for posting a chat message.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostMessageRequestBody {
    /// Message body.
    pub content: String,
}

/// A team as returned by the API.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamResponseBody {
    /// Team id.
    pub id: String,
    /// Team name.
    pub name: String,
    /// Description.
    pub description: String,
    /// Lifecycle status.
    pub status: String,
    /// Membership cap.
    pub max_members: i32,
    /// Joining fee in whole KES, when charged.
    pub entry_fee_kes: Option<i64>,
}

/// A team with members and challenge counters.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamOverviewBody {
    #[serde(flatten)]
    #[schema(inline)]
    team: TeamResponseBody,
    /// Current members.
    members: Vec<TeamMemberBody>,
    /// Team challenges still active.
    active_challenges: i64,
    /// Team challenges completed.
    completed_challenges: i64,
}

/// A member inside a team listing.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMemberBody {
    /// Member user id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Contact email.
    pub email: String,
    /// Leader or regular member.
    pub role: String,
}

/// A chat message with its sender.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamMessageBody {
    /// Message id.
    pub id: String,
    /// Message body.
    pub content: String,
    /// Send time.
    pub sent_at: String,
    /// Sender display name.
    pub sender_name: String,
    /// Sender email.
    pub sender_email: String,
}

/// Response body for an initiated team payment.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TeamPaymentResponseBody {
    /// Payment record id.
    pub id: String,
    /// Amount in whole KES.
    pub amount_kes: i64,
    /// Payment lifecycle status.
    pub status: String,
    /// Checkout request id for reconciliation.
    pub checkout_request_id: String,
}

fn team_body(team: &Team) -> TeamResponseBody {
    TeamResponseBody {
        id: team.id.to_string(),
        name: team.name.clone(),
        description: team.description.clone(),
        status: team.status.to_string(),
        max_members: team.max_members,
        entry_fee_kes: team.entry_fee_kes,
    }
}

fn overview_body(overview: TeamOverview) -> TeamOverviewBody {
    TeamOverviewBody {
        team: team_body(&overview.team),
        members: overview
            .members
            .into_iter()
            .map(|member| TeamMemberBody {
                id: member.user_id.to_string(),
                name: member.name,
                email: member.email,
                role: member.role.to_string(),
            })
            .collect(),
        active_challenges: overview.active_challenges,
        completed_challenges: overview.completed_challenges,
    }
}

fn message_body(message: TeamMessageWithSender) -> TeamMessageBody {
    TeamMessageBody {
        id: message.message.id.to_string(),
        content: message.message.content,
        sent_at: message.message.sent_at.to_rfc3339(),
        sender_name: message.sender_name,
        sender_email: message.sender_email,
    }
}

fn parse_phone(raw: &str) -> Result<PhoneNumber, Error> {
    PhoneNumber::new(raw).map_err(|err| {
        Error::invalid_request(err.to_string()).with_details(json!({
            "field": "phoneNumber",
            "value": raw,
        }))
    })
}

/// List all teams with members and challenge counters.
#[utoipa::path(
    get,
    path = "/api/v1/teams",
    responses(
        (status = 200, description = "Teams", body = [TeamOverviewBody]),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["teams"],
    operation_id = "listTeams",
    security(("SessionCookie" = []))
)]
#[get("/teams")]
pub async fn list_teams(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<TeamOverviewBody>>> {
    session.require_user_id()?;
    let overviews = state.teams.list().await?;
    Ok(web::Json(overviews.into_iter().map(overview_body).collect()))
}

/// Create a team led by the caller.
#[utoipa::path(
    post,
    path = "/api/v1/teams",
    request_body = CreateTeamRequestBody,
    responses(
        (status = 200, description = "Team created", body = TeamResponseBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["teams"],
    operation_id = "createTeam",
    security(("SessionCookie" = []))
)]
#[post("/teams")]
pub async fn create_team(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateTeamRequestBody>,
) -> ApiResult<web::Json<TeamResponseBody>> {
    let user_id = session.require_user_id()?;
    let body = payload.into_inner();

    let team = state
        .teams
        .create(
            user_id,
            TeamDraft {
                name: body.name,
                description: body.description,
                max_members: body.max_members,
                entry_fee_kes: body.entry_fee_kes,
            },
        )
        .await?;
    Ok(web::Json(team_body(&team)))
}

/// Join a free team.
#[utoipa::path(
    post,
    path = "/api/v1/teams/{teamId}/join",
    params(("teamId" = String, Path, description = "Team id")),
    responses(
        (status = 200, description = "Joined"),
        (status = 400, description = "Not joinable", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Already a member", body = Error)
    ),
    tags = ["teams"],
    operation_id = "joinTeam",
    security(("SessionCookie" = []))
)]
#[post("/teams/{teamId}/join")]
pub async fn join_team(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let team_id = parse_uuid(&path.into_inner(), FieldName::new("teamId"))?;

    state.teams.join(user_id, team_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully joined team" })))
}

/// Initiate an STK push for a fee-charging team.
#[utoipa::path(
    post,
    path = "/api/v1/teams/{teamId}/payments",
    params(("teamId" = String, Path, description = "Team id")),
    request_body = TeamPaymentRequestBody,
    responses(
        (status = 200, description = "Push initiated", body = TeamPaymentResponseBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 503, description = "Payment provider unavailable", body = Error)
    ),
    tags = ["teams"],
    operation_id = "initiateTeamPayment",
    security(("SessionCookie" = []))
)]
#[post("/teams/{teamId}/payments")]
pub async fn initiate_team_payment(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<TeamPaymentRequestBody>,
) -> ApiResult<web::Json<TeamPaymentResponseBody>> {
    let user_id = session.require_user_id()?;
    let team_id = parse_uuid(&path.into_inner(), FieldName::new("teamId"))?;
    let phone = parse_phone(&payload.phone_number)?;

    let payment = state
        .teams
        .initiate_join_payment(user_id, team_id, phone)
        .await?;
    Ok(web::Json(TeamPaymentResponseBody {
        id: payment.id.to_string(),
        amount_kes: payment.amount_kes,
        status: payment.status.to_string(),
        checkout_request_id: payment.checkout_request_id,
    }))
}

/// Leave a team.
#[utoipa::path(
    post,
    path = "/api/v1/teams/{teamId}/leave",
    params(("teamId" = String, Path, description = "Team id")),
    responses(
        (status = 200, description = "Left or team deleted"),
        (status = 400, description = "Not a member / leader blocked", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["teams"],
    operation_id = "leaveTeam",
    security(("SessionCookie" = []))
)]
#[post("/teams/{teamId}/leave")]
pub async fn leave_team(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let team_id = parse_uuid(&path.into_inner(), FieldName::new("teamId"))?;

    let departure = state.teams.leave(user_id, team_id).await?;
    let message = match departure {
        TeamDeparture::Left => "Successfully left the team",
        TeamDeparture::TeamDeleted => "Team has been deleted as you were the last member",
    };
    Ok(HttpResponse::Ok().json(json!({ "message": message })))
}

/// List a team's chat, newest first.
#[utoipa::path(
    get,
    path = "/api/v1/teams/{teamId}/messages",
    params(("teamId" = String, Path, description = "Team id")),
    responses(
        (status = 200, description = "Messages", body = [TeamMessageBody]),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["teams"],
    operation_id = "listTeamMessages",
    security(("SessionCookie" = []))
)]
#[get("/teams/{teamId}/messages")]
pub async fn list_team_messages(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<TeamMessageBody>>> {
    session.require_user_id()?;
    let team_id = parse_uuid(&path.into_inner(), FieldName::new("teamId"))?;

    let messages = state.teams.messages(team_id).await?;
    Ok(web::Json(messages.into_iter().map(message_body).collect()))
}

/// Post a chat message (members only).
#[utoipa::path(
    post,
    path = "/api/v1/teams/{teamId}/messages",
    params(("teamId" = String, Path, description = "Team id")),
    request_body = PostMessageRequestBody,
    responses(
        (status = 200, description = "Posted", body = TeamMessageBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 403, description = "Not a member", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["teams"],
    operation_id = "postTeamMessage",
    security(("SessionCookie" = []))
)]
#[post("/teams/{teamId}/messages")]
pub async fn post_team_message(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<PostMessageRequestBody>,
) -> ApiResult<web::Json<TeamMessageBody>> {
    let user_id = session.require_user_id()?;
    let team_id = parse_uuid(&path.into_inner(), FieldName::new("teamId"))?;

    let message = state
        .teams
        .post_message(user_id, team_id, payload.into_inner().content)
        .await?;
    Ok(web::Json(message_body(message)))
}

#[cfg(test)]
#[path = "teams_tests.rs"]
mod tests;
