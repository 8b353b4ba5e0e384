//! Challenge API handlers.
//!
//! ```text
//! GET  /api/v1/challenges
//! POST /api/v1/challenges
//! POST /api/v1/challenges/{challengeId}/join
//! PUT  /api/v1/challenges/{challengeId}/progress
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::challenge::Challenge;
use crate::domain::ports::ChallengeWithProgress;
use crate::domain::{ChallengeDraft, Error};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_uuid};

/// Request body for creating a challenge.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChallengeRequestBody {
    /// Headline.
    pub title: String,
    /// What must be achieved.
    pub description: String,
    /// Goal; defaults to 1.
    pub goal_target: Option<i32>,
    /// Reward; defaults to 100.
    pub reward_points: Option<i32>,
    /// Owning team id, when raised for one.
    pub team_id: Option<String>,
}

/// Request body for a progress update.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequestBody {
    /// New progress value.
    pub progress: i32,
}

/// A challenge merged with the caller's progress.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeResponseBody {
    /// Challenge id.
    pub id: String,
    /// Headline.
    pub title: String,
    /// Description.
    pub description: String,
    /// Goal value.
    pub goal_target: i32,
    /// Reward points.
    pub reward_points: i32,
    /// Whether the challenge accepts participants.
    pub is_active: bool,
    /// The caller's progress (zero when not joined).
    pub progress: i32,
    /// Whether the caller completed it.
    pub completed: bool,
    /// Completion time, when completed.
    pub completed_at: Option<String>,
}

fn challenge_body(entry: ChallengeWithProgress) -> ChallengeResponseBody {
    let ChallengeWithProgress {
        challenge,
        progress,
    } = entry;
    ChallengeResponseBody {
        id: challenge.id.to_string(),
        title: challenge.title,
        description: challenge.description,
        goal_target: challenge.goal_target,
        reward_points: challenge.reward_points,
        is_active: challenge.status == crate::domain::challenge::ChallengeStatus::Active,
        progress: progress.as_ref().map_or(0, |row| row.progress),
        completed: progress.as_ref().is_some_and(|row| row.completed),
        completed_at: progress
            .and_then(|row| row.completed_at)
            .map(|at| at.to_rfc3339()),
    }
}

fn created_body(challenge: Challenge) -> ChallengeResponseBody {
    ChallengeResponseBody {
        id: challenge.id.to_string(),
        title: challenge.title,
        description: challenge.description,
        goal_target: challenge.goal_target,
        reward_points: challenge.reward_points,
        is_active: challenge.status == crate::domain::challenge::ChallengeStatus::Active,
        progress: 0,
        completed: false,
        completed_at: None,
    }
}

/// List active challenges with the caller's progress.
#[utoipa::path(
    get,
    path = "/api/v1/challenges",
    responses(
        (status = 200, description = "Challenges", body = [ChallengeResponseBody]),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["challenges"],
    operation_id = "listChallenges",
    security(("SessionCookie" = []))
)]
#[get("/challenges")]
pub async fn list_challenges(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<Vec<ChallengeResponseBody>>> {
    let user_id = session.require_user_id()?;
    let entries = state.challenges.list(user_id).await?;
    Ok(web::Json(entries.into_iter().map(challenge_body).collect()))
}

/// Create a challenge.
#[utoipa::path(
    post,
    path = "/api/v1/challenges",
    request_body = CreateChallengeRequestBody,
    responses(
        (status = 200, description = "Challenge created", body = ChallengeResponseBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["challenges"],
    operation_id = "createChallenge",
    security(("SessionCookie" = []))
)]
#[post("/challenges")]
pub async fn create_challenge(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<CreateChallengeRequestBody>,
) -> ApiResult<web::Json<ChallengeResponseBody>> {
    session.require_user_id()?;
    let body = payload.into_inner();
    let team_id = body
        .team_id
        .as_deref()
        .map(|raw| parse_uuid(raw, FieldName::new("teamId")))
        .transpose()?;

    let challenge = state
        .challenges
        .create(ChallengeDraft {
            title: body.title,
            description: body.description,
            goal_target: body.goal_target,
            reward_points: body.reward_points,
            team_id,
        })
        .await?;
    Ok(web::Json(created_body(challenge)))
}

/// Join an active challenge.
#[utoipa::path(
    post,
    path = "/api/v1/challenges/{challengeId}/join",
    params(("challengeId" = String, Path, description = "Challenge id")),
    responses(
        (status = 200, description = "Joined"),
        (status = 400, description = "Not joinable", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error),
        (status = 409, description = "Already joined", body = Error)
    ),
    tags = ["challenges"],
    operation_id = "joinChallenge",
    security(("SessionCookie" = []))
)]
#[post("/challenges/{challengeId}/join")]
pub async fn join_challenge(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let challenge_id = parse_uuid(&path.into_inner(), FieldName::new("challengeId"))?;

    state.challenges.join(user_id, challenge_id).await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Successfully joined challenge" })))
}

/// Record the caller's progress on a challenge.
#[utoipa::path(
    put,
    path = "/api/v1/challenges/{challengeId}/progress",
    params(("challengeId" = String, Path, description = "Challenge id")),
    request_body = ProgressRequestBody,
    responses(
        (status = 200, description = "Progress recorded"),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["challenges"],
    operation_id = "updateChallengeProgress",
    security(("SessionCookie" = []))
)]
#[put("/challenges/{challengeId}/progress")]
pub async fn update_progress(
    state: web::Data<HttpState>,
    session: SessionContext,
    path: web::Path<String>,
    payload: web::Json<ProgressRequestBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let challenge_id = parse_uuid(&path.into_inner(), FieldName::new("challengeId"))?;

    let result = state
        .challenges
        .update_progress(user_id, challenge_id, payload.progress)
        .await?;
    Ok(HttpResponse::Ok().json(json!({
        "progress": result.user_challenge.progress,
        "completed": result.user_challenge.completed,
        "completedAt": result.user_challenge.completed_at.map(|at| at.to_rfc3339()),
        "badgeAwarded": result.badge_awarded,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::challenge::{ChallengeStatus, UserChallenge};
    use crate::inbound::http::test_utils::{TestPorts, test_session_middleware};
    use actix_web::http::StatusCode;
    use actix_web::{App, test as actix_test};
    use chrono::Utc;
    use serde_json::Value;
    use uuid::Uuid;

    fn test_app(
        state: HttpState,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        App::new().app_data(web::Data::new(state)).service(
            web::scope("/api/v1")
                .wrap(test_session_middleware())
                .service(list_challenges)
                .service(create_challenge)
                .service(join_challenge)
                .service(update_progress)
                .route(
                    "/test-login/{userId}",
                    web::post().to(
                        |session: crate::inbound::http::session::SessionContext,
                         path: web::Path<String>| async move {
                            let id = Uuid::parse_str(&path.into_inner()).expect("valid uuid");
                            session.persist_user(id)?;
                            Ok::<_, Error>(actix_web::HttpResponse::Ok())
                        },
                    ),
                ),
        )
    }

    async fn login_cookie<S>(app: &S, user_id: Uuid) -> actix_web::cookie::Cookie<'static>
    where
        S: actix_web::dev::Service<
                actix_http::Request,
                Response = actix_web::dev::ServiceResponse,
                Error = actix_web::Error,
            >,
    {
        let res = actix_test::call_service(
            app,
            actix_test::TestRequest::post()
                .uri(&format!("/api/v1/test-login/{user_id}"))
                .to_request(),
        )
        .await;
        res.response()
            .cookies()
            .find(|cookie| cookie.name() == "session")
            .expect("session cookie")
            .into_owned()
    }

    fn active_challenge(goal: i32) -> Challenge {
        Challenge {
            id: Uuid::new_v4(),
            title: "Ten katas".to_owned(),
            description: "Finish ten katas".to_owned(),
            goal_target: goal,
            reward_points: 100,
            status: ChallengeStatus::Active,
            team_id: None,
            created_at: Utc::now(),
        }
    }

    #[actix_web::test]
    async fn listing_merges_caller_progress() {
        let caller = Uuid::new_v4();
        let challenge = active_challenge(10);
        let challenge_id = challenge.id;

        let mut ports = TestPorts::default();
        ports
            .challenges
            .expect_list_active_with_progress()
            .return_once(move |uid| {
                Ok(vec![ChallengeWithProgress {
                    challenge,
                    progress: Some(UserChallenge {
                        user_id: uid,
                        challenge_id,
                        progress: 4,
                        completed: false,
                        completed_at: None,
                    }),
                }])
            });

        let app = actix_test::init_service(test_app(ports.into_state())).await;
        let cookie = login_cookie(&app, caller).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::get()
                .uri("/api/v1/challenges")
                .cookie(cookie)
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(res).await;
        let first = &value.as_array().expect("array")[0];
        assert_eq!(first["progress"], 4);
        assert_eq!(first["completed"], false);
        assert_eq!(first["isActive"], true);
    }

    #[actix_web::test]
    async fn progress_update_reports_badge_award() {
        let caller = Uuid::new_v4();
        let challenge = active_challenge(5);
        let challenge_id = challenge.id;

        let mut ports = TestPorts::default();
        ports
            .challenges
            .expect_find_by_id()
            .return_once(move |_| Ok(Some(challenge)));
        ports
            .challenges
            .expect_find_user_challenge()
            .returning(|_, _| Ok(None));
        ports
            .challenges
            .expect_upsert_progress()
            .return_once(|update| {
                Ok(UserChallenge {
                    user_id: update.user_id,
                    challenge_id: update.challenge_id,
                    progress: update.progress,
                    completed: update.completed,
                    completed_at: update.completed_at,
                })
            });
        ports
            .challenges
            .expect_award_badge()
            .returning(|_, _| Ok(true));
        ports.notifications.expect_insert().returning(|_| Ok(()));

        let app = actix_test::init_service(test_app(ports.into_state())).await;
        let cookie = login_cookie(&app, caller).await;

        let res = actix_test::call_service(
            &app,
            actix_test::TestRequest::put()
                .uri(&format!("/api/v1/challenges/{challenge_id}/progress"))
                .cookie(cookie)
                .set_json(&ProgressRequestBody { progress: 5 })
                .to_request(),
        )
        .await;
        assert_eq!(res.status(), StatusCode::OK);
        let value: Value = actix_test::read_body_json(res).await;
        assert_eq!(value["completed"], true);
        assert_eq!(value["badgeAwarded"], true);
    }
}
