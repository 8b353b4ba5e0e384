//! Account API handlers.
//!
//! ```text
//! POST /api/v1/signup
//! POST /api/v1/login
//! POST /api/v1/logout
//! GET  /api/v1/profile
//! PUT  /api/v1/profile
//! PUT  /api/v1/profile/password
//! ```

use actix_web::{HttpResponse, get, post, put, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::auth::{
    CredentialValidationError, LoginCredentials, Password, SignupDetails,
};
use crate::domain::user::{User, UserName, UserValidationError};
use crate::domain::{Error, ProfileView};
use crate::inbound::http::ApiResult;
use crate::inbound::http::session::SessionContext;
use crate::inbound::http::state::HttpState;

/// Signup request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequestBody {
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Plaintext password (hashed server-side).
    pub password: String,
}

/// Public account fields returned after signup.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponseBody {
    /// Account id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
}

/// Login request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequestBody {
    /// Login email.
    pub email: String,
    /// Plaintext password.
    pub password: String,
}

/// Profile response body.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponseBody {
    /// Account id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Login email.
    pub email: String,
    /// Optional bio.
    pub bio: Option<String>,
    /// Sessions the user finished.
    pub completed_sessions: i64,
    /// Badges the user holds.
    pub earned_badges: i64,
    /// Account creation time.
    pub joined_date: String,
    /// Up to six most recent badges.
    pub recent_badges: Vec<RecentBadgeBody>,
}

/// A recently earned badge.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecentBadgeBody {
    /// Badge id.
    pub id: String,
    /// Badge name.
    pub name: String,
    /// Badge description.
    pub description: String,
    /// Award time.
    pub earned_at: String,
}

/// Profile update request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequestBody {
    /// New display name (required).
    pub name: String,
    /// New bio; omitting clears it.
    pub bio: Option<String>,
}

/// Password change request body.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequestBody {
    /// Current password for verification.
    pub current_password: String,
    /// Replacement password.
    pub new_password: String,
}

fn user_body(user: &User) -> UserResponseBody {
    UserResponseBody {
        id: user.id.to_string(),
        name: user.name.to_string(),
        email: user.email.to_string(),
    }
}

fn map_credential_error(err: CredentialValidationError) -> Error {
    let field = match &err {
        CredentialValidationError::PasswordTooShort
        | CredentialValidationError::EmptyPassword => "password",
        CredentialValidationError::User(UserValidationError::InvalidEmail) => "email",
        CredentialValidationError::User(_) => "name",
    };
    Error::invalid_request(err.to_string()).with_details(json!({ "field": field }))
}

impl From<ProfileView> for ProfileResponseBody {
    fn from(view: ProfileView) -> Self {
        Self {
            id: view.user.id.to_string(),
            name: view.user.name.to_string(),
            email: view.user.email.to_string(),
            bio: view.user.bio,
            completed_sessions: view.completed_sessions,
            earned_badges: view.earned_badges,
            joined_date: view.user.created_at.to_rfc3339(),
            recent_badges: view
                .recent_badges
                .into_iter()
                .map(|earned| RecentBadgeBody {
                    id: earned.badge.id.to_string(),
                    name: earned.badge.name,
                    description: earned.badge.description,
                    earned_at: earned.earned_at.to_rfc3339(),
                })
                .collect(),
        }
    }
}

/// Register a new account on the free Basic plan.
#[utoipa::path(
    post,
    path = "/api/v1/signup",
    request_body = SignupRequestBody,
    responses(
        (status = 201, description = "Account created", body = UserResponseBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 409, description = "Email already registered", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "signup",
    security([])
)]
#[post("/signup")]
pub async fn signup(
    state: web::Data<HttpState>,
    payload: web::Json<SignupRequestBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let details = SignupDetails::try_from_parts(&body.name, &body.email, &body.password)
        .map_err(map_credential_error)?;

    let user = state.accounts.signup(details).await?;
    Ok(HttpResponse::Created().json(user_body(&user)))
}

/// Authenticate and establish a session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/login",
    request_body = LoginRequestBody,
    responses(
        (status = 200, description = "Login success", headers(("Set-Cookie" = String, description = "Session cookie"))),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Invalid credentials", body = Error),
        (status = 500, description = "Internal server error", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "login",
    security([])
)]
#[post("/login")]
pub async fn login(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<LoginRequestBody>,
) -> ApiResult<HttpResponse> {
    let body = payload.into_inner();
    let credentials = LoginCredentials::try_from_parts(&body.email, &body.password)
        .map_err(map_credential_error)?;

    let user_id = state.accounts.login(credentials).await?;
    session.persist_user(user_id)?;
    Ok(HttpResponse::Ok().finish())
}

/// Drop the session cookie.
#[utoipa::path(
    post,
    path = "/api/v1/logout",
    responses((status = 200, description = "Session cleared")),
    tags = ["accounts"],
    operation_id = "logout"
)]
#[post("/logout")]
pub async fn logout(session: SessionContext) -> HttpResponse {
    session.clear();
    HttpResponse::Ok().finish()
}

/// Fetch the caller's profile.
#[utoipa::path(
    get,
    path = "/api/v1/profile",
    responses(
        (status = 200, description = "Profile", body = ProfileResponseBody),
        (status = 401, description = "Unauthorized", body = Error),
        (status = 404, description = "Not found", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "getProfile",
    security(("SessionCookie" = []))
)]
#[get("/profile")]
pub async fn get_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
) -> ApiResult<web::Json<ProfileResponseBody>> {
    let user_id = session.require_user_id()?;
    let view = state.accounts.profile(user_id).await?;
    Ok(web::Json(ProfileResponseBody::from(view)))
}

/// Update the caller's name and bio.
#[utoipa::path(
    put,
    path = "/api/v1/profile",
    request_body = UpdateProfileRequestBody,
    responses(
        (status = 200, description = "Profile updated", body = UserResponseBody),
        (status = 400, description = "Invalid request", body = Error),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "updateProfile",
    security(("SessionCookie" = []))
)]
#[put("/profile")]
pub async fn update_profile(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<UpdateProfileRequestBody>,
) -> ApiResult<web::Json<UserResponseBody>> {
    let user_id = session.require_user_id()?;
    let body = payload.into_inner();
    let name = UserName::new(&body.name)
        .map_err(|err| Error::invalid_request(err.to_string()).with_details(json!({ "field": "name" })))?;

    let user = state
        .accounts
        .update_profile(user_id, name, body.bio)
        .await?;
    Ok(web::Json(user_body(&user)))
}

/// Change the caller's password.
#[utoipa::path(
    put,
    path = "/api/v1/profile/password",
    request_body = ChangePasswordRequestBody,
    responses(
        (status = 200, description = "Password updated"),
        (status = 400, description = "Invalid request or wrong password", body = Error),
        (status = 401, description = "Unauthorized", body = Error)
    ),
    tags = ["accounts"],
    operation_id = "changePassword",
    security(("SessionCookie" = []))
)]
#[put("/profile/password")]
pub async fn change_password(
    state: web::Data<HttpState>,
    session: SessionContext,
    payload: web::Json<ChangePasswordRequestBody>,
) -> ApiResult<HttpResponse> {
    let user_id = session.require_user_id()?;
    let body = payload.into_inner();
    let current = Password::for_login(body.current_password).map_err(map_credential_error)?;
    let new = Password::for_signup(body.new_password).map_err(map_credential_error)?;

    state
        .accounts
        .change_password(user_id, current, new)
        .await?;
    Ok(HttpResponse::Ok().json(json!({ "message": "Password updated successfully" })))
}

#[cfg(test)]
#[path = "accounts_tests.rs"]
mod tests;
