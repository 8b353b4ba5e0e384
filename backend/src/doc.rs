//! OpenAPI documentation configuration.
//!
//! Defines the [`ApiDoc`] struct generating the OpenAPI specification for the
//! REST API: every endpoint from the inbound layer, the shared error schema,
//! and the session-cookie security scheme. Swagger UI serves the document in
//! debug builds.

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Enrich the generated document with the session cookie security scheme.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "SessionCookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                "session",
                "Session cookie issued by POST /api/v1/login.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Learning platform backend API",
        description = "HTTP interface for accounts, learning sessions, teams, \
                       challenges, subscriptions, and payments."
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("SessionCookie" = [])),
    paths(
        crate::inbound::http::accounts::signup,
        crate::inbound::http::accounts::login,
        crate::inbound::http::accounts::logout,
        crate::inbound::http::accounts::get_profile,
        crate::inbound::http::accounts::update_profile,
        crate::inbound::http::accounts::change_password,
        crate::inbound::http::sessions::list_sessions,
        crate::inbound::http::sessions::create_session,
        crate::inbound::http::sessions::join_session,
        crate::inbound::http::sessions::start_session,
        crate::inbound::http::sessions::complete_session,
        crate::inbound::http::teams::list_teams,
        crate::inbound::http::teams::create_team,
        crate::inbound::http::teams::join_team,
        crate::inbound::http::teams::initiate_team_payment,
        crate::inbound::http::teams::leave_team,
        crate::inbound::http::teams::list_team_messages,
        crate::inbound::http::teams::post_team_message,
        crate::inbound::http::challenges::list_challenges,
        crate::inbound::http::challenges::create_challenge,
        crate::inbound::http::challenges::join_challenge,
        crate::inbound::http::challenges::update_progress,
        crate::inbound::http::subscriptions::list_plans,
        crate::inbound::http::subscriptions::subscribe,
        crate::inbound::http::payments::mpesa_callback,
        crate::inbound::http::notifications::list_notifications,
        crate::inbound::http::notifications::mark_notifications_read,
        crate::inbound::http::dashboard::get_dashboard,
    ),
    components(schemas(
        crate::domain::Error,
        crate::domain::ErrorCode,
        crate::inbound::http::accounts::SignupRequestBody,
        crate::inbound::http::accounts::LoginRequestBody,
        crate::inbound::http::accounts::UserResponseBody,
        crate::inbound::http::accounts::ProfileResponseBody,
        crate::inbound::http::accounts::UpdateProfileRequestBody,
        crate::inbound::http::accounts::ChangePasswordRequestBody,
        crate::inbound::http::sessions::CreateSessionRequestBody,
        crate::inbound::http::sessions::SessionResponseBody,
        crate::inbound::http::sessions::SessionListingBody,
        crate::inbound::http::sessions::StartSessionResponseBody,
        crate::inbound::http::teams::CreateTeamRequestBody,
        crate::inbound::http::teams::TeamResponseBody,
        crate::inbound::http::teams::TeamOverviewBody,
        crate::inbound::http::teams::TeamPaymentRequestBody,
        crate::inbound::http::teams::TeamPaymentResponseBody,
        crate::inbound::http::teams::PostMessageRequestBody,
        crate::inbound::http::teams::TeamMessageBody,
        crate::inbound::http::challenges::CreateChallengeRequestBody,
        crate::inbound::http::challenges::ChallengeResponseBody,
        crate::inbound::http::challenges::ProgressRequestBody,
        crate::inbound::http::subscriptions::SubscribeRequestBody,
        crate::inbound::http::subscriptions::PlanResponseBody,
        crate::inbound::http::payments::CallbackEnvelopeBody,
        crate::inbound::http::notifications::NotificationResponseBody,
        crate::inbound::http::notifications::MarkReadRequestBody,
        crate::inbound::http::dashboard::DashboardResponseBody,
    )),
    tags(
        (name = "accounts", description = "Signup, login, and profile"),
        (name = "sessions", description = "Scheduled learning sessions"),
        (name = "teams", description = "Team formation and chat"),
        (name = "challenges", description = "Gamified challenges and badges"),
        (name = "subscriptions", description = "Plans and billing"),
        (name = "payments", description = "Mobile-money settlement"),
        (name = "notifications", description = "In-app notifications"),
        (name = "dashboard", description = "Aggregate statistics"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_registers_every_endpoint_group() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/api/v1/signup",
            "/api/v1/sessions",
            "/api/v1/teams",
            "/api/v1/challenges",
            "/api/v1/subscription/subscribe",
            "/api/v1/payments/mpesa/callback",
            "/api/v1/notifications",
            "/api/v1/dashboard",
        ] {
            assert!(paths.contains(&expected), "missing path: {expected}");
        }
    }

    #[test]
    fn document_declares_the_session_cookie_scheme() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components present");
        assert!(components.security_schemes.contains_key("SessionCookie"));
    }
}
