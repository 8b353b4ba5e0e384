//! Endpoint coverage for the account handlers.

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::*;
use crate::domain::auth::PasswordHash;
use crate::domain::ports::{ProfileStats, StoredCredentials};
use crate::domain::user::EmailAddress;
use crate::inbound::http::test_utils::{TestPorts, test_session_middleware};

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
            .service(signup)
            .service(login)
            .service(logout)
            .service(get_profile)
            .service(update_profile)
            .service(change_password),
    )
}

fn stored_user(id: Uuid, email: &str) -> User {
    User {
        id,
        name: UserName::new("Ada").expect("valid name"),
        email: EmailAddress::new(email).expect("valid email"),
        bio: None,
        created_at: Utc::now(),
    }
}

#[actix_web::test]
async fn signup_returns_created_with_public_fields() {
    let mut ports = TestPorts::default();
    let created = stored_user(Uuid::new_v4(), "ada@example.com");
    ports.users.expect_find_by_email().returning(|_| Ok(None));
    ports
        .subscriptions
        .expect_ensure_basic_plan()
        .returning(|| {
            Ok(crate::domain::subscription::SubscriptionPlan {
                id: Uuid::new_v4(),
                name: "Basic".to_owned(),
                description: "Starter".to_owned(),
                price_monthly_kes: 0,
                price_yearly_kes: 0,
                max_sessions_per_week: 2,
                can_create_private_teams: false,
                has_priority_booking: false,
                has_advanced_analytics: false,
            })
        });
    ports
        .users
        .expect_create_account()
        .return_once(move |_, _| Ok(created));

    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/signup")
            .set_json(&SignupRequestBody {
                name: "Ada".to_owned(),
                email: "ada@example.com".to_owned(),
                password: "long enough pw".to_owned(),
            })
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::CREATED);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["email"], "ada@example.com");
    assert!(value.get("passwordHash").is_none());
}

#[actix_web::test]
async fn signup_rejects_malformed_email_with_field_details() {
    let app = actix_test::init_service(test_app(TestPorts::default().into_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/signup")
            .set_json(&SignupRequestBody {
                name: "Ada".to_owned(),
                email: "not-an-email".to_owned(),
                password: "long enough pw".to_owned(),
            })
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["details"]["field"], "email");
}

#[actix_web::test]
async fn login_sets_a_session_cookie_used_by_profile() {
    let user_id = Uuid::new_v4();
    let password = Password::for_signup("long enough pw").expect("valid password");
    let hash = PasswordHash::derive(&password).expect("hashing succeeds");

    let mut ports = TestPorts::default();
    ports
        .users
        .expect_credentials_by_email()
        .return_once(move |_| {
            Ok(Some(StoredCredentials {
                user_id,
                password_hash: hash,
            }))
        });
    ports
        .users
        .expect_find_by_id()
        .return_once(move |id| Ok(Some(stored_user(id, "ada@example.com"))));
    ports.users.expect_profile_stats().returning(|_| {
        Ok(ProfileStats {
            completed_sessions: 2,
            earned_badges: 1,
        })
    });
    ports
        .challenges
        .expect_recent_badges()
        .returning(|_, _| Ok(vec![]));

    let app = actix_test::init_service(test_app(ports.into_state())).await;

    let login_res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(&LoginRequestBody {
                email: "ada@example.com".to_owned(),
                password: "long enough pw".to_owned(),
            })
            .to_request(),
    )
    .await;
    assert!(login_res.status().is_success());
    let cookie = login_res
        .response()
        .cookies()
        .find(|cookie| cookie.name() == "session")
        .expect("session cookie");

    let profile_res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/profile")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert!(profile_res.status().is_success());
    let value: Value = actix_test::read_body_json(profile_res).await;
    assert_eq!(value["completedSessions"], 2);
    assert_eq!(value["earnedBadges"], 1);
}

#[actix_web::test]
async fn profile_requires_a_session() {
    let app = actix_test::init_service(test_app(TestPorts::default().into_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/profile")
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn wrong_credentials_are_unauthorised() {
    let mut ports = TestPorts::default();
    ports
        .users
        .expect_credentials_by_email()
        .returning(|_| Ok(None));

    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/login")
            .set_json(&LoginRequestBody {
                email: "ghost@example.com".to_owned(),
                password: "whatever-pw".to_owned(),
            })
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["message"], "invalid credentials");
}
