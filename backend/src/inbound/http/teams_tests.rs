//! Endpoint coverage for the team handlers.

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::*;
use crate::domain::payment::PaymentStatus;
use crate::domain::ports::{StkPushAcknowledgement, TeamMemberProfile};
use crate::domain::team::{TeamRole, TeamStatus};
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
            .service(list_teams)
            .service(create_team)
            .service(join_team)
            .service(initiate_team_payment)
            .service(leave_team)
            .service(list_team_messages)
            .service(post_team_message)
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

fn team(entry_fee_kes: Option<i64>) -> Team {
    Team {
        id: Uuid::new_v4(),
        name: "Borrowers".to_owned(),
        description: "Lifetime studies".to_owned(),
        status: TeamStatus::Active,
        max_members: 4,
        entry_fee_kes,
        created_at: Utc::now(),
    }
}

#[actix_web::test]
async fn listing_includes_members_and_challenge_counters() {
    let caller = Uuid::new_v4();

    let mut ports = TestPorts::default();
    let crew = team(None);
    ports.teams.expect_list_overviews().return_once(move || {
        Ok(vec![TeamOverview {
            team: crew,
            members: vec![TeamMemberProfile {
                user_id: Uuid::new_v4(),
                name: "Ada".to_owned(),
                email: "ada@example.com".to_owned(),
                role: TeamRole::Leader,
            }],
            active_challenges: 2,
            completed_challenges: 1,
        }])
    });

    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = login_cookie(&app, caller).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::get()
            .uri("/api/v1/teams")
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(res).await;
    let first = &value.as_array().expect("array")[0];
    assert_eq!(first["members"][0]["role"], "LEADER");
    assert_eq!(first["activeChallenges"], 2);
    assert_eq!(first["completedChallenges"], 1);
}

#[actix_web::test]
async fn create_rejects_out_of_range_sizes() {
    let caller = Uuid::new_v4();
    let app = actix_test::init_service(test_app(TestPorts::default().into_state())).await;
    let cookie = login_cookie(&app, caller).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/teams")
            .cookie(cookie)
            .set_json(&CreateTeamRequestBody {
                name: "Crew".to_owned(),
                description: "desc".to_owned(),
                max_members: 42,
                entry_fee_kes: None,
            })
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn paid_team_join_is_redirected_to_payments() {
    let caller = Uuid::new_v4();
    let paid = team(Some(300));
    let team_id = paid.id;

    let mut ports = TestPorts::default();
    ports
        .teams
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(paid)));

    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = login_cookie(&app, caller).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/teams/{team_id}/join"))
            .cookie(cookie)
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["details"]["code"], "payment_required");
}

#[actix_web::test]
async fn team_payment_initiation_returns_checkout_id() {
    let caller = Uuid::new_v4();
    let paid = team(Some(300));
    let team_id = paid.id;

    let mut ports = TestPorts::default();
    ports
        .teams
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(paid)));
    ports.teams.expect_member_count().returning(|_| Ok(1));
    ports.teams.expect_find_member().returning(|_, _| Ok(None));
    ports.gateway.expect_initiate_stk_push().returning(|_| {
        Ok(StkPushAcknowledgement {
            merchant_request_id: "mr".to_owned(),
            checkout_request_id: "ws_CO_77".to_owned(),
        })
    });
    ports
        .payments
        .expect_create_team_payment()
        .return_once(move |record| {
            Ok(crate::domain::payment::TeamPayment {
                id: record.id,
                team_id: record.team_id,
                user_id: record.user_id,
                amount_kes: record.amount_kes,
                status: PaymentStatus::Pending,
                phone_number: record.phone_number.clone(),
                checkout_request_id: record.checkout_request_id.clone(),
                receipt_number: None,
                completed_at: None,
                created_at: Utc::now(),
            })
        });

    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let cookie = login_cookie(&app, caller).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/teams/{team_id}/payments"))
            .cookie(cookie)
            .set_json(&TeamPaymentRequestBody {
                phone_number: "0712345678".to_owned(),
            })
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["status"], "PENDING");
    assert_eq!(value["checkoutRequestId"], "ws_CO_77");
}

#[actix_web::test]
async fn payment_initiation_rejects_bad_phone_numbers() {
    let caller = Uuid::new_v4();
    let team_id = Uuid::new_v4();

    let app = actix_test::init_service(test_app(TestPorts::default().into_state())).await;
    let cookie = login_cookie(&app, caller).await;

    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri(&format!("/api/v1/teams/{team_id}/payments"))
            .cookie(cookie)
            .set_json(&TeamPaymentRequestBody {
                phone_number: "12345".to_owned(),
            })
            .to_request(),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["details"]["field"], "phoneNumber");
}
