//! Endpoint coverage for the payment callback handler.

use actix_web::http::StatusCode;
use actix_web::{App, test as actix_test, web};
use chrono::Utc;
use serde_json::{Value, json};
use uuid::Uuid;

use super::*;
use crate::domain::payment::{PaymentStatus, SubscriptionPayment};
use crate::domain::phone::PhoneNumber;
use crate::domain::subscription::UserSubscription;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::test_utils::TestPorts;

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
    App::new()
        .app_data(web::Data::new(state))
        .service(web::scope("/api/v1").service(mpesa_callback))
}

fn success_envelope(checkout: &str) -> Value {
    json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "mr_1",
                "CheckoutRequestID": checkout,
                "ResultCode": 0,
                "ResultDesc": "The service request is processed successfully.",
                "CallbackMetadata": {
                    "Item": [
                        { "Name": "Amount", "Value": 999 },
                        { "Name": "MpesaReceiptNumber", "Value": "RCT999" },
                        { "Name": "PhoneNumber", "Value": 254712345678_i64 }
                    ]
                }
            }
        }
    })
}

fn pending_payment(checkout: &str) -> SubscriptionPayment {
    SubscriptionPayment {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        plan_id: Uuid::new_v4(),
        amount_kes: 999,
        currency: "KES".to_owned(),
        status: PaymentStatus::Pending,
        phone_number: PhoneNumber::new("0712345678").expect("valid phone"),
        checkout_request_id: checkout.to_owned(),
        receipt_number: None,
        completed_at: None,
        created_at: Utc::now(),
    }
}

#[actix_web::test]
async fn successful_callback_settles_and_activates() {
    let payment = pending_payment("ws_CO_10");

    let mut ports = TestPorts::default();
    ports
        .payments
        .expect_find_subscription_payment_by_checkout()
        .withf(|checkout| checkout == "ws_CO_10")
        .return_once(move |_| Ok(Some(payment)));
    ports
        .payments
        .expect_settle_subscription_payment()
        .withf(|_, status, receipt| {
            *status == PaymentStatus::Completed && receipt.as_deref() == Some("RCT999")
        })
        .returning(|_, _, _| Ok(true));
    ports
        .subscriptions
        .expect_activate()
        .return_once(|user_id, plan_id, cycle, method| {
            Ok(UserSubscription {
                id: Uuid::new_v4(),
                user_id,
                plan_id,
                start_date: Utc::now(),
                end_date: None,
                is_active: true,
                billing_cycle: cycle,
                payment_method: method,
            })
        });
    ports.notifications.expect_insert().returning(|_| Ok(()));

    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments/mpesa/callback")
            .set_json(success_envelope("ws_CO_10"))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
    let value: Value = actix_test::read_body_json(res).await;
    assert_eq!(value["success"], true);
}

#[actix_web::test]
async fn failed_callback_records_the_failure() {
    let payment = pending_payment("ws_CO_11");

    let mut ports = TestPorts::default();
    ports
        .payments
        .expect_find_subscription_payment_by_checkout()
        .return_once(move |_| Ok(Some(payment)));
    ports
        .payments
        .expect_settle_subscription_payment()
        .withf(|_, status, _| *status == PaymentStatus::Failed)
        .returning(|_, _, _| Ok(true));
    ports.notifications.expect_insert().returning(|_| Ok(()));

    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments/mpesa/callback")
            .set_json(json!({
                "Body": {
                    "stkCallback": {
                        "MerchantRequestID": "mr_2",
                        "CheckoutRequestID": "ws_CO_11",
                        "ResultCode": 1032,
                        "ResultDesc": "Request cancelled by user"
                    }
                }
            }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::OK);
}

#[actix_web::test]
async fn unknown_checkout_request_is_not_found() {
    let mut ports = TestPorts::default();
    ports
        .payments
        .expect_find_subscription_payment_by_checkout()
        .returning(|_| Ok(None));
    ports
        .payments
        .expect_find_team_payment_by_checkout()
        .returning(|_| Ok(None));

    let app = actix_test::init_service(test_app(ports.into_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments/mpesa/callback")
            .set_json(success_envelope("ws_CO_unknown"))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn callback_without_checkout_id_is_a_bad_request() {
    let app = actix_test::init_service(test_app(TestPorts::default().into_state())).await;
    let res = actix_test::call_service(
        &app,
        actix_test::TestRequest::post()
            .uri("/api/v1/payments/mpesa/callback")
            .set_json(json!({
                "Body": {
                    "stkCallback": {
                        "ResultCode": 0,
                        "ResultDesc": "ok"
                    }
                }
            }))
            .to_request(),
    )
    .await;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn receipt_numbers_tolerate_numeric_values() {
    let envelope: CallbackEnvelopeBody =
        serde_json::from_value(success_envelope("ws_CO_12")).expect("valid envelope");
    let outcome = crate::domain::payment::PaymentOutcome::try_from(envelope)
        .expect("outcome parses");
    assert_eq!(outcome.receipt_number.as_deref(), Some("RCT999"));
    assert!(outcome.is_success());
}
