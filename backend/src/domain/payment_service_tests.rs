//! Behaviour coverage for callback settlement over mocked ports.

use std::sync::Arc;

use chrono::Utc;
use mockall::predicate::eq;
use uuid::Uuid;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::phone::PhoneNumber;
use crate::domain::ports::{
    MockChallengeRepository, MockNotificationRepository, MockPaymentGateway,
    MockPaymentRepository, MockSubscriptionRepository, MockTeamRepository, MockUserRepository,
};
use crate::domain::subscription::UserSubscription;
use crate::domain::team::{Team, TeamMember, TeamRole, TeamStatus};

fn subscription_payment(user_id: Uuid, plan_id: Uuid) -> SubscriptionPayment {
    SubscriptionPayment {
        id: Uuid::new_v4(),
        user_id,
        plan_id,
        amount_kes: 999,
        currency: "KES".to_owned(),
        status: PaymentStatus::Pending,
        phone_number: PhoneNumber::new("0712345678").expect("valid phone"),
        checkout_request_id: "ws_CO_1".to_owned(),
        receipt_number: None,
        completed_at: None,
        created_at: Utc::now(),
    }
}

fn team_payment(team_id: Uuid, user_id: Uuid) -> TeamPayment {
    TeamPayment {
        id: Uuid::new_v4(),
        team_id,
        user_id,
        amount_kes: 250,
        status: PaymentStatus::Pending,
        phone_number: PhoneNumber::new("0712345678").expect("valid phone"),
        checkout_request_id: "ws_CO_2".to_owned(),
        receipt_number: None,
        completed_at: None,
        created_at: Utc::now(),
    }
}

fn paid_team(team_id: Uuid) -> Team {
    Team {
        id: team_id,
        name: "Borrowers".to_owned(),
        description: "Lifetime studies".to_owned(),
        status: TeamStatus::Active,
        max_members: 5,
        entry_fee_kes: Some(250),
        created_at: Utc::now(),
    }
}

fn success(checkout: &str) -> PaymentOutcome {
    PaymentOutcome {
        checkout_request_id: checkout.to_owned(),
        result_code: 0,
        result_description: "The service request is processed successfully.".to_owned(),
        receipt_number: Some("RCT123".to_owned()),
    }
}

fn failure(checkout: &str) -> PaymentOutcome {
    PaymentOutcome {
        checkout_request_id: checkout.to_owned(),
        result_code: 1032,
        result_description: "Request cancelled by user".to_owned(),
        receipt_number: None,
    }
}

struct Mocks {
    payments: MockPaymentRepository,
    subscriptions: MockSubscriptionRepository,
    teams: MockTeamRepository,
    notifications: MockNotificationRepository,
    admit_teams: MockTeamRepository,
    admit_notifications: MockNotificationRepository,
    admit_challenges: MockChallengeRepository,
    admit_users: MockUserRepository,
}

impl Mocks {
    fn new() -> Self {
        Self {
            payments: MockPaymentRepository::new(),
            subscriptions: MockSubscriptionRepository::new(),
            teams: MockTeamRepository::new(),
            notifications: MockNotificationRepository::new(),
            admit_teams: MockTeamRepository::new(),
            admit_notifications: MockNotificationRepository::new(),
            admit_challenges: MockChallengeRepository::new(),
            admit_users: MockUserRepository::new(),
        }
    }

    fn into_service(self) -> PaymentService {
        let team_service = crate::domain::team_service::TeamService::new(
            Arc::new(self.admit_teams),
            Arc::new(self.admit_users),
            Arc::new(self.admit_challenges),
            Arc::new(self.admit_notifications),
            Arc::new(MockPaymentRepository::new()),
            Arc::new(MockPaymentGateway::new()),
        );
        PaymentService::new(
            Arc::new(self.payments),
            Arc::new(self.subscriptions),
            Arc::new(self.teams),
            Arc::new(self.notifications),
            team_service,
        )
    }
}

#[tokio::test]
async fn successful_subscription_callback_activates_the_plan() {
    let user = Uuid::new_v4();
    let plan = Uuid::new_v4();
    let payment = subscription_payment(user, plan);
    let payment_id = payment.id;

    let mut mocks = Mocks::new();
    mocks
        .payments
        .expect_find_subscription_payment_by_checkout()
        .withf(|checkout| checkout == "ws_CO_1")
        .return_once(move |_| Ok(Some(payment)));
    mocks
        .payments
        .expect_settle_subscription_payment()
        .withf(move |id, status, receipt| {
            *id == payment_id
                && *status == PaymentStatus::Completed
                && receipt.as_deref() == Some("RCT123")
        })
        .returning(|_, _, _| Ok(true));
    mocks
        .subscriptions
        .expect_activate()
        .with(
            eq(user),
            eq(plan),
            eq(BillingCycle::Monthly),
            eq(PaymentMethod::Mpesa),
        )
        .return_once(move |uid, pid, cycle, method| {
            Ok(UserSubscription {
                id: Uuid::new_v4(),
                user_id: uid,
                plan_id: pid,
                start_date: Utc::now(),
                end_date: None,
                is_active: true,
                billing_cycle: cycle,
                payment_method: method,
            })
        });
    mocks
        .notifications
        .expect_insert()
        .withf(|note| note.title == "Subscription Activated")
        .returning(|_| Ok(()));

    let svc = mocks.into_service();
    svc.process_callback(success("ws_CO_1"))
        .await
        .expect("callback settles");
}

#[tokio::test]
async fn failed_subscription_callback_marks_payment_failed() {
    let payment = subscription_payment(Uuid::new_v4(), Uuid::new_v4());

    let mut mocks = Mocks::new();
    mocks
        .payments
        .expect_find_subscription_payment_by_checkout()
        .return_once(move |_| Ok(Some(payment)));
    mocks
        .payments
        .expect_settle_subscription_payment()
        .withf(|_, status, receipt| *status == PaymentStatus::Failed && receipt.is_none())
        .returning(|_, _, _| Ok(true));
    mocks.subscriptions.expect_activate().never();
    mocks
        .notifications
        .expect_insert()
        .withf(|note| {
            note.title == "Payment Failed" && note.message.contains("Request cancelled")
        })
        .returning(|_| Ok(()));

    let svc = mocks.into_service();
    svc.process_callback(failure("ws_CO_1"))
        .await
        .expect("failed callback still acknowledged");
}

#[tokio::test]
async fn replayed_callback_is_acknowledged_without_side_effects() {
    let payment = subscription_payment(Uuid::new_v4(), Uuid::new_v4());

    let mut mocks = Mocks::new();
    mocks
        .payments
        .expect_find_subscription_payment_by_checkout()
        .return_once(move |_| Ok(Some(payment)));
    // Settlement reports the row was no longer pending.
    mocks
        .payments
        .expect_settle_subscription_payment()
        .returning(|_, _, _| Ok(false));
    mocks.subscriptions.expect_activate().never();
    mocks.notifications.expect_insert().never();

    let svc = mocks.into_service();
    svc.process_callback(success("ws_CO_1"))
        .await
        .expect("replay acknowledged");
}

#[tokio::test]
async fn successful_team_callback_admits_the_member() {
    let team_id = Uuid::new_v4();
    let user = Uuid::new_v4();
    let payment = team_payment(team_id, user);

    let mut mocks = Mocks::new();
    mocks
        .payments
        .expect_find_subscription_payment_by_checkout()
        .returning(|_| Ok(None));
    mocks
        .payments
        .expect_find_team_payment_by_checkout()
        .withf(|checkout| checkout == "ws_CO_2")
        .return_once(move |_| Ok(Some(payment)));
    mocks
        .payments
        .expect_settle_team_payment()
        .withf(|_, status, _| *status == PaymentStatus::Completed)
        .returning(|_, _, _| Ok(true));
    mocks
        .teams
        .expect_find_by_id()
        .return_once(move |id| Ok(Some(paid_team(id))));

    // TeamService::admit_paid_member path.
    mocks
        .admit_teams
        .expect_find_by_id()
        .return_once(move |id| Ok(Some(paid_team(id))));
    mocks
        .admit_teams
        .expect_find_member()
        .returning(|_, _| Ok(None));
    mocks
        .admit_teams
        .expect_add_member()
        .with(eq(team_id), eq(user), eq(TeamRole::Member))
        .returning(|_, _, _| Ok(()));
    mocks
        .admit_teams
        .expect_membership_count_for_user()
        .returning(|_| Ok(2));
    mocks.admit_teams.expect_leader().return_once(move |tid| {
        Ok(Some(TeamMember {
            team_id: tid,
            user_id: Uuid::new_v4(),
            role: TeamRole::Leader,
            joined_at: Utc::now(),
        }))
    });
    mocks
        .admit_users
        .expect_find_by_id()
        .returning(|_| Ok(None));
    mocks
        .admit_notifications
        .expect_insert()
        .returning(|_| Ok(()));

    mocks
        .notifications
        .expect_insert()
        .withf(|note| note.title == "Team Payment Successful")
        .returning(|_| Ok(()));

    let svc = mocks.into_service();
    svc.process_callback(success("ws_CO_2"))
        .await
        .expect("team callback settles");
}

#[tokio::test]
async fn unknown_checkout_request_is_not_found() {
    let mut mocks = Mocks::new();
    mocks
        .payments
        .expect_find_subscription_payment_by_checkout()
        .returning(|_| Ok(None));
    mocks
        .payments
        .expect_find_team_payment_by_checkout()
        .returning(|_| Ok(None));

    let svc = mocks.into_service();
    let err = svc
        .process_callback(success("ws_CO_unknown"))
        .await
        .expect_err("unknown checkout rejected");
    assert_eq!(err.code(), ErrorCode::NotFound);
}
