//! Behaviour coverage for [`super::TeamService`] over mocked ports.

use std::sync::Arc;

use chrono::Utc;
use mockall::predicate::eq;
use uuid::Uuid;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::payment::PaymentStatus;
use crate::domain::ports::{
    MockChallengeRepository, MockNotificationRepository, MockPaymentGateway,
    MockPaymentRepository, MockTeamRepository, MockUserRepository, StkPushAcknowledgement,
};
use crate::domain::team::{TeamMember, TeamStatus};
use crate::domain::user::{EmailAddress, User, UserName};

struct Mocks {
    teams: MockTeamRepository,
    users: MockUserRepository,
    challenges: MockChallengeRepository,
    notifications: MockNotificationRepository,
    payments: MockPaymentRepository,
    gateway: MockPaymentGateway,
}

impl Mocks {
    fn new() -> Self {
        Self {
            teams: MockTeamRepository::new(),
            users: MockUserRepository::new(),
            challenges: MockChallengeRepository::new(),
            notifications: MockNotificationRepository::new(),
            payments: MockPaymentRepository::new(),
            gateway: MockPaymentGateway::new(),
        }
    }

    fn into_service(self) -> TeamService {
        TeamService::new(
            Arc::new(self.teams),
            Arc::new(self.users),
            Arc::new(self.challenges),
            Arc::new(self.notifications),
            Arc::new(self.payments),
            Arc::new(self.gateway),
        )
    }
}

fn team(entry_fee_kes: Option<i64>) -> Team {
    Team {
        id: Uuid::new_v4(),
        name: "Borrowers".to_owned(),
        description: "Lifetime studies".to_owned(),
        status: TeamStatus::Active,
        max_members: 3,
        entry_fee_kes,
        created_at: Utc::now(),
    }
}

fn member(team_id: Uuid, user_id: Uuid, role: TeamRole) -> TeamMember {
    TeamMember {
        team_id,
        user_id,
        role,
        joined_at: Utc::now(),
    }
}

fn account(id: Uuid, name: &str) -> User {
    User {
        id,
        name: UserName::new(name).expect("valid name"),
        email: EmailAddress::new("member@example.com").expect("valid email"),
        bio: None,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn create_validates_team_size() {
    let svc = Mocks::new().into_service();
    let err = svc
        .create(
            Uuid::new_v4(),
            TeamDraft {
                name: "Crew".to_owned(),
                description: "desc".to_owned(),
                max_members: 1,
                entry_fee_kes: None,
            },
        )
        .await
        .expect_err("size 1 refused");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn create_broadcasts_to_other_users() {
    let creator = Uuid::new_v4();
    let other_a = Uuid::new_v4();
    let other_b = Uuid::new_v4();

    let mut mocks = Mocks::new();
    let created = team(None);
    mocks.teams.expect_create().return_once(move |_| Ok(created));
    mocks
        .users
        .expect_find_by_id()
        .return_once(move |id| Ok(Some(account(id, "Founder"))));
    mocks
        .users
        .expect_list_ids_except()
        .with(eq(creator))
        .returning(move |_| Ok(vec![other_a, other_b]));
    mocks
        .notifications
        .expect_insert_many()
        .withf(move |batch| {
            batch.len() == 2
                && batch.iter().all(|note| {
                    note.kind == NotificationKind::TeamCreated
                        && note.message.contains("Founder")
                })
        })
        .returning(|_| Ok(()));

    let svc = mocks.into_service();
    svc.create(
        creator,
        TeamDraft {
            name: "Borrowers".to_owned(),
            description: "Lifetime studies".to_owned(),
            max_members: 3,
            entry_fee_kes: None,
        },
    )
    .await
    .expect("create succeeds");
}

#[tokio::test]
async fn join_redirects_paid_teams_to_the_payment_flow() {
    let paid = team(Some(200));
    let team_id = paid.id;

    let mut mocks = Mocks::new();
    mocks
        .teams
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(paid)));
    mocks.teams.expect_add_member().never();

    let svc = mocks.into_service();
    let err = svc
        .join(Uuid::new_v4(), team_id)
        .await
        .expect_err("paid team refuses direct join");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    let details = err.details().expect("details present");
    assert_eq!(details["code"], "payment_required");
}

#[tokio::test]
async fn join_awards_team_player_badge_on_first_membership() {
    let free = team(None);
    let team_id = free.id;
    let joiner = Uuid::new_v4();
    let leader_id = Uuid::new_v4();

    let mut mocks = Mocks::new();
    mocks
        .teams
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(free)));
    mocks.teams.expect_member_count().returning(|_| Ok(1));
    mocks.teams.expect_find_member().returning(|_, _| Ok(None));
    mocks
        .teams
        .expect_add_member()
        .with(eq(team_id), eq(joiner), eq(TeamRole::Member))
        .returning(|_, _, _| Ok(()));
    mocks
        .teams
        .expect_membership_count_for_user()
        .returning(|_| Ok(1));
    mocks
        .challenges
        .expect_award_badge()
        .withf(|_, spec| spec.name == "Team Player")
        .returning(|_, _| Ok(true));
    mocks
        .teams
        .expect_leader()
        .return_once(move |tid| Ok(Some(member(tid, leader_id, TeamRole::Leader))));
    mocks
        .users
        .expect_find_by_id()
        .returning(|id| Ok(Some(account(id, "Joiner"))));
    // One badge notification plus one leader notification.
    mocks
        .notifications
        .expect_insert()
        .times(2)
        .returning(|_| Ok(()));

    let svc = mocks.into_service();
    svc.join(joiner, team_id).await.expect("join succeeds");
}

#[tokio::test]
async fn initiate_join_payment_records_pending_payment() {
    let paid = team(Some(250));
    let team_id = paid.id;
    let payer = Uuid::new_v4();

    let mut mocks = Mocks::new();
    mocks
        .teams
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(paid)));
    mocks.teams.expect_member_count().returning(|_| Ok(1));
    mocks.teams.expect_find_member().returning(|_, _| Ok(None));
    mocks
        .gateway
        .expect_initiate_stk_push()
        .withf(|request| request.amount_kes == 250 && request.description == "Team fee")
        .returning(|_| {
            Ok(StkPushAcknowledgement {
                merchant_request_id: "mr_1".to_owned(),
                checkout_request_id: "ws_CO_42".to_owned(),
            })
        });
    mocks
        .payments
        .expect_create_team_payment()
        .withf(move |record| {
            record.team_id == team_id
                && record.amount_kes == 250
                && record.checkout_request_id == "ws_CO_42"
        })
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

    let svc = mocks.into_service();
    let phone = PhoneNumber::new("0712345678").expect("valid phone");
    let payment = svc
        .initiate_join_payment(payer, team_id, phone)
        .await
        .expect("initiation succeeds");
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.checkout_request_id, "ws_CO_42");
}

#[tokio::test]
async fn leader_cannot_leave_a_populated_team() {
    let crew = team(None);
    let team_id = crew.id;
    let leader_id = Uuid::new_v4();

    let mut mocks = Mocks::new();
    mocks
        .teams
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(crew)));
    mocks
        .teams
        .expect_find_member()
        .return_once(move |tid, uid| Ok(Some(member(tid, uid, TeamRole::Leader))));
    mocks.teams.expect_member_count().returning(|_| Ok(2));
    mocks.teams.expect_delete().never();
    mocks.teams.expect_remove_member().never();

    let svc = mocks.into_service();
    let err = svc
        .leave(leader_id, team_id)
        .await
        .expect_err("populated team blocks leader departure");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
}

#[tokio::test]
async fn last_leader_leaving_deletes_the_team() {
    let crew = team(None);
    let team_id = crew.id;
    let leader_id = Uuid::new_v4();

    let mut mocks = Mocks::new();
    mocks
        .teams
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(crew)));
    mocks
        .teams
        .expect_find_member()
        .return_once(move |tid, uid| Ok(Some(member(tid, uid, TeamRole::Leader))));
    mocks.teams.expect_member_count().returning(|_| Ok(1));
    mocks
        .teams
        .expect_delete()
        .with(eq(team_id))
        .returning(|_| Ok(()));

    let svc = mocks.into_service();
    let departure = svc.leave(leader_id, team_id).await.expect("leave succeeds");
    assert_eq!(departure, TeamDeparture::TeamDeleted);
}

#[tokio::test]
async fn post_message_requires_membership() {
    let crew = team(None);
    let team_id = crew.id;

    let mut mocks = Mocks::new();
    mocks
        .teams
        .expect_find_by_id()
        .return_once(move |_| Ok(Some(crew)));
    mocks.teams.expect_find_member().returning(|_, _| Ok(None));
    mocks.teams.expect_add_message().never();

    let svc = mocks.into_service();
    let err = svc
        .post_message(Uuid::new_v4(), team_id, "hello".to_owned())
        .await
        .expect_err("non-member refused");
    assert_eq!(err.code(), ErrorCode::Forbidden);
}
