//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::Key;

use crate::domain::ports::{
    ChallengeRepository, MeetingScheduler, MockChallengeRepository, MockMeetingScheduler,
    MockNotificationRepository, MockPaymentGateway, MockPaymentRepository,
    MockSessionRepository, MockSubscriptionRepository, MockTeamRepository, MockUserRepository,
    NotificationRepository, PaymentGateway, PaymentRepository, SessionRepository,
    SubscriptionRepository, TeamRepository, UserRepository,
};
use crate::domain::{
    AccountService, ChallengeService, DashboardService, NotificationService, PaymentService,
    SessionService, SubscriptionService, TeamService,
};
use crate::inbound::http::state::HttpState;

/// Build a session middleware configured for tests.
///
/// Generates a fresh signing key per invocation and disables the `Secure`
/// flag for plain-HTTP test requests.
pub fn test_session_middleware() -> SessionMiddleware<CookieSessionStore> {
    SessionMiddleware::builder(CookieSessionStore::default(), Key::generate())
        .cookie_name("session".to_owned())
        .cookie_secure(false)
        .build()
}

/// Mock port bundle from which a full [`HttpState`] can be wired.
///
/// Tests configure the mocks they care about and leave the rest untouched;
/// an untouched mock panics when called, which is exactly the regression
/// signal handler tests want.
#[derive(Default)]
pub(crate) struct TestPorts {
    pub users: MockUserRepository,
    pub sessions: MockSessionRepository,
    pub teams: MockTeamRepository,
    pub challenges: MockChallengeRepository,
    pub subscriptions: MockSubscriptionRepository,
    pub payments: MockPaymentRepository,
    pub notifications: MockNotificationRepository,
    pub gateway: MockPaymentGateway,
    pub scheduler: MockMeetingScheduler,
}

impl TestPorts {
    /// Wire every service from the configured mocks.
    pub(crate) fn into_state(self) -> HttpState {
        let users: Arc<dyn UserRepository> = Arc::new(self.users);
        let sessions: Arc<dyn SessionRepository> = Arc::new(self.sessions);
        let teams: Arc<dyn TeamRepository> = Arc::new(self.teams);
        let challenges: Arc<dyn ChallengeRepository> = Arc::new(self.challenges);
        let subscriptions: Arc<dyn SubscriptionRepository> = Arc::new(self.subscriptions);
        let payments: Arc<dyn PaymentRepository> = Arc::new(self.payments);
        let notifications: Arc<dyn NotificationRepository> = Arc::new(self.notifications);
        let gateway: Arc<dyn PaymentGateway> = Arc::new(self.gateway);
        let scheduler: Arc<dyn MeetingScheduler> = Arc::new(self.scheduler);

        let team_service = TeamService::new(
            teams.clone(),
            users.clone(),
            challenges.clone(),
            notifications.clone(),
            payments.clone(),
            gateway.clone(),
        );

        HttpState {
            accounts: Arc::new(AccountService::new(
                users.clone(),
                subscriptions.clone(),
                challenges.clone(),
            )),
            sessions: Arc::new(SessionService::new(
                sessions.clone(),
                users.clone(),
                challenges.clone(),
                notifications.clone(),
                scheduler,
            )),
            teams: Arc::new(team_service.clone()),
            challenges: Arc::new(ChallengeService::new(
                challenges.clone(),
                notifications.clone(),
            )),
            subscriptions: Arc::new(SubscriptionService::new(
                subscriptions.clone(),
                payments.clone(),
                gateway,
                notifications.clone(),
            )),
            payments: Arc::new(PaymentService::new(
                payments,
                subscriptions,
                teams,
                notifications.clone(),
                team_service,
            )),
            notifications: Arc::new(NotificationService::new(notifications)),
            dashboard: Arc::new(DashboardService::new(sessions, challenges)),
        }
    }
}
