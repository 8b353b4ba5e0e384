//! Shared HTTP adapter state.
//!
//! Handlers receive this via `actix_web::web::Data` so they depend only on
//! the domain services and stay testable with mocked ports underneath.

use std::sync::Arc;

use crate::domain::{
    AccountService, ChallengeService, DashboardService, NotificationService, PaymentService,
    SessionService, SubscriptionService, TeamService,
};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    /// Signup, login, profile, and password flows.
    pub accounts: Arc<AccountService>,
    /// Learning-session flows.
    pub sessions: Arc<SessionService>,
    /// Team and team-chat flows.
    pub teams: Arc<TeamService>,
    /// Challenge and badge flows.
    pub challenges: Arc<ChallengeService>,
    /// Plan listing and subscribe flows.
    pub subscriptions: Arc<SubscriptionService>,
    /// Payment callback settlement.
    pub payments: Arc<PaymentService>,
    /// Notification reads.
    pub notifications: Arc<NotificationService>,
    /// Dashboard aggregation.
    pub dashboard: Arc<DashboardService>,
}
