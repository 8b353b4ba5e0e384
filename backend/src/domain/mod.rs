//! Domain layer: entities, validation, services, and ports.
//!
//! Purpose: keep all platform semantics transport- and storage-agnostic.
//! Inbound adapters translate HTTP requests into calls on the services here;
//! outbound adapters implement the ports the services drive.

pub mod account_service;
pub mod auth;
pub mod challenge;
pub mod challenge_service;
pub mod dashboard_service;
pub mod error;
pub mod notification;
pub mod notification_service;
pub mod payment;
pub mod payment_service;
pub mod phone;
pub mod ports;
pub mod session;
pub mod session_service;
pub mod subscription;
pub mod subscription_service;
pub mod team;
pub mod team_service;
pub mod user;

pub use self::account_service::{AccountService, ProfileView};
pub use self::challenge_service::{ChallengeDraft, ChallengeService, ProgressResult};
pub use self::dashboard_service::{DashboardService, DashboardView};
pub use self::error::{Error, ErrorCode, TRACE_ID_HEADER};
pub use self::notification_service::NotificationService;
pub use self::payment_service::PaymentService;
pub use self::session_service::{
    CompletionResult, SessionDraft, SessionService, StartedSession,
};
pub use self::subscription_service::{SubscribeOutcome, SubscriptionService};
pub use self::team_service::{TeamDeparture, TeamDraft, TeamService};
