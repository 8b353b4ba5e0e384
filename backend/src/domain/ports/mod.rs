//! Domain ports: traits the services drive and adapters implement.

mod macros;

mod challenge_repository;
mod meeting_scheduler;
mod notification_repository;
mod payment_gateway;
mod payment_repository;
mod session_repository;
mod subscription_repository;
mod team_repository;
mod user_repository;

pub use challenge_repository::{
    ChallengeRepository, ChallengeRepositoryError, ChallengeWithProgress, CompletedChallenge,
    EarnedBadge, NewChallengeRecord, ProgressUpdate,
};
#[cfg(test)]
pub use challenge_repository::MockChallengeRepository;
pub use meeting_scheduler::{DisabledMeetingScheduler, MeetingRequest, MeetingScheduler};
#[cfg(test)]
pub use meeting_scheduler::MockMeetingScheduler;
pub use notification_repository::{NotificationRepository, NotificationRepositoryError};
#[cfg(test)]
pub use notification_repository::MockNotificationRepository;
pub use payment_gateway::{
    PaymentGateway, PaymentGatewayError, StkPushAcknowledgement, StkPushRequest,
    TransactionStatus, UnconfiguredPaymentGateway,
};
#[cfg(test)]
pub use payment_gateway::MockPaymentGateway;
pub use payment_repository::{
    NewSubscriptionPayment, NewTeamPayment, PaymentRepository, PaymentRepositoryError,
};
#[cfg(test)]
pub use payment_repository::MockPaymentRepository;
pub use session_repository::{
    NewSessionRecord, SessionDashboard, SessionListing, SessionRepository,
    SessionRepositoryError,
};
#[cfg(test)]
pub use session_repository::MockSessionRepository;
pub use subscription_repository::{SubscriptionRepository, SubscriptionRepositoryError};
#[cfg(test)]
pub use subscription_repository::MockSubscriptionRepository;
pub use team_repository::{
    NewTeamMessage, NewTeamRecord, TeamMemberProfile, TeamMessageWithSender, TeamOverview,
    TeamRepository, TeamRepositoryError,
};
#[cfg(test)]
pub use team_repository::MockTeamRepository;
pub use user_repository::{
    NewUserRecord, ProfileStats, StoredCredentials, UserRepository, UserRepositoryError,
};
#[cfg(test)]
pub use user_repository::MockUserRepository;
