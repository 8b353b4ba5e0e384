//! Port for payment-record persistence.
//!
//! Settlement methods are guarded on the `Pending` status so a replayed
//! callback acknowledges without re-applying effects.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::payment::{PaymentStatus, SubscriptionPayment, TeamPayment};
use crate::domain::phone::PhoneNumber;

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by payment repository adapters.
    pub enum PaymentRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "payment repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "payment repository query failed: {message}",
    }
}

/// Payload for recording an initiated subscription payment.
#[derive(Debug, Clone)]
pub struct NewSubscriptionPayment {
    /// Pre-generated primary key.
    pub id: Uuid,
    /// Paying user.
    pub user_id: Uuid,
    /// Plan being purchased.
    pub plan_id: Uuid,
    /// Amount in whole KES.
    pub amount_kes: i64,
    /// Subscriber number the push was sent to.
    pub phone_number: PhoneNumber,
    /// Daraja checkout request id.
    pub checkout_request_id: String,
}

/// Payload for recording an initiated team payment.
#[derive(Debug, Clone)]
pub struct NewTeamPayment {
    /// Pre-generated primary key.
    pub id: Uuid,
    /// Team being joined.
    pub team_id: Uuid,
    /// Paying user.
    pub user_id: Uuid,
    /// Amount in whole KES.
    pub amount_kes: i64,
    /// Subscriber number the push was sent to.
    pub phone_number: PhoneNumber,
    /// Daraja checkout request id.
    pub checkout_request_id: String,
}

/// Port for payment reads and settlement.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentRepository: Send + Sync {
    /// Record an initiated subscription payment as `Pending`.
    async fn create_subscription_payment(
        &self,
        record: &NewSubscriptionPayment,
    ) -> Result<SubscriptionPayment, PaymentRepositoryError>;

    /// Record an initiated team payment as `Pending`.
    async fn create_team_payment(
        &self,
        record: &NewTeamPayment,
    ) -> Result<TeamPayment, PaymentRepositoryError>;

    /// Look up a subscription payment by checkout request id.
    async fn find_subscription_payment_by_checkout(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<SubscriptionPayment>, PaymentRepositoryError>;

    /// Look up a team payment by checkout request id.
    async fn find_team_payment_by_checkout(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<TeamPayment>, PaymentRepositoryError>;

    /// Settle a subscription payment; no-op unless currently `Pending`.
    ///
    /// Returns `true` when the transition was applied.
    async fn settle_subscription_payment(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
        receipt_number: Option<String>,
    ) -> Result<bool, PaymentRepositoryError>;

    /// Settle a team payment; no-op unless currently `Pending`.
    ///
    /// Returns `true` when the transition was applied.
    async fn settle_team_payment(
        &self,
        payment_id: Uuid,
        status: PaymentStatus,
        receipt_number: Option<String>,
    ) -> Result<bool, PaymentRepositoryError>;
}
