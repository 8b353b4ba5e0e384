//! Port for subscription plan and subscription persistence.

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::subscription::{
    BillingCycle, PaymentMethod, SubscriptionPlan, UserSubscription,
};

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by subscription repository adapters.
    pub enum SubscriptionRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "subscription repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "subscription repository query failed: {message}",
    }
}

/// Port for plan and subscription reads and writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SubscriptionRepository: Send + Sync {
    /// All plans, cheapest monthly price first.
    async fn list_plans(&self) -> Result<Vec<SubscriptionPlan>, SubscriptionRepositoryError>;

    /// Find a plan by id.
    async fn find_plan(
        &self,
        id: Uuid,
    ) -> Result<Option<SubscriptionPlan>, SubscriptionRepositoryError>;

    /// Fetch the free Basic plan, inserting it when missing.
    async fn ensure_basic_plan(
        &self,
    ) -> Result<SubscriptionPlan, SubscriptionRepositoryError>;

    /// Activate a one-month subscription, deactivating any predecessor,
    /// atomically.
    async fn activate(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        billing_cycle: BillingCycle,
        payment_method: PaymentMethod,
    ) -> Result<UserSubscription, SubscriptionRepositoryError>;
}
