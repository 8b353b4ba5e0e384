//! Settlement of STK-push callbacks.
//!
//! The provider calls back once per checkout request. The checkout request id
//! is matched against subscription payments first, then team payments; the
//! settlement itself is guarded on the `Pending` status, so replays
//! acknowledge without re-applying effects.

use std::sync::Arc;

use tracing::{info, warn};

use super::error::Error;
use super::notification::{NewNotification, NotificationKind, RelatedEntity};
use super::payment::{PaymentOutcome, PaymentStatus, SubscriptionPayment, TeamPayment};
use super::ports::{
    NotificationRepository, NotificationRepositoryError, PaymentRepository,
    PaymentRepositoryError, SubscriptionRepository, SubscriptionRepositoryError, TeamRepository,
    TeamRepositoryError,
};
use super::subscription::{BillingCycle, PaymentMethod};
use super::team_service::TeamService;

fn map_payment_error(error: PaymentRepositoryError) -> Error {
    match error {
        PaymentRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("payment repository unavailable: {message}"))
        }
        PaymentRepositoryError::Query { message } => {
            Error::internal(format!("payment repository error: {message}"))
        }
    }
}

fn map_subscription_error(error: SubscriptionRepositoryError) -> Error {
    match error {
        SubscriptionRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("subscription repository unavailable: {message}"))
        }
        SubscriptionRepositoryError::Query { message } => {
            Error::internal(format!("subscription repository error: {message}"))
        }
    }
}

fn map_team_error(error: TeamRepositoryError) -> Error {
    match error {
        TeamRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("team repository unavailable: {message}"))
        }
        TeamRepositoryError::Query { message } => {
            Error::internal(format!("team repository error: {message}"))
        }
    }
}

fn map_notification_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("notification repository unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification repository error: {message}"))
        }
    }
}

/// Callback settlement service.
#[derive(Clone)]
pub struct PaymentService {
    payments: Arc<dyn PaymentRepository>,
    subscriptions: Arc<dyn SubscriptionRepository>,
    teams: Arc<dyn TeamRepository>,
    notifications: Arc<dyn NotificationRepository>,
    team_service: TeamService,
}

impl PaymentService {
    /// Create the service from its ports and the team service used to admit
    /// paid members.
    pub fn new(
        payments: Arc<dyn PaymentRepository>,
        subscriptions: Arc<dyn SubscriptionRepository>,
        teams: Arc<dyn TeamRepository>,
        notifications: Arc<dyn NotificationRepository>,
        team_service: TeamService,
    ) -> Self {
        Self {
            payments,
            subscriptions,
            teams,
            notifications,
            team_service,
        }
    }

    /// Apply a provider callback to the matching payment record.
    ///
    /// # Errors
    /// `not_found` when no payment carries the checkout request id.
    pub async fn process_callback(&self, outcome: PaymentOutcome) -> Result<(), Error> {
        if let Some(payment) = self
            .payments
            .find_subscription_payment_by_checkout(&outcome.checkout_request_id)
            .await
            .map_err(map_payment_error)?
        {
            return self.settle_subscription(payment, &outcome).await;
        }

        if let Some(payment) = self
            .payments
            .find_team_payment_by_checkout(&outcome.checkout_request_id)
            .await
            .map_err(map_payment_error)?
        {
            return self.settle_team(payment, &outcome).await;
        }

        warn!(
            checkout_request_id = %outcome.checkout_request_id,
            "callback for unknown checkout request"
        );
        Err(Error::not_found("payment not found"))
    }

    async fn settle_subscription(
        &self,
        payment: SubscriptionPayment,
        outcome: &PaymentOutcome,
    ) -> Result<(), Error> {
        let status = if outcome.is_success() {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Failed
        };
        let applied = self
            .payments
            .settle_subscription_payment(payment.id, status, outcome.receipt_number.clone())
            .await
            .map_err(map_payment_error)?;
        if !applied {
            info!(payment_id = %payment.id, "subscription payment already settled; ignoring replay");
            return Ok(());
        }

        if outcome.is_success() {
            let subscription = self
                .subscriptions
                .activate(
                    payment.user_id,
                    payment.plan_id,
                    BillingCycle::Monthly,
                    PaymentMethod::Mpesa,
                )
                .await
                .map_err(map_subscription_error)?;
            info!(
                user_id = %payment.user_id,
                plan_id = %payment.plan_id,
                "subscription activated after successful payment"
            );

            self.notifications
                .insert(&NewNotification::about(
                    payment.user_id,
                    NotificationKind::Subscription,
                    "Subscription Activated",
                    "Your subscription has been activated after successful payment.",
                    RelatedEntity::Subscription,
                    subscription.id,
                ))
                .await
                .map_err(map_notification_error)?;
        } else {
            self.notifications
                .insert(&NewNotification::about(
                    payment.user_id,
                    NotificationKind::Payment,
                    "Payment Failed",
                    format!("Subscription payment failed: {}", outcome.result_description),
                    RelatedEntity::Payment,
                    payment.id,
                ))
                .await
                .map_err(map_notification_error)?;
        }

        Ok(())
    }

    async fn settle_team(
        &self,
        payment: TeamPayment,
        outcome: &PaymentOutcome,
    ) -> Result<(), Error> {
        let status = if outcome.is_success() {
            PaymentStatus::Completed
        } else {
            PaymentStatus::Failed
        };
        let applied = self
            .payments
            .settle_team_payment(payment.id, status, outcome.receipt_number.clone())
            .await
            .map_err(map_payment_error)?;
        if !applied {
            info!(payment_id = %payment.id, "team payment already settled; ignoring replay");
            return Ok(());
        }

        let team_name = self
            .teams
            .find_by_id(payment.team_id)
            .await
            .map_err(map_team_error)?
            .map_or_else(|| "the team".to_owned(), |team| team.name);

        if outcome.is_success() {
            self.team_service
                .admit_paid_member(payment.team_id, payment.user_id)
                .await?;

            self.notifications
                .insert(&NewNotification::about(
                    payment.user_id,
                    NotificationKind::Payment,
                    "Team Payment Successful",
                    format!("Your payment for joining {team_name} was successful."),
                    RelatedEntity::Team,
                    payment.team_id,
                ))
                .await
                .map_err(map_notification_error)?;
        } else {
            self.notifications
                .insert(&NewNotification::about(
                    payment.user_id,
                    NotificationKind::Payment,
                    "Team Payment Failed",
                    format!(
                        "Your payment for joining {team_name} failed. Please try again."
                    ),
                    RelatedEntity::Team,
                    payment.team_id,
                ))
                .await
                .map_err(map_notification_error)?;
        }

        Ok(())
    }
}

#[cfg(test)]
#[path = "payment_service_tests.rs"]
mod tests;
