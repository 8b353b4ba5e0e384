//! Subscription use-cases: plan listing and subscribing.

use std::sync::Arc;

use uuid::Uuid;

use super::error::Error;
use super::notification::{NewNotification, NotificationKind, RelatedEntity};
use super::payment::SubscriptionPayment;
use super::phone::PhoneNumber;
use super::ports::{
    NewSubscriptionPayment, NotificationRepository, NotificationRepositoryError, PaymentGateway,
    PaymentGatewayError, PaymentRepository, PaymentRepositoryError, StkPushRequest,
    SubscriptionRepository, SubscriptionRepositoryError,
};
use super::subscription::{BillingCycle, PaymentMethod, SubscriptionPlan, UserSubscription};

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

fn map_gateway_error(error: PaymentGatewayError) -> Error {
    Error::service_unavailable(format!("payment provider unavailable: {error}"))
}

/// Outcome of a subscribe request.
#[derive(Debug, Clone)]
pub enum SubscribeOutcome {
    /// A free plan was activated immediately.
    Activated(UserSubscription),
    /// A paid plan needs the recorded payment to settle first.
    PaymentRequired(SubscriptionPayment),
}

/// Subscription service over the plan, payment, gateway, and notification
/// ports.
#[derive(Clone)]
pub struct SubscriptionService {
    subscriptions: Arc<dyn SubscriptionRepository>,
    payments: Arc<dyn PaymentRepository>,
    gateway: Arc<dyn PaymentGateway>,
    notifications: Arc<dyn NotificationRepository>,
}

impl SubscriptionService {
    /// Create the service from its ports.
    pub fn new(
        subscriptions: Arc<dyn SubscriptionRepository>,
        payments: Arc<dyn PaymentRepository>,
        gateway: Arc<dyn PaymentGateway>,
        notifications: Arc<dyn NotificationRepository>,
    ) -> Self {
        Self {
            subscriptions,
            payments,
            gateway,
            notifications,
        }
    }

    /// All purchasable plans.
    pub async fn plans(&self) -> Result<Vec<SubscriptionPlan>, Error> {
        self.subscriptions
            .list_plans()
            .await
            .map_err(map_subscription_error)
    }

    /// Subscribe the user to a plan.
    ///
    /// Free plans activate immediately. Paid plans record a pending payment,
    /// send the STK push, and leave activation to the payment callback.
    pub async fn subscribe(
        &self,
        user_id: Uuid,
        plan_id: Uuid,
        phone_number: Option<PhoneNumber>,
    ) -> Result<SubscribeOutcome, Error> {
        let plan = self
            .subscriptions
            .find_plan(plan_id)
            .await
            .map_err(map_subscription_error)?
            .ok_or_else(|| Error::invalid_request("invalid subscription plan"))?;

        if plan.is_free() {
            let subscription = self
                .subscriptions
                .activate(user_id, plan.id, BillingCycle::Monthly, PaymentMethod::Free)
                .await
                .map_err(map_subscription_error)?;

            self.notifications
                .insert(&NewNotification::about(
                    user_id,
                    NotificationKind::Subscription,
                    "Subscription Updated",
                    format!("You have successfully subscribed to the {} plan.", plan.name),
                    RelatedEntity::Subscription,
                    subscription.id,
                ))
                .await
                .map_err(map_notification_error)?;

            return Ok(SubscribeOutcome::Activated(subscription));
        }

        let phone_number = phone_number
            .ok_or_else(|| Error::invalid_request("phone number is required for payment"))?;

        let ack = self
            .gateway
            .initiate_stk_push(&StkPushRequest {
                phone_number: phone_number.clone(),
                amount_kes: plan.price_monthly_kes,
                account_reference: format!("SUB-{}", plan.name.to_uppercase()),
                description: "Subscription".to_owned(),
            })
            .await
            .map_err(map_gateway_error)?;

        let payment = self
            .payments
            .create_subscription_payment(&NewSubscriptionPayment {
                id: Uuid::new_v4(),
                user_id,
                plan_id: plan.id,
                amount_kes: plan.price_monthly_kes,
                phone_number,
                checkout_request_id: ack.checkout_request_id,
            })
            .await
            .map_err(map_payment_error)?;

        Ok(SubscribeOutcome::PaymentRequired(payment))
    }
}
