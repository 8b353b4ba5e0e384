//! Subscription plans and user subscriptions.
//!
//! Amounts are whole Kenyan shillings throughout; Daraja only accepts
//! integral amounts, so fractional pricing never enters the system.

use chrono::{DateTime, Months, Utc};
use uuid::Uuid;

use super::session::{UnknownVariant, string_enum};

/// Name of the plan activated for every new account.
pub const BASIC_PLAN_NAME: &str = "Basic";

string_enum! {
    /// Billing cadence of a subscription.
    pub enum BillingCycle {
        /// Renewed every month.
        Monthly => "MONTHLY",
        /// Renewed every year.
        Yearly => "YEARLY",
    }
}

string_enum! {
    /// How a subscription was paid for.
    pub enum PaymentMethod {
        /// Zero-price plan; no payment involved.
        Free => "FREE",
        /// Paid through the M-PESA STK push flow.
        Mpesa => "MPESA",
    }
}

/// A purchasable subscription tier.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionPlan {
    /// Primary key.
    pub id: Uuid,
    /// Unique plan name.
    pub name: String,
    /// Marketing description.
    pub description: String,
    /// Monthly price in whole KES; zero means free.
    pub price_monthly_kes: i64,
    /// Yearly price in whole KES.
    pub price_yearly_kes: i64,
    /// Weekly session allowance.
    pub max_sessions_per_week: i32,
    /// Whether private teams can be created on this plan.
    pub can_create_private_teams: bool,
    /// Whether bookings get priority placement.
    pub has_priority_booking: bool,
    /// Whether advanced analytics are unlocked.
    pub has_advanced_analytics: bool,
}

impl SubscriptionPlan {
    /// Whether subscribing to this plan requires a payment.
    pub fn is_free(&self) -> bool {
        self.price_monthly_kes == 0
    }
}

/// A user's subscription to a plan.
#[derive(Debug, Clone, PartialEq)]
pub struct UserSubscription {
    /// Primary key.
    pub id: Uuid,
    /// Subscriber.
    pub user_id: Uuid,
    /// Subscribed plan.
    pub plan_id: Uuid,
    /// Activation time.
    pub start_date: DateTime<Utc>,
    /// Expiry or deactivation time.
    pub end_date: Option<DateTime<Utc>>,
    /// Whether this is the user's current subscription.
    pub is_active: bool,
    /// Billing cadence.
    pub billing_cycle: BillingCycle,
    /// How the subscription was paid for.
    pub payment_method: PaymentMethod,
}

/// Compute the end of a one-month subscription term starting at `start`.
pub fn monthly_term_end(start: DateTime<Utc>) -> DateTime<Utc> {
    start
        .checked_add_months(Months::new(1))
        .unwrap_or(start + chrono::Duration::days(31))
}
