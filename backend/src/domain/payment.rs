//! Payment records and the STK-push callback contract.
//!
//! Two payment kinds exist: subscription payments (activate a plan) and team
//! payments (grant paid team membership). Both carry the Daraja checkout
//! request id so the callback can reconcile results, and both move
//! `Pending -> Completed | Failed` exactly once.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::phone::PhoneNumber;
use super::session::{UnknownVariant, string_enum};

/// Daraja result code signalling a successful transaction.
pub const RESULT_CODE_SUCCESS: i64 = 0;

string_enum! {
    /// Lifecycle of a payment record.
    pub enum PaymentStatus {
        /// STK push sent; awaiting the callback.
        Pending => "PENDING",
        /// Callback reported success.
        Completed => "COMPLETED",
        /// Callback reported failure or the push was declined.
        Failed => "FAILED",
    }
}

/// A pending-or-settled subscription purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionPayment {
    /// Primary key.
    pub id: Uuid,
    /// Paying user.
    pub user_id: Uuid,
    /// Plan being purchased.
    pub plan_id: Uuid,
    /// Amount in whole KES.
    pub amount_kes: i64,
    /// ISO currency code (always `KES`).
    pub currency: String,
    /// Payment lifecycle status.
    pub status: PaymentStatus,
    /// Subscriber number the push was sent to.
    pub phone_number: PhoneNumber,
    /// Daraja checkout request id used for reconciliation.
    pub checkout_request_id: String,
    /// M-PESA receipt number, present once completed.
    pub receipt_number: Option<String>,
    /// Settlement time (success or failure).
    pub completed_at: Option<DateTime<Utc>>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}

/// A pending-or-settled team joining fee.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamPayment {
    /// Primary key.
    pub id: Uuid,
    /// Team being joined.
    pub team_id: Uuid,
    /// Paying user.
    pub user_id: Uuid,
    /// Amount in whole KES.
    pub amount_kes: i64,
    /// Payment lifecycle status.
    pub status: PaymentStatus,
    /// Subscriber number the push was sent to.
    pub phone_number: PhoneNumber,
    /// Daraja checkout request id used for reconciliation.
    pub checkout_request_id: String,
    /// M-PESA receipt number, present once completed.
    pub receipt_number: Option<String>,
    /// Settlement time (success or failure).
    pub completed_at: Option<DateTime<Utc>>,
    /// Record creation time.
    pub created_at: DateTime<Utc>,
}

/// Parsed result of a Daraja `stkCallback` envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    /// Checkout request id issued when the push was initiated.
    pub checkout_request_id: String,
    /// Daraja result code; zero is success.
    pub result_code: i64,
    /// Human-readable result description.
    pub result_description: String,
    /// M-PESA receipt number, present on success.
    pub receipt_number: Option<String>,
}

impl PaymentOutcome {
    /// Whether the provider reported success.
    pub fn is_success(&self) -> bool {
        self.result_code == RESULT_CODE_SUCCESS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0, true)]
    #[case(1032, false)]
    #[case(-1, false)]
    fn only_code_zero_succeeds(#[case] code: i64, #[case] expected: bool) {
        let outcome = PaymentOutcome {
            checkout_request_id: "ws_CO_1".to_owned(),
            result_code: code,
            result_description: "desc".to_owned(),
            receipt_number: None,
        };
        assert_eq!(outcome.is_success(), expected);
    }

    #[rstest]
    fn payment_status_round_trips() {
        for status in [
            PaymentStatus::Pending,
            PaymentStatus::Completed,
            PaymentStatus::Failed,
        ] {
            assert_eq!(
                status.as_str().parse::<PaymentStatus>().expect("round trip"),
                status
            );
        }
    }
}
