//! Port for the mobile-money STK-push provider.

use async_trait::async_trait;

use crate::domain::phone::PhoneNumber;

use super::macros::define_port_error;

define_port_error! {
    /// Errors raised by payment gateway adapters.
    pub enum PaymentGatewayError {
        /// Credentials are missing or malformed.
        Configuration { message: String } =>
            "payment gateway configuration error: {message}",
        /// The provider could not be reached.
        Transport { message: String } =>
            "payment gateway transport error: {message}",
        /// The provider answered with an error status.
        Provider { message: String } =>
            "payment gateway rejected the request: {message}",
        /// The provider's response could not be decoded.
        Decode { message: String } =>
            "payment gateway response could not be decoded: {message}",
    }
}

/// Request to prompt a subscriber for a payment.
#[derive(Debug, Clone)]
pub struct StkPushRequest {
    /// Subscriber to prompt.
    pub phone_number: PhoneNumber,
    /// Amount in whole KES.
    pub amount_kes: i64,
    /// Account reference shown on the prompt (truncated to 12 chars).
    pub account_reference: String,
    /// Transaction description (truncated to 13 chars).
    pub description: String,
}

/// Provider acknowledgement of an initiated push.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StkPushAcknowledgement {
    /// Provider-side merchant request id.
    pub merchant_request_id: String,
    /// Checkout request id used to reconcile the callback.
    pub checkout_request_id: String,
}

/// Result of a transaction-status query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionStatus {
    /// Whether the provider reports the transaction as successful.
    pub success: bool,
    /// Raw provider result code.
    pub result_code: String,
    /// Human-readable result description.
    pub result_description: String,
    /// Checkout request id the status refers to.
    pub checkout_request_id: String,
}

/// Port for the STK-push provider.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Send an STK push to the subscriber's handset.
    async fn initiate_stk_push(
        &self,
        request: &StkPushRequest,
    ) -> Result<StkPushAcknowledgement, PaymentGatewayError>;

    /// Query the status of an earlier push.
    async fn transaction_status(
        &self,
        checkout_request_id: &str,
    ) -> Result<TransactionStatus, PaymentGatewayError>;
}

/// Gateway used when no provider credentials are configured.
///
/// Every call fails with a configuration error, which the services surface
/// as 503 so paid flows stay visibly broken rather than silently succeeding.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredPaymentGateway;

#[async_trait]
impl PaymentGateway for UnconfiguredPaymentGateway {
    async fn initiate_stk_push(
        &self,
        _request: &StkPushRequest,
    ) -> Result<StkPushAcknowledgement, PaymentGatewayError> {
        Err(PaymentGatewayError::configuration(
            "payment provider credentials are not configured",
        ))
    }

    async fn transaction_status(
        &self,
        _checkout_request_id: &str,
    ) -> Result<TransactionStatus, PaymentGatewayError> {
        Err(PaymentGatewayError::configuration(
            "payment provider credentials are not configured",
        ))
    }
}
