//! Payment webhook handler.
//!
//! ```text
//! POST /api/v1/payments/mpesa/callback
//! ```
//!
//! The callback is unauthenticated (Daraja calls it directly); the checkout
//! request id is the only correlation handle, and settlement is idempotent on
//! the payment status, so replays and stray posts are harmless.

use actix_web::{HttpResponse, post, web};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use crate::domain::Error;
use crate::domain::payment::PaymentOutcome;
use crate::inbound::http::ApiResult;
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, missing_field_error};

/// Daraja callback envelope: `{ "Body": { "stkCallback": { ... } } }`.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CallbackEnvelopeBody {
    /// Outer body wrapper.
    #[serde(rename = "Body")]
    pub body: CallbackBody,
}

/// Inner body carrying the callback record.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CallbackBody {
    /// The STK callback record.
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallbackBody,
}

/// The STK callback payload.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct StkCallbackBody {
    /// Provider-side merchant request id.
    #[serde(rename = "MerchantRequestID")]
    pub merchant_request_id: Option<String>,
    /// Checkout request id issued at initiation.
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: Option<String>,
    /// Result code; zero is success.
    pub result_code: i64,
    /// Human-readable result description.
    pub result_desc: Option<String>,
    /// Metadata items, present on success.
    pub callback_metadata: Option<CallbackMetadataBody>,
}

/// Metadata item list.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackMetadataBody {
    /// Name/value metadata entries.
    pub item: Vec<CallbackItemBody>,
}

/// One metadata entry; values arrive as strings or numbers.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CallbackItemBody {
    /// Entry name, e.g. `MpesaReceiptNumber`.
    pub name: String,
    /// Entry value; absent for some entries.
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

fn receipt_number(metadata: Option<&CallbackMetadataBody>) -> Option<String> {
    metadata?
        .item
        .iter()
        .find(|item| item.name == "MpesaReceiptNumber")
        .and_then(|item| item.value.as_ref())
        .map(|value| match value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        })
}

impl TryFrom<CallbackEnvelopeBody> for PaymentOutcome {
    type Error = Error;

    fn try_from(envelope: CallbackEnvelopeBody) -> Result<Self, Self::Error> {
        let callback = envelope.body.stk_callback;
        let checkout_request_id = callback
            .checkout_request_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| missing_field_error(FieldName::new("CheckoutRequestID")))?;

        Ok(PaymentOutcome {
            receipt_number: receipt_number(callback.callback_metadata.as_ref()),
            checkout_request_id,
            result_code: callback.result_code,
            result_description: callback.result_desc.unwrap_or_default(),
        })
    }
}

/// Settle an STK-push result.
#[utoipa::path(
    post,
    path = "/api/v1/payments/mpesa/callback",
    request_body = CallbackEnvelopeBody,
    responses(
        (status = 200, description = "Callback processed"),
        (status = 400, description = "Malformed callback", body = Error),
        (status = 404, description = "Unknown checkout request", body = Error)
    ),
    tags = ["payments"],
    operation_id = "mpesaCallback",
    security([])
)]
#[post("/payments/mpesa/callback")]
pub async fn mpesa_callback(
    state: web::Data<HttpState>,
    payload: web::Json<CallbackEnvelopeBody>,
) -> ApiResult<HttpResponse> {
    let outcome = PaymentOutcome::try_from(payload.into_inner())?;
    state.payments.process_callback(outcome).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[cfg(test)]
#[path = "payments_tests.rs"]
mod tests;
