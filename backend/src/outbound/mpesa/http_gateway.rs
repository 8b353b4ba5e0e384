//! Reqwest-backed Daraja STK-push gateway adapter.
//!
//! Owns transport detail only: the OAuth token dance (with expiry-aware
//! caching), request signing, and response decoding. Everything the rest of
//! the system sees goes through the [`PaymentGateway`] port.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, Url};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::domain::ports::{
    PaymentGateway, PaymentGatewayError, StkPushAcknowledgement, StkPushRequest,
    TransactionStatus,
};

use super::dto::{
    StatusRequestDto, StatusResponseDto, StkPushRequestDto, StkPushResponseDto, TokenResponseDto,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
const TRANSACTION_TYPE: &str = "CustomerPayBillOnline";
const ACCOUNT_REFERENCE_LIMIT: usize = 12;
const DESCRIPTION_LIMIT: usize = 13;

/// Safety margin subtracted from the provider's token lifetime.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);

/// Credentials and endpoints for the Daraja sandbox or production API.
#[derive(Debug, Clone)]
pub struct MpesaConfig {
    /// OAuth consumer key.
    pub consumer_key: String,
    /// OAuth consumer secret.
    pub consumer_secret: String,
    /// STK password passkey issued with the shortcode.
    pub passkey: String,
    /// Business shortcode (paybill).
    pub shortcode: String,
    /// Publicly reachable callback URL for settlement results.
    pub callback_url: String,
    /// API base, e.g. `https://sandbox.safaricom.co.ke`.
    pub base_url: Url,
}

impl MpesaConfig {
    /// Validate that every credential is present.
    ///
    /// # Errors
    /// Returns a configuration error naming the missing field.
    pub fn validate(&self) -> Result<(), PaymentGatewayError> {
        for (value, field) in [
            (&self.consumer_key, "consumer key"),
            (&self.consumer_secret, "consumer secret"),
            (&self.passkey, "passkey"),
            (&self.shortcode, "shortcode"),
            (&self.callback_url, "callback url"),
        ] {
            if value.trim().is_empty() {
                return Err(PaymentGatewayError::configuration(format!(
                    "missing {field}"
                )));
            }
        }
        Ok(())
    }
}

struct CachedToken {
    token: String,
    expires_at: Instant,
}

/// Daraja gateway speaking HTTP via reqwest.
pub struct MpesaHttpGateway {
    client: Client,
    config: MpesaConfig,
    token: Mutex<Option<CachedToken>>,
}

impl MpesaHttpGateway {
    /// Build a gateway with the default request timeout.
    ///
    /// # Errors
    /// Returns a configuration error for missing credentials or a transport
    /// error when the reqwest client cannot be constructed.
    pub fn new(config: MpesaConfig) -> Result<Self, PaymentGatewayError> {
        config.validate()?;
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;
        Ok(Self {
            client,
            config,
            token: Mutex::new(None),
        })
    }

    async fn access_token(&self) -> Result<String, PaymentGatewayError> {
        let mut cached = self.token.lock().await;
        if let Some(entry) = cached.as_ref() {
            if Instant::now() < entry.expires_at {
                return Ok(entry.token.clone());
            }
        }

        let url = self
            .config
            .base_url
            .join("/oauth/v1/generate?grant_type=client_credentials")
            .map_err(|err| PaymentGatewayError::configuration(err.to_string()))?;
        let basic = BASE64.encode(format!(
            "{}:{}",
            self.config.consumer_key, self.config.consumer_secret
        ));

        debug!("requesting daraja access token");
        let response = self
            .client
            .get(url)
            .header(reqwest::header::AUTHORIZATION, format!("Basic {basic}"))
            .send()
            .await
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(provider_error(status, body.as_ref()));
        }

        let dto: TokenResponseDto = serde_json::from_slice(body.as_ref())
            .map_err(|err| PaymentGatewayError::decode(err.to_string()))?;
        let token = dto.access_token.ok_or_else(|| {
            PaymentGatewayError::decode("token response carried no access_token")
        })?;
        let lifetime = dto
            .expires_in
            .as_deref()
            .and_then(|seconds| seconds.parse::<u64>().ok())
            .map_or(Duration::from_secs(3599), Duration::from_secs);

        *cached = Some(CachedToken {
            token: token.clone(),
            expires_at: Instant::now() + lifetime.saturating_sub(TOKEN_EXPIRY_MARGIN),
        });
        Ok(token)
    }
}

fn provider_error(status: StatusCode, body: &[u8]) -> PaymentGatewayError {
    let snippet = String::from_utf8_lossy(body);
    let snippet = snippet.trim();
    let truncated: String = snippet.chars().take(200).collect();
    warn!(%status, body = %truncated, "daraja request rejected");
    PaymentGatewayError::provider(format!("{status}: {truncated}"))
}

/// Daraja timestamp format: `YYYYMMDDHHmmss` in UTC.
fn format_timestamp(at: DateTime<Utc>) -> String {
    at.format("%Y%m%d%H%M%S").to_string()
}

/// Left-pad the shortcode to six digits.
fn pad_shortcode(shortcode: &str) -> String {
    format!("{shortcode:0>6}")
}

/// STK password: base64 of shortcode + passkey + timestamp.
fn stk_password(shortcode: &str, passkey: &str, timestamp: &str) -> String {
    BASE64.encode(format!("{shortcode}{passkey}{timestamp}"))
}

fn truncate(value: &str, limit: usize) -> &str {
    match value.char_indices().nth(limit) {
        Some((index, _)) => &value[..index],
        None => value,
    }
}

#[async_trait]
impl PaymentGateway for MpesaHttpGateway {
    async fn initiate_stk_push(
        &self,
        request: &StkPushRequest,
    ) -> Result<StkPushAcknowledgement, PaymentGatewayError> {
        let token = self.access_token().await?;
        let timestamp = format_timestamp(Utc::now());
        let shortcode = pad_shortcode(&self.config.shortcode);
        let password = stk_password(&shortcode, &self.config.passkey, &timestamp);

        let payload = StkPushRequestDto {
            business_short_code: &shortcode,
            password: &password,
            timestamp: &timestamp,
            transaction_type: TRANSACTION_TYPE,
            amount: request.amount_kes,
            party_a: request.phone_number.as_str(),
            party_b: &shortcode,
            phone_number: request.phone_number.as_str(),
            callback_url: &self.config.callback_url,
            account_reference: truncate(&request.account_reference, ACCOUNT_REFERENCE_LIMIT),
            transaction_desc: truncate(&request.description, DESCRIPTION_LIMIT),
        };

        let url = self
            .config
            .base_url
            .join("/mpesa/stkpush/v1/processrequest")
            .map_err(|err| PaymentGatewayError::configuration(err.to_string()))?;

        debug!(
            amount = request.amount_kes,
            reference = payload.account_reference,
            "initiating stk push"
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(provider_error(status, body.as_ref()));
        }

        let dto: StkPushResponseDto = serde_json::from_slice(body.as_ref())
            .map_err(|err| PaymentGatewayError::decode(err.to_string()))?;
        let checkout_request_id = dto.checkout_request_id.ok_or_else(|| {
            PaymentGatewayError::decode(format!(
                "push response carried no CheckoutRequestID: {}",
                dto.response_description.unwrap_or_default()
            ))
        })?;

        Ok(StkPushAcknowledgement {
            merchant_request_id: dto.merchant_request_id.unwrap_or_default(),
            checkout_request_id,
        })
    }

    async fn transaction_status(
        &self,
        checkout_request_id: &str,
    ) -> Result<TransactionStatus, PaymentGatewayError> {
        let token = self.access_token().await?;
        let timestamp = format_timestamp(Utc::now());
        let shortcode = pad_shortcode(&self.config.shortcode);
        let password = stk_password(&shortcode, &self.config.passkey, &timestamp);

        let payload = StatusRequestDto {
            business_short_code: &shortcode,
            password: &password,
            timestamp: &timestamp,
            checkout_request_id,
        };

        let url = self
            .config
            .base_url
            .join("/mpesa/stkpushquery/v1/query")
            .map_err(|err| PaymentGatewayError::configuration(err.to_string()))?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|err| PaymentGatewayError::transport(err.to_string()))?;
        if !status.is_success() {
            return Err(provider_error(status, body.as_ref()));
        }

        let dto: StatusResponseDto = serde_json::from_slice(body.as_ref())
            .map_err(|err| PaymentGatewayError::decode(err.to_string()))?;
        let result_code = dto.result_code.unwrap_or_default();

        Ok(TransactionStatus {
            success: result_code == "0",
            result_code,
            result_description: dto.result_desc.unwrap_or_default(),
            checkout_request_id: dto
                .checkout_request_id
                .unwrap_or_else(|| checkout_request_id.to_owned()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn config() -> MpesaConfig {
        MpesaConfig {
            consumer_key: "key".to_owned(),
            consumer_secret: "secret".to_owned(),
            passkey: "passkey".to_owned(),
            shortcode: "174379".to_owned(),
            callback_url: "https://app.example/api/v1/payments/mpesa/callback".to_owned(),
            base_url: Url::parse("https://sandbox.safaricom.co.ke").expect("valid url"),
        }
    }

    #[rstest]
    fn timestamp_uses_daraja_format() {
        let at = Utc.with_ymd_and_hms(2026, 8, 7, 9, 5, 3).single().expect("valid time");
        assert_eq!(format_timestamp(at), "20260807090503");
    }

    #[rstest]
    #[case("174379", "174379")]
    #[case("1234", "001234")]
    fn shortcodes_pad_to_six_digits(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(pad_shortcode(raw), expected);
    }

    #[rstest]
    fn password_is_base64_of_concatenation() {
        let password = stk_password("174379", "passkey", "20260807090503");
        let decoded = BASE64.decode(password).expect("valid base64");
        assert_eq!(decoded, b"174379passkey20260807090503");
    }

    #[rstest]
    #[case("SUBSCRIPTION-PRO-PLAN", 12, "SUBSCRIPTION")]
    #[case("short", 12, "short")]
    fn references_truncate_to_limit(
        #[case] raw: &str,
        #[case] limit: usize,
        #[case] expected: &str,
    ) {
        assert_eq!(truncate(raw, limit), expected);
    }

    #[rstest]
    fn missing_credentials_fail_validation() {
        let mut bad = config();
        bad.passkey = String::new();
        let err = bad.validate().expect_err("empty passkey rejected");
        assert!(err.to_string().contains("passkey"));
    }

    #[rstest]
    fn gateway_builds_with_complete_config() {
        assert!(MpesaHttpGateway::new(config()).is_ok());
    }
}
