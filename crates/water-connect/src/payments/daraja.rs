//! Reqwest-backed Safaricom Daraja adapter for Lipa na M-Pesa Online.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use chrono::{FixedOffset, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::gateway::{PaymentError, PaymentGateway, StkPushRequest, StkPushResponse};
use crate::config::MpesaCredentials;

const TOKEN_PATH: &str = "/oauth/v1/generate?grant_type=client_credentials";
const STK_PUSH_PATH: &str = "/mpesa/stkpush/v1/processrequest";
const EAST_AFRICA_OFFSET_SECS: i32 = 3 * 3600;

pub struct DarajaClient {
    client: Client,
    base_url: String,
    shortcode: String,
    credentials: MpesaCredentials,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(rename = "errorMessage")]
    error_message: String,
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ProcessRequest<'a> {
    business_short_code: &'a str,
    password: String,
    timestamp: &'a str,
    transaction_type: &'static str,
    amount: u64,
    party_a: &'a str,
    party_b: &'a str,
    phone_number: &'a str,
    #[serde(rename = "CallBackURL")]
    callback_url: &'a str,
    account_reference: &'a str,
    transaction_desc: &'a str,
}

impl DarajaClient {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        base_url: impl Into<String>,
        shortcode: impl Into<String>,
        credentials: MpesaCredentials,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            shortcode: shortcode.into(),
            credentials,
        })
    }

    /// `base64(shortcode + passkey + timestamp)` as the STK push password.
    pub(crate) fn password(&self, timestamp: &str) -> String {
        let raw = format!("{}{}{}", self.shortcode, self.credentials.passkey, timestamp);
        base64::engine::general_purpose::STANDARD.encode(raw)
    }

    async fn access_token(&self) -> Result<String, PaymentError> {
        let response = self
            .client
            .get(format!("{}{TOKEN_PATH}", self.base_url))
            .basic_auth(
                &self.credentials.consumer_key,
                Some(&self.credentials.consumer_secret),
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaymentError::Rejected(format!(
                "token request failed with status {status}"
            )));
        }
        let token: TokenResponse = response
            .json()
            .await
            .map_err(|err| PaymentError::Decode(err.to_string()))?;
        Ok(token.access_token)
    }
}

/// Daraja expects Nairobi local time in `YYYYMMDDHHMMSS` form.
fn timestamp_now() -> String {
    let now = Utc::now();
    match FixedOffset::east_opt(EAST_AFRICA_OFFSET_SECS) {
        Some(offset) => now.with_timezone(&offset).format("%Y%m%d%H%M%S").to_string(),
        None => now.format("%Y%m%d%H%M%S").to_string(),
    }
}

#[async_trait]
impl PaymentGateway for DarajaClient {
    async fn stk_push(&self, request: StkPushRequest) -> Result<StkPushResponse, PaymentError> {
        let token = self.access_token().await?;
        let timestamp = timestamp_now();
        let body = ProcessRequest {
            business_short_code: &self.shortcode,
            password: self.password(&timestamp),
            timestamp: &timestamp,
            transaction_type: "CustomerPayBillOnline",
            amount: request.amount,
            party_a: &request.phone_number,
            party_b: &self.shortcode,
            phone_number: &request.phone_number,
            callback_url: &self.credentials.callback_url,
            account_reference: &request.account_reference,
            transaction_desc: &request.description,
        };

        tracing::debug!(
            phone = %request.phone_number,
            amount = request.amount,
            "sending STK push"
        );
        let response = self
            .client
            .post(format!("{}{STK_PUSH_PATH}", self.base_url))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let bytes = response.bytes().await?;
        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorResponse>(&bytes)
                .map(|err| err.error_message)
                .unwrap_or_else(|_| format!("gateway returned status {status}"));
            return Err(PaymentError::Rejected(message));
        }
        serde_json::from_slice(&bytes).map_err(|err| PaymentError::Decode(err.to_string()))
    }
}
