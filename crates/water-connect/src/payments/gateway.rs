use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// STK push prompt to send to a customer's phone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StkPushRequest {
    pub phone_number: String,
    pub amount: u64,
    pub account_reference: String,
    pub description: String,
}

/// Gateway acknowledgement. `response_code == "0"` means the prompt was sent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StkPushResponse {
    #[serde(rename = "ResponseCode")]
    pub response_code: String,
    #[serde(rename = "ResponseDescription", default)]
    pub response_description: String,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: Option<String>,
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: Option<String>,
    #[serde(rename = "CustomerMessage", default)]
    pub customer_message: Option<String>,
}

impl StkPushResponse {
    /// Checkout reference when the gateway accepted the push.
    pub fn accepted_reference(&self) -> Option<&str> {
        if self.response_code == "0" {
            self.checkout_request_id.as_deref()
        } else {
            None
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("M-Pesa is not configured")]
    NotConfigured,
    #[error("{0}")]
    Transport(String),
    #[error("{0}")]
    Rejected(String),
    #[error("unexpected gateway response: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for PaymentError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(value.to_string())
    }
}

/// Mobile-money push payment port.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn stk_push(&self, request: StkPushRequest) -> Result<StkPushResponse, PaymentError>;
}

/// Stand-in used when no M-Pesa credentials are configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn stk_push(&self, _request: StkPushRequest) -> Result<StkPushResponse, PaymentError> {
        Err(PaymentError::NotConfigured)
    }
}
