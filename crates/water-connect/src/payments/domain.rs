use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::AccountId;
use crate::marketplace::{OrderId, VendorId};

record_id!(
    /// Identifier wrapper for recorded STK push transactions.
    TransactionId
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentPurpose {
    VendorPayment,
    Donation,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

/// STK push accepted by the gateway, keyed by its checkout reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MpesaTransaction {
    pub id: TransactionId,
    pub phone_number: String,
    pub amount: u64,
    pub purpose: PaymentPurpose,
    pub vendor_id: Option<VendorId>,
    pub order_id: Option<OrderId>,
    pub initiated_by: Option<AccountId>,
    pub status: TransactionStatus,
    pub checkout_request_id: String,
    pub receipt_number: Option<String>,
    pub result_description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub phone_number: String,
    pub amount: u64,
    pub purpose: PaymentPurpose,
    pub vendor_id: Option<VendorId>,
    pub order_id: Option<OrderId>,
    pub initiated_by: Option<AccountId>,
    pub checkout_request_id: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("'{0}' is not a valid Kenyan mobile number")]
pub struct InvalidPhoneNumber(pub String);

/// Canonical `2547XXXXXXXX` form required by the gateway.
///
/// Accepts `07…`/`01…`, `+254…`, and `254…`, ignoring spaces and dashes.
pub fn normalize_phone(raw: &str) -> Result<String, InvalidPhoneNumber> {
    let compact: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();

    let canonical = if let Some(rest) = compact.strip_prefix('0') {
        format!("254{rest}")
    } else if let Some(rest) = compact.strip_prefix('+') {
        rest.to_string()
    } else {
        compact
    };

    let subscriber = canonical.strip_prefix("254").unwrap_or_default();
    let valid = subscriber.len() == 9 && subscriber.chars().all(|c| c.is_ascii_digit());
    if valid {
        Ok(canonical)
    } else {
        Err(InvalidPhoneNumber(raw.to_string()))
    }
}
