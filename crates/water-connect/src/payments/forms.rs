use serde::Deserialize;

use super::domain::normalize_phone;
use crate::forms::{FieldErrors, REQUIRED};

const MIN_AMOUNT: &str = "Ensure this value is greater than or equal to 1.";

/// Phone override when paying for an order; defaults to the order's contact.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PayOrderForm {
    pub phone: Option<String>,
}

impl PayOrderForm {
    pub fn clean(&self, fallback: &str) -> Result<String, FieldErrors> {
        let raw = self
            .phone
            .as_deref()
            .map(str::trim)
            .filter(|phone| !phone.is_empty())
            .unwrap_or(fallback);
        let mut errors = FieldErrors::new();
        let phone = clean_phone(&mut errors, raw);
        errors.finish(|| phone)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DonationForm {
    pub phone: Option<String>,
    pub amount: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonationInput {
    pub phone: String,
    pub amount: u64,
}

impl DonationForm {
    pub fn clean(&self) -> Result<DonationInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let phone = match self.phone.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => clean_phone(&mut errors, raw),
            _ => {
                errors.add("phone", REQUIRED);
                String::new()
            }
        };
        let amount = match self.amount {
            Some(0) => {
                errors.add("amount", MIN_AMOUNT);
                0
            }
            Some(amount) => amount,
            None => {
                errors.add("amount", REQUIRED);
                0
            }
        };
        errors.finish(|| DonationInput { phone, amount })
    }
}

fn clean_phone(errors: &mut FieldErrors, raw: &str) -> String {
    match normalize_phone(raw) {
        Ok(phone) => phone,
        Err(err) => {
            errors.add("phone", err.to_string());
            String::new()
        }
    }
}
