use rust_decimal::Decimal;
use serde::Deserialize;

use super::domain::{ClickKind, OrderStatus};
use crate::forms::{
    coordinate, non_negative_amount, optional_text, required_text, FieldErrors, REQUIRED,
};

const NAME_MAX: usize = 100;
const PHONE_MAX: usize = 15;
const TEXT_MAX: usize = 2_000;
const RATE_DIGITS: u32 = 6;
/// Jerrycans per order.
const MAX_QUANTITY: u32 = 1_000;
const NEGATIVE: &str = "Ensure this value is greater than or equal to 0.";

/// Vendor sign-up and self-service edits.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct VendorForm {
    pub business_name: Option<String>,
    pub phone_number: Option<String>,
    pub location_name: Option<String>,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub price_per_20l: Option<Decimal>,
    pub delivery_fee: Option<Decimal>,
    pub is_open: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VendorInput {
    pub business_name: String,
    pub phone_number: String,
    pub location_name: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub price_per_20l: Decimal,
    pub delivery_fee: Decimal,
    pub is_open: bool,
}

impl VendorForm {
    pub fn clean(&self) -> Result<VendorInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let business_name = required_text(
            &mut errors,
            "business_name",
            self.business_name.as_deref(),
            NAME_MAX,
        );
        let phone_number = required_text(
            &mut errors,
            "phone_number",
            self.phone_number.as_deref(),
            PHONE_MAX,
        );
        let location_name = required_text(
            &mut errors,
            "location_name",
            self.location_name.as_deref(),
            NAME_MAX,
        );
        let latitude = coordinate(&mut errors, "latitude", self.latitude, 90);
        let longitude = coordinate(&mut errors, "longitude", self.longitude, 180);
        let price_per_20l = non_negative_amount(
            &mut errors,
            "price_per_20l",
            self.price_per_20l.unwrap_or(Decimal::new(5000, 2)),
            RATE_DIGITS,
            NEGATIVE,
        );
        let delivery_fee = non_negative_amount(
            &mut errors,
            "delivery_fee",
            self.delivery_fee.unwrap_or(Decimal::ZERO),
            RATE_DIGITS,
            NEGATIVE,
        );

        errors.finish(|| VendorInput {
            business_name,
            phone_number,
            location_name,
            latitude,
            longitude,
            price_per_20l,
            delivery_fee,
            is_open: self.is_open.unwrap_or(true),
        })
    }
}

/// Delivery request placed with a vendor.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct OrderForm {
    pub quantity: Option<u32>,
    pub delivery_address: Option<String>,
    pub customer_phone: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderInput {
    pub quantity: u32,
    pub delivery_address: String,
    pub customer_phone: String,
}

impl OrderForm {
    pub fn clean(&self) -> Result<OrderInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let quantity = self.quantity.unwrap_or(1);
        if quantity < 1 {
            errors.add("quantity", "Ensure this value is greater than or equal to 1.");
        } else if quantity > MAX_QUANTITY {
            errors.add(
                "quantity",
                format!("Ensure this value is less than or equal to {MAX_QUANTITY}."),
            );
        }
        let delivery_address = required_text(
            &mut errors,
            "delivery_address",
            self.delivery_address.as_deref(),
            TEXT_MAX,
        );
        let customer_phone = required_text(
            &mut errors,
            "customer_phone",
            self.customer_phone.as_deref(),
            PHONE_MAX,
        );

        errors.finish(|| OrderInput {
            quantity,
            delivery_address,
            customer_phone,
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReviewForm {
    pub rating: Option<u8>,
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInput {
    pub rating: u8,
    pub comment: String,
}

impl ReviewForm {
    pub fn clean(&self) -> Result<ReviewInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        let rating = match self.rating {
            None => {
                errors.add("rating", REQUIRED);
                0
            }
            Some(rating @ 1..=5) => rating,
            Some(_) => {
                errors.add("rating", "Rating must be between 1 and 5.");
                0
            }
        };
        let comment = optional_text(&mut errors, "comment", self.comment.as_deref(), TEXT_MAX);

        errors.finish(|| ReviewInput { rating, comment })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ClickForm {
    pub kind: ClickKind,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OrderStatusForm {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct VerificationForm {
    pub is_verified: bool,
}
