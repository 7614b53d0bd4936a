use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::accounts::AccountId;

record_id!(
    /// Identifier wrapper for vendor businesses.
    VendorId
);
record_id!(
    /// Identifier wrapper for delivery orders.
    OrderId
);
record_id!(ReviewId);
record_id!(ClickId);

/// Commercial water seller, owned by exactly one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterVendor {
    pub id: VendorId,
    pub owner: AccountId,
    pub business_name: String,
    pub phone_number: String,
    pub location_name: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub is_open: bool,
    pub is_verified: bool,
    pub price_per_20l: Decimal,
    pub delivery_fee: Decimal,
    pub created_at: DateTime<Utc>,
}

impl WaterVendor {
    /// Vendors appear on the map and public listings only when open and verified.
    pub const fn is_public(&self) -> bool {
        self.is_open && self.is_verified
    }

    /// International form of the phone number for `wa.me` links.
    pub fn whatsapp_number(&self) -> String {
        let digits: String = self
            .phone_number
            .trim()
            .chars()
            .filter(|c| !matches!(c, '+' | ' ' | '-'))
            .collect();

        match digits.strip_prefix('0') {
            Some(rest) => format!("254{rest}"),
            None => digits,
        }
    }

    pub fn coordinates(&self) -> Option<(Decimal, Decimal)> {
        Some((self.latitude?, self.longitude?))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVendor {
    pub owner: AccountId,
    pub business_name: String,
    pub phone_number: String,
    pub location_name: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub is_open: bool,
    pub price_per_20l: Decimal,
    pub delivery_fee: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Pending,
    Accepted,
    Delivering,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::Pending,
            Self::Accepted,
            Self::Delivering,
            Self::Completed,
            Self::Cancelled,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Accepted => "Accepted",
            Self::Delivering => "Out for Delivery",
            Self::Completed => "Delivered",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Delivered and cancelled orders no longer change.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    const fn stage(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::Accepted => 1,
            Self::Delivering => 2,
            Self::Completed | Self::Cancelled => 3,
        }
    }

    /// Orders only move forward; stages may be skipped and any open order can be cancelled.
    pub const fn can_move_to(self, next: Self) -> bool {
        !self.is_terminal() && next.stage() > self.stage()
    }
}

/// Delivery order placed by a customer with one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaterOrder {
    pub id: OrderId,
    pub customer: AccountId,
    pub vendor_id: VendorId,
    pub quantity: u32,
    pub total_cost: Decimal,
    pub delivery_address: String,
    pub customer_phone: String,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WaterOrder {
    /// Re-prices the order from the vendor's current rates.
    pub fn recompute_total(&mut self, vendor: &WaterVendor) -> Result<(), TotalOutOfRange> {
        self.total_cost = order_total(vendor.price_per_20l, vendor.delivery_fee, self.quantity)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub customer: AccountId,
    pub vendor_id: VendorId,
    pub quantity: u32,
    pub delivery_address: String,
    pub customer_phone: String,
    pub created_at: DateTime<Utc>,
}

/// Raised when an order would cost more than a stored total can hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("order total exceeds 99999999.99")]
pub struct TotalOutOfRange;

/// Totals keep ten digits, two of them after the point.
fn max_order_total() -> Decimal {
    Decimal::new(9_999_999_999, 2)
}

/// `price_per_20l * quantity + delivery_fee`, kept to two decimal places.
pub fn order_total(
    price_per_20l: Decimal,
    delivery_fee: Decimal,
    quantity: u32,
) -> Result<Decimal, TotalOutOfRange> {
    let total = price_per_20l
        .checked_mul(Decimal::from(quantity))
        .and_then(|items| items.checked_add(delivery_fee))
        .ok_or(TotalOutOfRange)?
        .round_dp(2);
    if total > max_order_total() {
        return Err(TotalOutOfRange);
    }
    Ok(total)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorReview {
    pub id: ReviewId,
    pub vendor_id: VendorId,
    pub reviewer: AccountId,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub vendor_id: VendorId,
    pub reviewer: AccountId,
    pub rating: u8,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

/// Mean rating rounded to one decimal, `None` without reviews.
pub fn average_rating(reviews: &[VendorReview]) -> Option<Decimal> {
    if reviews.is_empty() {
        return None;
    }
    let sum: u32 = reviews.iter().map(|review| u32::from(review.rating)).sum();
    let count = u32::try_from(reviews.len()).ok()?;
    Some((Decimal::from(sum) / Decimal::from(count)).round_dp(1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClickKind {
    ProfileView,
    Call,
    Whatsapp,
}

impl ClickKind {
    pub const fn ordered() -> [Self; 3] {
        [Self::ProfileView, Self::Call, Self::Whatsapp]
    }
}

/// One customer interaction with a vendor listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorClickLog {
    pub id: ClickId,
    pub vendor_id: VendorId,
    pub kind: ClickKind,
    pub clicked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClick {
    pub vendor_id: VendorId,
    pub kind: ClickKind,
    pub clicked_at: DateTime<Utc>,
}

/// Public card for a vendor in listings.
#[derive(Debug, Clone, Serialize)]
pub struct VendorListing {
    pub id: VendorId,
    pub business_name: String,
    pub phone_number: String,
    pub whatsapp_number: String,
    pub location_name: String,
    pub latitude: Option<Decimal>,
    pub longitude: Option<Decimal>,
    pub price_per_20l: Decimal,
    pub delivery_fee: Decimal,
    pub average_rating: Option<Decimal>,
    pub review_count: usize,
}

impl VendorListing {
    pub fn new(vendor: &WaterVendor, reviews: &[VendorReview]) -> Self {
        Self {
            id: vendor.id,
            business_name: vendor.business_name.clone(),
            phone_number: vendor.phone_number.clone(),
            whatsapp_number: vendor.whatsapp_number(),
            location_name: vendor.location_name.clone(),
            latitude: vendor.latitude,
            longitude: vendor.longitude,
            price_per_20l: vendor.price_per_20l,
            delivery_fee: vendor.delivery_fee,
            average_rating: average_rating(reviews),
            review_count: reviews.len(),
        }
    }
}

/// Public profile page: listing plus the individual reviews, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct VendorProfile {
    #[serde(flatten)]
    pub listing: VendorListing,
    pub reviews: Vec<VendorReview>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor(phone: &str) -> WaterVendor {
        WaterVendor {
            id: VendorId(1),
            owner: AccountId(1),
            business_name: "Maji Safi Deliveries".to_string(),
            phone_number: phone.to_string(),
            location_name: "Kasarani, Near Naivas".to_string(),
            latitude: None,
            longitude: None,
            is_open: true,
            is_verified: false,
            price_per_20l: Decimal::new(5000, 2),
            delivery_fee: Decimal::new(10000, 2),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn total_is_price_times_quantity_plus_fee() {
        let total = order_total(Decimal::new(5000, 2), Decimal::new(10000, 2), 3);
        assert_eq!(total, Ok(Decimal::new(25000, 2)));

        let free_delivery = order_total(Decimal::new(4550, 2), Decimal::ZERO, 2);
        assert_eq!(free_delivery, Ok(Decimal::new(9100, 2)));
    }

    #[test]
    fn oversized_totals_are_refused() {
        assert_eq!(order_total(Decimal::MAX, Decimal::ZERO, 2), Err(TotalOutOfRange));
        assert_eq!(
            order_total(Decimal::ZERO, Decimal::MAX, 1),
            Err(TotalOutOfRange)
        );
        assert_eq!(
            order_total(Decimal::new(999_999, 2), Decimal::new(999_999, 2), 1_000),
            Ok(Decimal::new(1_000_998_999, 2))
        );
    }

    #[test]
    fn recompute_uses_current_vendor_rates() {
        let mut supplier = vendor("0712345678");
        let now = Utc::now();
        let mut order = WaterOrder {
            id: OrderId(1),
            customer: AccountId(2),
            vendor_id: supplier.id,
            quantity: 2,
            total_cost: Decimal::ZERO,
            delivery_address: "Gate B".to_string(),
            customer_phone: "0700000000".to_string(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        order.recompute_total(&supplier).expect("in range");
        assert_eq!(order.total_cost, Decimal::new(20000, 2));

        supplier.delivery_fee = Decimal::ZERO;
        order.recompute_total(&supplier).expect("in range");
        assert_eq!(order.total_cost, Decimal::new(10000, 2));
    }

    #[test]
    fn order_status_only_moves_forward() {
        use OrderStatus::*;
        assert!(Pending.can_move_to(Accepted));
        assert!(Pending.can_move_to(Completed));
        assert!(Delivering.can_move_to(Cancelled));
        assert!(!Delivering.can_move_to(Pending));
        assert!(!Accepted.can_move_to(Accepted));
        assert!(!Completed.can_move_to(Cancelled));
        assert!(!Cancelled.can_move_to(Completed));
    }

    #[test]
    fn whatsapp_number_uses_kenyan_prefix() {
        assert_eq!(vendor("0712 345-678").whatsapp_number(), "254712345678");
        assert_eq!(vendor("+254712345678").whatsapp_number(), "254712345678");
        assert_eq!(vendor("254712345678").whatsapp_number(), "254712345678");
    }

    #[test]
    fn public_requires_open_and_verified() {
        let mut supplier = vendor("0712345678");
        assert!(!supplier.is_public());
        supplier.is_verified = true;
        assert!(supplier.is_public());
        supplier.is_open = false;
        assert!(!supplier.is_public());
    }

    #[test]
    fn average_rating_rounds_to_one_decimal() {
        let review = |id: u64, rating: u8| VendorReview {
            id: ReviewId(id),
            vendor_id: VendorId(1),
            reviewer: AccountId(id),
            rating,
            comment: String::new(),
            created_at: Utc::now(),
        };
        assert_eq!(average_rating(&[]), None);
        let reviews = vec![review(1, 5), review(2, 4), review(3, 4)];
        assert_eq!(average_rating(&reviews), Some(Decimal::new(43, 1)));
    }

    #[test]
    fn terminal_statuses() {
        assert!(OrderStatus::Completed.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        assert!(!OrderStatus::Delivering.is_terminal());
        assert_eq!(OrderStatus::Delivering.label(), "Out for Delivery");
    }
}
