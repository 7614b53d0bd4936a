use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;

use super::domain::{
    ClickKind, NewClick, NewOrder, NewReview, NewVendor, OrderId, OrderStatus, VendorClickLog,
    VendorId, VendorListing, VendorProfile, VendorReview, WaterOrder, WaterVendor,
};
use super::forms::{OrderForm, ReviewForm, VendorForm};
use crate::accounts::{require_account, require_staff, AccountId};
use crate::error::ServiceError;
use crate::store::MarketplaceStore;

/// Orders visible to an account: those it placed and those its business received.
#[derive(Debug, Clone, Serialize)]
pub struct MyOrders {
    pub placed: Vec<WaterOrder>,
    pub received: Vec<WaterOrder>,
}

/// Vendor profiles, public listings, reviews, click tracking, and orders.
pub struct MarketplaceService<S> {
    store: Arc<S>,
}

impl<S> MarketplaceService<S>
where
    S: MarketplaceStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// New vendors start unverified and hidden until staff approve them.
    pub fn register_vendor(
        &self,
        actor: Option<AccountId>,
        form: VendorForm,
    ) -> Result<WaterVendor, ServiceError> {
        let owner = require_account(self.store.as_ref(), actor)?;
        let input = form.clean()?;
        let vendor = self.store.insert_vendor(NewVendor {
            owner: owner.id,
            business_name: input.business_name,
            phone_number: input.phone_number,
            location_name: input.location_name,
            latitude: input.latitude,
            longitude: input.longitude,
            is_open: input.is_open,
            price_per_20l: input.price_per_20l,
            delivery_fee: input.delivery_fee,
            created_at: Utc::now(),
        })?;
        tracing::info!(vendor_id = %vendor.id, owner = %owner.id, "vendor registered");
        Ok(vendor)
    }

    pub fn my_vendor(&self, actor: Option<AccountId>) -> Result<WaterVendor, ServiceError> {
        let owner = require_account(self.store.as_ref(), actor)?;
        self.store
            .vendor_for_owner(owner.id)?
            .ok_or_else(|| ServiceError::not_found("vendor profile for account", owner.id.0))
    }

    /// Verification is left as is; only staff change it.
    pub fn update_vendor(
        &self,
        actor: Option<AccountId>,
        form: VendorForm,
    ) -> Result<WaterVendor, ServiceError> {
        let mut vendor = self.my_vendor(actor)?;
        let input = form.clean()?;
        vendor.business_name = input.business_name;
        vendor.phone_number = input.phone_number;
        vendor.location_name = input.location_name;
        vendor.latitude = input.latitude;
        vendor.longitude = input.longitude;
        vendor.price_per_20l = input.price_per_20l;
        vendor.delivery_fee = input.delivery_fee;
        vendor.is_open = input.is_open;

        self.store.update_vendor(vendor.clone())?;
        Ok(vendor)
    }

    pub fn set_verification(
        &self,
        actor: Option<AccountId>,
        vendor_id: VendorId,
        is_verified: bool,
    ) -> Result<WaterVendor, ServiceError> {
        let staff = require_staff(self.store.as_ref(), actor)?;
        let mut vendor = self.fetch_vendor(vendor_id)?;
        vendor.is_verified = is_verified;
        self.store.update_vendor(vendor.clone())?;
        tracing::info!(%vendor_id, is_verified, staff = %staff.id, "vendor verification changed");
        Ok(vendor)
    }

    /// Open and verified vendors by business name.
    pub fn public_vendors(&self) -> Result<Vec<VendorListing>, ServiceError> {
        let mut vendors: Vec<WaterVendor> = self
            .store
            .list_vendors()?
            .into_iter()
            .filter(WaterVendor::is_public)
            .collect();
        vendors.sort_by(|a, b| a.business_name.cmp(&b.business_name).then(a.id.cmp(&b.id)));

        vendors
            .iter()
            .map(|vendor| -> Result<VendorListing, ServiceError> {
                let reviews = self.store.reviews_for_vendor(vendor.id)?;
                Ok(VendorListing::new(vendor, &reviews))
            })
            .collect()
    }

    /// Public profile page; each view is logged for the vendor's analytics.
    pub fn public_profile(&self, vendor_id: VendorId) -> Result<VendorProfile, ServiceError> {
        let vendor = self.public_vendor(vendor_id)?;
        self.store.insert_click(NewClick {
            vendor_id,
            kind: ClickKind::ProfileView,
            clicked_at: Utc::now(),
        })?;

        let mut reviews = self.store.reviews_for_vendor(vendor_id)?;
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(VendorProfile {
            listing: VendorListing::new(&vendor, &reviews),
            reviews,
        })
    }

    pub fn record_click(
        &self,
        vendor_id: VendorId,
        kind: ClickKind,
    ) -> Result<VendorClickLog, ServiceError> {
        self.public_vendor(vendor_id)?;
        let click = self.store.insert_click(NewClick {
            vendor_id,
            kind,
            clicked_at: Utc::now(),
        })?;
        Ok(click)
    }

    /// One review per reviewer and vendor; a repeat replaces the earlier one.
    pub fn review(
        &self,
        actor: Option<AccountId>,
        vendor_id: VendorId,
        form: ReviewForm,
    ) -> Result<VendorReview, ServiceError> {
        let reviewer = require_account(self.store.as_ref(), actor)?;
        let vendor = self.fetch_vendor(vendor_id)?;
        if vendor.owner == reviewer.id {
            return Err(ServiceError::PermissionDenied(
                "You cannot review your own business.",
            ));
        }
        let input = form.clean()?;
        let review = self.store.upsert_review(NewReview {
            vendor_id,
            reviewer: reviewer.id,
            rating: input.rating,
            comment: input.comment,
            created_at: Utc::now(),
        })?;
        Ok(review)
    }

    pub fn place_order(
        &self,
        actor: Option<AccountId>,
        vendor_id: VendorId,
        form: OrderForm,
    ) -> Result<WaterOrder, ServiceError> {
        let customer = require_account(self.store.as_ref(), actor)?;
        let vendor = self.fetch_vendor(vendor_id)?;
        if !vendor.is_public() {
            return Err(ServiceError::Conflict(format!(
                "{} is not accepting orders right now.",
                vendor.business_name
            )));
        }
        let input = form.clean()?;

        let order = self.store.insert_order(NewOrder {
            customer: customer.id,
            vendor_id,
            quantity: input.quantity,
            delivery_address: input.delivery_address,
            customer_phone: input.customer_phone,
            created_at: Utc::now(),
        })?;
        tracing::info!(
            order_id = %order.id,
            %vendor_id,
            customer = %customer.id,
            total = %order.total_cost,
            "order placed"
        );
        Ok(order)
    }

    pub fn my_orders(&self, actor: Option<AccountId>) -> Result<MyOrders, ServiceError> {
        let account = require_account(self.store.as_ref(), actor)?;
        let mut placed = self.store.orders_for_customer(account.id)?;
        let mut received = match self.store.vendor_for_owner(account.id)? {
            Some(vendor) => self.store.orders_for_vendor(vendor.id)?,
            None => Vec::new(),
        };
        newest_first(&mut placed);
        newest_first(&mut received);
        Ok(MyOrders { placed, received })
    }

    /// Only the receiving vendor's owner moves an order, and never out of
    /// a completed or cancelled state.
    pub fn update_order_status(
        &self,
        actor: Option<AccountId>,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<WaterOrder, ServiceError> {
        let account = require_account(self.store.as_ref(), actor)?;
        let mut order = self
            .store
            .fetch_order(order_id)?
            .ok_or_else(|| ServiceError::not_found("order", order_id.0))?;
        let vendor = self.fetch_vendor(order.vendor_id)?;
        if vendor.owner != account.id {
            return Err(ServiceError::PermissionDenied(
                "Only the vendor can update this order.",
            ));
        }
        if order.status.is_terminal() {
            return Err(ServiceError::Conflict(format!(
                "Order #{} is already {}.",
                order.id,
                order.status.label().to_lowercase()
            )));
        }
        if !order.status.can_move_to(status) {
            return Err(ServiceError::Conflict(format!(
                "Order #{} cannot go from {} to {}.",
                order.id,
                order.status.label(),
                status.label()
            )));
        }

        order.status = status;
        order.updated_at = Utc::now();
        let saved = self.store.update_order(order)?;
        tracing::info!(%order_id, status = saved.status.label(), "order status updated");
        Ok(saved)
    }

    fn fetch_vendor(&self, id: VendorId) -> Result<WaterVendor, ServiceError> {
        self.store
            .fetch_vendor(id)?
            .ok_or_else(|| ServiceError::not_found("vendor", id.0))
    }

    fn public_vendor(&self, id: VendorId) -> Result<WaterVendor, ServiceError> {
        self.store
            .fetch_vendor(id)?
            .filter(WaterVendor::is_public)
            .ok_or_else(|| ServiceError::not_found("vendor", id.0))
    }
}

fn newest_first(orders: &mut [WaterOrder]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}
