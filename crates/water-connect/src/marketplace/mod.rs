//! Water vendor marketplace: profiles, listings, reviews, clicks, and orders.

mod domain;
mod forms;
mod router;
mod service;


pub use domain::{
    average_rating, order_total, ClickId, ClickKind, NewClick, NewOrder, NewReview, NewVendor,
    OrderId, OrderStatus, ReviewId, TotalOutOfRange, VendorClickLog, VendorId, VendorListing, VendorProfile,
    VendorReview, WaterOrder, WaterVendor,
};
pub use forms::{
    ClickForm, OrderForm, OrderInput, OrderStatusForm, ReviewForm, ReviewInput, VendorForm,
    VendorInput, VerificationForm,
};
pub use router::marketplace_router;
pub use service::{MarketplaceService, MyOrders};
