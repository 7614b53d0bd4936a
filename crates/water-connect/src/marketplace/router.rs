use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

use super::domain::{OrderId, VendorId};
use super::forms::{ClickForm, OrderForm, OrderStatusForm, ReviewForm, VendorForm, VerificationForm};
use super::service::MarketplaceService;
use crate::http::{ActorId, FormBody, IdPath};
use crate::store::MarketplaceStore;

type Service<S> = State<Arc<MarketplaceService<S>>>;

/// Router builder for vendor, review, click, and order endpoints.
pub fn marketplace_router<S>(service: Arc<MarketplaceService<S>>) -> Router
where
    S: MarketplaceStore + 'static,
{
    Router::new()
        .route(
            "/api/v1/vendors",
            get(public_vendors_handler::<S>).post(register_vendor_handler::<S>),
        )
        .route(
            "/api/v1/vendors/me",
            get(my_vendor_handler::<S>).put(update_vendor_handler::<S>),
        )
        .route("/api/v1/vendors/:vendor_id", get(public_profile_handler::<S>))
        .route(
            "/api/v1/vendors/:vendor_id/verification",
            put(verification_handler::<S>),
        )
        .route(
            "/api/v1/vendors/:vendor_id/clicks",
            post(record_click_handler::<S>),
        )
        .route(
            "/api/v1/vendors/:vendor_id/reviews",
            post(review_handler::<S>),
        )
        .route(
            "/api/v1/vendors/:vendor_id/orders",
            post(place_order_handler::<S>),
        )
        .route("/api/v1/orders", get(my_orders_handler::<S>))
        .route(
            "/api/v1/orders/:order_id/status",
            put(order_status_handler::<S>),
        )
        .with_state(service)
}

async fn public_vendors_handler<S>(State(service): Service<S>) -> Response
where
    S: MarketplaceStore + 'static,
{
    match service.public_vendors() {
        Ok(vendors) => (StatusCode::OK, Json(vendors)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn register_vendor_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    FormBody(form): FormBody<VendorForm>,
) -> Response
where
    S: MarketplaceStore + 'static,
{
    match service.register_vendor(actor, form) {
        Ok(vendor) => (StatusCode::CREATED, Json(vendor)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn my_vendor_handler<S>(State(service): Service<S>, ActorId(actor): ActorId) -> Response
where
    S: MarketplaceStore + 'static,
{
    match service.my_vendor(actor) {
        Ok(vendor) => (StatusCode::OK, Json(vendor)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn update_vendor_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    FormBody(form): FormBody<VendorForm>,
) -> Response
where
    S: MarketplaceStore + 'static,
{
    match service.update_vendor(actor, form) {
        Ok(vendor) => (StatusCode::OK, Json(vendor)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn verification_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    IdPath(vendor_id): IdPath,
    FormBody(form): FormBody<VerificationForm>,
) -> Response
where
    S: MarketplaceStore + 'static,
{
    match service.set_verification(actor, VendorId(vendor_id), form.is_verified) {
        Ok(vendor) => (StatusCode::OK, Json(vendor)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn public_profile_handler<S>(
    State(service): Service<S>,
    IdPath(vendor_id): IdPath,
) -> Response
where
    S: MarketplaceStore + 'static,
{
    match service.public_profile(VendorId(vendor_id)) {
        Ok(profile) => (StatusCode::OK, Json(profile)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn record_click_handler<S>(
    State(service): Service<S>,
    IdPath(vendor_id): IdPath,
    FormBody(form): FormBody<ClickForm>,
) -> Response
where
    S: MarketplaceStore + 'static,
{
    match service.record_click(VendorId(vendor_id), form.kind) {
        Ok(click) => (StatusCode::CREATED, Json(click)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn review_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    IdPath(vendor_id): IdPath,
    FormBody(form): FormBody<ReviewForm>,
) -> Response
where
    S: MarketplaceStore + 'static,
{
    match service.review(actor, VendorId(vendor_id), form) {
        Ok(review) => (StatusCode::CREATED, Json(review)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn place_order_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    IdPath(vendor_id): IdPath,
    FormBody(form): FormBody<OrderForm>,
) -> Response
where
    S: MarketplaceStore + 'static,
{
    match service.place_order(actor, VendorId(vendor_id), form) {
        Ok(order) => (StatusCode::CREATED, Json(order)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn my_orders_handler<S>(State(service): Service<S>, ActorId(actor): ActorId) -> Response
where
    S: MarketplaceStore + 'static,
{
    match service.my_orders(actor) {
        Ok(orders) => (StatusCode::OK, Json(orders)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn order_status_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    IdPath(order_id): IdPath,
    FormBody(form): FormBody<OrderStatusForm>,
) -> Response
where
    S: MarketplaceStore + 'static,
{
    match service.update_order_status(actor, OrderId(order_id), form.status) {
        Ok(order) => (StatusCode::OK, Json(order)).into_response(),
        Err(err) => err.into_response(),
    }
}
