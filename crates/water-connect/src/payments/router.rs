use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;

use super::callback::StkCallbackEnvelope;
use super::forms::{DonationForm, PayOrderForm};
use super::service::PaymentService;
use crate::http::{ActorId, FormBody, IdPath};
use crate::marketplace::OrderId;
use crate::store::PaymentStore;

type Service<S> = State<Arc<PaymentService<S>>>;

/// Router builder for STK push initiation and the gateway callback.
pub fn payments_router<S>(service: Arc<PaymentService<S>>) -> Router
where
    S: PaymentStore + 'static,
{
    Router::new()
        .route("/api/v1/payments", get(transactions_handler::<S>))
        .route(
            "/api/v1/payments/orders/:order_id",
            post(pay_order_handler::<S>),
        )
        .route("/api/v1/payments/donations", post(donation_handler::<S>))
        .route("/api/mpesa/callback", post(callback_handler::<S>))
        .with_state(service)
}

async fn transactions_handler<S>(State(service): Service<S>, ActorId(actor): ActorId) -> Response
where
    S: PaymentStore + 'static,
{
    match service.transactions(actor) {
        Ok(transactions) => (StatusCode::OK, Json(transactions)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn pay_order_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    IdPath(order_id): IdPath,
    FormBody(form): FormBody<PayOrderForm>,
) -> Response
where
    S: PaymentStore + 'static,
{
    match service.pay_for_order(actor, OrderId(order_id), form).await {
        Ok(initiated) => (StatusCode::ACCEPTED, Json(initiated)).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn donation_handler<S>(
    State(service): Service<S>,
    ActorId(actor): ActorId,
    FormBody(form): FormBody<DonationForm>,
) -> Response
where
    S: PaymentStore + 'static,
{
    match service.donate(actor, form).await {
        Ok(initiated) => (StatusCode::ACCEPTED, Json(initiated)).into_response(),
        Err(err) => err.into_response(),
    }
}

/// Always acknowledged so the gateway does not retry.
async fn callback_handler<S>(State(service): Service<S>, body: Bytes) -> Response
where
    S: PaymentStore + 'static,
{
    match serde_json::from_slice::<StkCallbackEnvelope>(&body) {
        Ok(envelope) => {
            if let Err(err) = service.handle_callback(envelope) {
                tracing::error!(error = %err, "failed to reconcile M-Pesa callback");
            }
        }
        Err(err) => tracing::warn!(error = %err, "discarding malformed M-Pesa callback"),
    }
    (
        StatusCode::OK,
        Json(json!({ "ResultCode": 0, "ResultDesc": "Accepted" })),
    )
        .into_response()
}
