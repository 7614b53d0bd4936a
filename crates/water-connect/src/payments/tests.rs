use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use chrono::Utc;
use serde_json::json;
use tower::ServiceExt;

use super::*;
use crate::accounts::Account;
use crate::error::ServiceError;
use crate::http::ACCOUNT_HEADER;
use crate::marketplace::{NewOrder, WaterOrder, WaterVendor};
use crate::store::{MemoryStore, OrderRepository, TransactionRepository};
use crate::test_support::{read_json_body, seed_account, seed_vendor, StubGateway};

struct Fixture {
    store: Arc<MemoryStore>,
    gateway: StubGateway,
    service: Arc<PaymentService<MemoryStore>>,
    customer: Account,
    vendor: WaterVendor,
    order: WaterOrder,
}

fn fixture(gateway: StubGateway) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let owner = seed_account(store.as_ref(), "owner", false, false);
    let customer = seed_account(store.as_ref(), "amina", false, false);
    let vendor = seed_vendor(store.as_ref(), owner.id, true);
    let order = store
        .insert_order(NewOrder {
            customer: customer.id,
            vendor_id: vendor.id,
            quantity: 2,
            delivery_address: "Plot 7, Kahawa West".to_string(),
            customer_phone: "0711222333".to_string(),
            created_at: Utc::now(),
        })
        .expect("order");
    let service = Arc::new(PaymentService::new(
        Arc::clone(&store),
        Arc::new(gateway.clone()),
    ));
    Fixture {
        store,
        gateway,
        service,
        customer,
        vendor,
        order,
    }
}

fn callback(checkout: &str, code: i64) -> StkCallbackEnvelope {
    serde_json::from_value(json!({
        "Body": {
            "stkCallback": {
                "MerchantRequestID": "29115-34620561-1",
                "CheckoutRequestID": checkout,
                "ResultCode": code,
                "ResultDesc": if code == 0 { "Processed" } else { "Request cancelled by user" },
                "CallbackMetadata": {
                    "Item": [{ "Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV" }]
                }
            }
        }
    }))
    .expect("callback")
}

#[tokio::test]
async fn order_payment_records_pending_transaction() {
    let fx = fixture(StubGateway::accepting("ws_CO_1"));

    let initiated = fx
        .service
        .pay_for_order(Some(fx.customer.id), fx.order.id, PayOrderForm::default())
        .await
        .expect("initiated");

    assert_eq!(
        initiated.message,
        "STK Push sent to 254711222333. Check your phone to pay!"
    );
    let transaction = initiated.transaction;
    assert_eq!(transaction.status, TransactionStatus::Pending);
    assert_eq!(transaction.amount, 130);
    assert_eq!(transaction.purpose, PaymentPurpose::VendorPayment);
    assert_eq!(transaction.vendor_id, Some(fx.vendor.id));
    assert_eq!(transaction.order_id, Some(fx.order.id));
    assert_eq!(transaction.checkout_request_id, "ws_CO_1");

    let requests = fx.gateway.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].account_reference, fx.vendor.business_name);
    assert_eq!(
        requests[0].description,
        format!("Water order #{}", fx.order.id)
    );
}

#[tokio::test]
async fn only_the_ordering_customer_pays() {
    let fx = fixture(StubGateway::accepting("ws_CO_1"));
    let stranger = seed_account(fx.store.as_ref(), "stranger", false, false);

    let err = fx
        .service
        .pay_for_order(Some(stranger.id), fx.order.id, PayOrderForm::default())
        .await
        .expect_err("forbidden");
    assert!(matches!(err, ServiceError::PermissionDenied(_)));
    assert!(fx.gateway.requests().is_empty());
}

#[tokio::test]
async fn rejected_push_creates_no_record() {
    let fx = fixture(StubGateway::rejecting("1", "Invalid Access Token"));

    let err = fx
        .service
        .pay_for_order(Some(fx.customer.id), fx.order.id, PayOrderForm::default())
        .await
        .expect_err("rejected");
    assert_eq!(err.to_string(), "Failed: Invalid Access Token");
    assert!(fx.store.list_transactions().expect("list").is_empty());
}

#[tokio::test]
async fn unreachable_gateway_surfaces_mpesa_error() {
    let fx = fixture(StubGateway::unreachable("connection refused"));

    let err = fx
        .service
        .donate(
            Some(fx.customer.id),
            DonationForm {
                phone: Some("0712345678".to_string()),
                amount: Some(200),
            },
        )
        .await
        .expect_err("unreachable");
    assert_eq!(err.to_string(), "M-Pesa Error: connection refused");
    assert!(fx.store.list_transactions().expect("list").is_empty());
}

#[tokio::test]
async fn donation_uses_platform_reference() {
    let fx = fixture(StubGateway::accepting("ws_CO_9"));

    let initiated = fx
        .service
        .donate(
            Some(fx.customer.id),
            DonationForm {
                phone: Some("+254712345678".to_string()),
                amount: Some(500),
            },
        )
        .await
        .expect("donation");
    assert_eq!(initiated.transaction.purpose, PaymentPurpose::Donation);
    assert_eq!(initiated.transaction.vendor_id, None);

    let request = &fx.gateway.requests()[0];
    assert_eq!(request.account_reference, "WaterConnect");
    assert_eq!(request.description, "Donation");
    assert_eq!(request.amount, 500);
}

#[tokio::test]
async fn anonymous_donation_requires_login() {
    let fx = fixture(StubGateway::accepting("ws_CO_9"));
    let err = fx
        .service
        .donate(None, DonationForm::default())
        .await
        .expect_err("anonymous");
    assert!(matches!(err, ServiceError::Unauthenticated));
}

#[tokio::test]
async fn callback_settles_pending_transaction_once() {
    let fx = fixture(StubGateway::accepting("ws_CO_1"));
    fx.service
        .pay_for_order(Some(fx.customer.id), fx.order.id, PayOrderForm::default())
        .await
        .expect("initiated");

    let settled = fx
        .service
        .handle_callback(callback("ws_CO_1", 0))
        .expect("callback")
        .expect("known transaction");
    assert_eq!(settled.status, TransactionStatus::Completed);
    assert_eq!(settled.receipt_number.as_deref(), Some("NLJ7RT61SV"));

    let repeat = fx
        .service
        .handle_callback(callback("ws_CO_1", 1032))
        .expect("callback")
        .expect("known transaction");
    assert_eq!(repeat.status, TransactionStatus::Completed);

    let stored = fx
        .store
        .transaction_by_checkout("ws_CO_1")
        .expect("lookup")
        .expect("stored");
    assert_eq!(stored.status, TransactionStatus::Completed);
}

#[tokio::test]
async fn settled_order_cannot_be_charged_again() {
    let fx = fixture(StubGateway::accepting("ws_CO_9"));
    fx.service
        .pay_for_order(Some(fx.customer.id), fx.order.id, PayOrderForm::default())
        .await
        .expect("first push");
    fx.service
        .handle_callback(callback("ws_CO_9", 0))
        .expect("callback");

    let err = fx
        .service
        .pay_for_order(Some(fx.customer.id), fx.order.id, PayOrderForm::default())
        .await
        .expect_err("already paid");
    assert!(matches!(err, ServiceError::Conflict(_)));
    assert_eq!(fx.gateway.requests().len(), 1);
}

#[tokio::test]
async fn failed_payment_can_be_retried() {
    let fx = fixture(StubGateway::accepting("ws_CO_10"));
    fx.service
        .pay_for_order(Some(fx.customer.id), fx.order.id, PayOrderForm::default())
        .await
        .expect("first push");
    fx.service
        .handle_callback(callback("ws_CO_10", 1032))
        .expect("callback");

    fx.service
        .pay_for_order(Some(fx.customer.id), fx.order.id, PayOrderForm::default())
        .await
        .expect("retry");
    assert_eq!(fx.gateway.requests().len(), 2);
}

#[tokio::test]
async fn failed_callback_marks_transaction_failed() {
    let fx = fixture(StubGateway::accepting("ws_CO_2"));
    fx.service
        .pay_for_order(Some(fx.customer.id), fx.order.id, PayOrderForm::default())
        .await
        .expect("initiated");

    let settled = fx
        .service
        .handle_callback(callback("ws_CO_2", 1032))
        .expect("callback")
        .expect("known transaction");
    assert_eq!(settled.status, TransactionStatus::Failed);
    assert_eq!(settled.receipt_number, None);
    assert_eq!(
        settled.result_description.as_deref(),
        Some("Request cancelled by user")
    );
}

#[test]
fn unknown_callback_reference_is_ignored() {
    let fx = fixture(StubGateway::accepting("ws_CO_1"));
    let outcome = fx
        .service
        .handle_callback(callback("ws_CO_404", 0))
        .expect("callback");
    assert!(outcome.is_none());
}

#[tokio::test]
async fn payment_route_answers_accepted() {
    let fx = fixture(StubGateway::accepting("ws_CO_1"));
    let app = payments_router(Arc::clone(&fx.service));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri(format!("/api/v1/payments/orders/{}", fx.order.id))
                .header(ACCOUNT_HEADER, fx.customer.id.to_string())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json!({ "phone": "0799000111" }).to_string()))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    let body = read_json_body(response).await;
    assert_eq!(body["transaction"]["status"], "pending");
    assert_eq!(body["transaction"]["phone_number"], "254799000111");
}

#[tokio::test]
async fn gateway_failure_route_returns_bad_gateway() {
    let fx = fixture(StubGateway::rejecting("1", "Insufficient balance"));
    let app = payments_router(Arc::clone(&fx.service));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/v1/payments/donations")
                .header(ACCOUNT_HEADER, fx.customer.id.to_string())
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "phone": "0712345678", "amount": 50 }).to_string(),
                ))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = read_json_body(response).await;
    assert_eq!(body["error"], "Failed: Insufficient balance");
}

#[tokio::test]
async fn callback_route_always_acknowledges() {
    let fx = fixture(StubGateway::accepting("ws_CO_1"));
    let app = payments_router(Arc::clone(&fx.service));

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/api/mpesa/callback")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("not json"))
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body, json!({ "ResultCode": 0, "ResultDesc": "Accepted" }));
}

#[test]
fn transaction_history_is_staff_only() {
    let fx = fixture(StubGateway::accepting("ws_CO_1"));
    let staff = seed_account(fx.store.as_ref(), "officer", true, false);

    assert!(matches!(
        fx.service.transactions(Some(fx.customer.id)),
        Err(ServiceError::PermissionDenied(_))
    ));
    assert!(fx
        .service
        .transactions(Some(staff.id))
        .expect("staff view")
        .is_empty());
}
