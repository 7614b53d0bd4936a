use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tower::ServiceExt;

use super::*;
use crate::error::ServiceError;
use crate::http::ACCOUNT_HEADER;
use crate::marketplace::{ClickKind, NewClick, NewOrder, NewReview};
use crate::registry::{NewIssueReport, Priority};
use crate::store::{ClickLogRepository, IssueRepository, MemoryStore, OrderRepository, ReviewRepository};
use crate::test_support::{read_json_body, seed_account, seed_source, seed_vendor};

fn service() -> (Arc<MemoryStore>, Arc<ReportService<MemoryStore>>) {
    let store = Arc::new(MemoryStore::new());
    (Arc::clone(&store), Arc::new(ReportService::new(store)))
}

#[test]
fn dashboard_requires_login() {
    let (_, service) = service();
    assert!(matches!(
        service.dashboard(None),
        Err(ServiceError::Unauthenticated)
    ));
}

#[test]
fn staff_take_precedence_over_vendor_role() {
    let (store, service) = service();
    let officer = seed_account(store.as_ref(), "officer", true, false);
    seed_vendor(store.as_ref(), officer.id, true);
    seed_source(store.as_ref(), "Mathare Tap", None);

    let dashboard = service.dashboard(Some(officer.id)).expect("dashboard");
    let Dashboard::Staff(staff) = dashboard else {
        panic!("expected staff dashboard");
    };
    assert_eq!(staff.total_sources, 1);
}

#[test]
fn vendor_dashboard_counts_recent_clicks_only() {
    let (store, service) = service();
    let owner = seed_account(store.as_ref(), "owner", false, false);
    let customer = seed_account(store.as_ref(), "customer", false, false);
    let vendor = seed_vendor(store.as_ref(), owner.id, true);

    for (kind, days_ago) in [
        (ClickKind::Call, 1),
        (ClickKind::Whatsapp, 2),
        (ClickKind::Call, 10),
    ] {
        store
            .insert_click(NewClick {
                vendor_id: vendor.id,
                kind,
                clicked_at: Utc::now() - Duration::days(days_ago),
            })
            .expect("click");
    }
    store
        .insert_order(NewOrder {
            customer: customer.id,
            vendor_id: vendor.id,
            quantity: 3,
            delivery_address: "Zimmerman".to_string(),
            customer_phone: "0711000222".to_string(),
            created_at: Utc::now(),
        })
        .expect("order");
    store
        .upsert_review(NewReview {
            vendor_id: vendor.id,
            reviewer: customer.id,
            rating: 4,
            comment: "On time".to_string(),
            created_at: Utc::now(),
        })
        .expect("review");

    let Dashboard::Vendor(dashboard) = service.dashboard(Some(owner.id)).expect("dashboard") else {
        panic!("expected vendor dashboard");
    };
    assert_eq!(dashboard.clicks_last_7_days.total, 2);
    assert_eq!(dashboard.clicks_last_7_days.calls, 1);
    assert_eq!(dashboard.clicks_last_7_days.whatsapp, 1);
    assert_eq!(dashboard.orders_by_status[0].count, 1);
    assert_eq!(dashboard.recent_orders.len(), 1);
    assert_eq!(dashboard.review_count, 1);
    assert_eq!(dashboard.average_rating, Some(Decimal::from(4)));
}

#[test]
fn residents_see_their_own_reports() {
    let (store, service) = service();
    let resident = seed_account(store.as_ref(), "wanjiru", false, false);
    let neighbour = seed_account(store.as_ref(), "otieno", false, false);
    let source = seed_source(store.as_ref(), "Kibera Borehole", None);

    for (reporter, description) in [
        (resident.id, "Tap leaking"),
        (neighbour.id, "No water"),
        (resident.id, "Queue too long"),
    ] {
        store
            .insert_issue(NewIssueReport {
                source_id: source.id,
                reporter: Some(reporter),
                description: description.to_string(),
                priority: Priority::Low,
                reported_at: Utc::now(),
            })
            .expect("issue");
    }

    let Dashboard::Resident(dashboard) = service.dashboard(Some(resident.id)).expect("dashboard")
    else {
        panic!("expected resident dashboard");
    };
    let descriptions: Vec<&str> = dashboard
        .issue_reports
        .iter()
        .map(|issue| issue.description.as_str())
        .collect();
    assert_eq!(descriptions, vec!["Queue too long", "Tap leaking"]);
    assert!(dashboard.orders.is_empty());
}

#[tokio::test]
async fn map_route_lists_sources_and_public_vendors() {
    let (store, service) = service();
    let verified = seed_account(store.as_ref(), "verified", false, false);
    let pending = seed_account(store.as_ref(), "pending", false, false);
    seed_vendor(store.as_ref(), verified.id, true);
    seed_vendor(store.as_ref(), pending.id, false);
    seed_source(store.as_ref(), "Kangemi Well", None);

    let response = reports_router(service)
        .oneshot(
            Request::builder()
                .uri("/api/map-data")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    let markers = body.as_array().expect("array");
    assert_eq!(markers.len(), 2);
    assert_eq!(markers[0]["kind"], "source");
    assert_eq!(markers[1]["kind"], "vendor");
    assert!(markers[1]["lon"].is_f64());
}

#[tokio::test]
async fn dashboard_route_is_tagged_by_role() {
    let (store, service) = service();
    let officer = seed_account(store.as_ref(), "officer", true, false);

    let response = reports_router(service)
        .oneshot(
            Request::builder()
                .uri("/api/v1/dashboard")
                .header(ACCOUNT_HEADER, officer.id.to_string())
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["role"], "staff");
    assert_eq!(body["total_open_issues"], 0);
}

#[tokio::test]
async fn overview_route_is_public() {
    let (store, service) = service();
    seed_source(store.as_ref(), "Kawangware Pump", None);

    let response = reports_router(service)
        .oneshot(
            Request::builder()
                .uri("/api/v1/overview")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json_body(response).await;
    assert_eq!(body["total_sources"], 1);
    assert_eq!(body["operational_sources"], 1);
    assert_eq!(body["recent_sources"][0]["name"], "Kawangware Pump");
}
