use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::response::Response;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::accounts::{Account, AccountId, NewAccount};
use crate::marketplace::{NewVendor, WaterVendor};
use crate::notifications::{EmailMessage, MailError, Mailer};
use crate::payments::{PaymentError, PaymentGateway, StkPushRequest, StkPushResponse};
use crate::registry::{
    IssueId, IssueReport, NewIssueReport, NewRepairLog, NewWaterSource, RepairLog, SourceId,
    SourceStatus, SourceType, WaterSource,
};
use crate::store::{
    AccountRepository, IssueRepository, RepairRepository, RepositoryError, SourceRepository,
    VendorRepository,
};

pub(crate) fn account(id: u64, is_staff: bool) -> Account {
    Account {
        id: AccountId(id),
        username: format!("user{id}"),
        email: format!("user{id}@example.org"),
        first_name: String::new(),
        last_name: String::new(),
        is_staff,
        is_superuser: false,
        date_joined: Utc::now(),
    }
}

pub(crate) fn source_fixture(id: u64) -> WaterSource {
    WaterSource {
        id: SourceId(id),
        name: format!("Kibera Borehole {id}"),
        source_type: SourceType::Borehole,
        latitude: Decimal::new(-1_312_000, 6),
        longitude: Decimal::new(36_789_000, 6),
        status: SourceStatus::Operational,
        is_verified: true,
        created_by: None,
        installation_date: NaiveDate::from_ymd_opt(2024, 1, 10).expect("valid date"),
        description: String::new(),
        last_updated: Utc::now(),
    }
}

pub(crate) fn seed_account<S>(
    store: &S,
    username: &str,
    is_staff: bool,
    is_superuser: bool,
) -> Account
where
    S: AccountRepository,
{
    store
        .insert_account(NewAccount {
            username: username.to_string(),
            email: format!("{username}@example.org"),
            first_name: String::new(),
            last_name: String::new(),
            is_staff,
            is_superuser,
            date_joined: Utc::now(),
        })
        .expect("seed account")
}

pub(crate) fn seed_source<S>(store: &S, name: &str, created_by: Option<AccountId>) -> WaterSource
where
    S: SourceRepository,
{
    store
        .insert_source(NewWaterSource {
            name: name.to_string(),
            source_type: SourceType::Borehole,
            latitude: Decimal::new(-1_292_066, 6),
            longitude: Decimal::new(36_821_945, 6),
            status: SourceStatus::Operational,
            is_verified: false,
            created_by,
            installation_date: NaiveDate::from_ymd_opt(2022, 5, 20).expect("valid date"),
            description: String::new(),
            last_updated: Utc::now(),
        })
        .expect("seed source")
}

/// Open vendor at 50.00 per jerrycan plus 30.00 delivery, optionally verified.
pub(crate) fn seed_vendor<S>(store: &S, owner: AccountId, verified: bool) -> WaterVendor
where
    S: VendorRepository,
{
    let mut vendor = store
        .insert_vendor(NewVendor {
            owner,
            business_name: format!("Vendor {owner}"),
            phone_number: "0712345678".to_string(),
            location_name: "Kasarani, Near Naivas".to_string(),
            latitude: Some(Decimal::new(-1_221_000, 6)),
            longitude: Some(Decimal::new(36_897_000, 6)),
            is_open: true,
            price_per_20l: Decimal::new(5000, 2),
            delivery_fee: Decimal::new(3000, 2),
            created_at: Utc::now(),
        })
        .expect("seed vendor");
    if verified {
        vendor.is_verified = true;
        store.update_vendor(vendor.clone()).expect("verify vendor");
    }
    vendor
}

pub(crate) async fn read_json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

#[derive(Default, Clone)]
pub(crate) struct RecordingMailer {
    sent: Arc<Mutex<Vec<EmailMessage>>>,
}

impl RecordingMailer {
    pub(crate) fn sent(&self) -> Vec<EmailMessage> {
        self.sent.lock().expect("mailer mutex poisoned").clone()
    }

    /// Polls until `count` messages arrived or roughly a second passed.
    pub(crate) async fn wait_for(&self, count: usize) -> Vec<EmailMessage> {
        for _ in 0..100 {
            let sent = self.sent();
            if sent.len() >= count {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.sent()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        self.sent
            .lock()
            .expect("mailer mutex poisoned")
            .push(message);
        Ok(())
    }
}

/// Mailer that rejects every message and counts the attempts.
#[derive(Default, Clone)]
pub(crate) struct FailingMailer {
    attempts: Arc<AtomicUsize>,
}

impl FailingMailer {
    pub(crate) fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Polls until `count` sends were attempted or roughly a second passed.
    pub(crate) async fn wait_for_attempts(&self, count: usize) -> usize {
        for _ in 0..100 {
            if self.attempts() >= count {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.attempts()
    }
}

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _message: EmailMessage) -> Result<(), MailError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(MailError::Rejected {
            status: 503,
            body: "smtp relay offline".to_string(),
        })
    }
}

/// Gateway double answering every push with a fixed outcome.
#[derive(Clone)]
pub(crate) struct StubGateway {
    outcome: Result<StkPushResponse, String>,
    requests: Arc<Mutex<Vec<StkPushRequest>>>,
}

impl StubGateway {
    pub(crate) fn accepting(checkout_request_id: &str) -> Self {
        Self {
            outcome: Ok(StkPushResponse {
                response_code: "0".to_string(),
                response_description: "Success. Request accepted for processing".to_string(),
                checkout_request_id: Some(checkout_request_id.to_string()),
                merchant_request_id: Some("29115-34620561-1".to_string()),
                customer_message: None,
            }),
            requests: Arc::default(),
        }
    }

    pub(crate) fn rejecting(code: &str, description: &str) -> Self {
        Self {
            outcome: Ok(StkPushResponse {
                response_code: code.to_string(),
                response_description: description.to_string(),
                checkout_request_id: None,
                merchant_request_id: None,
                customer_message: None,
            }),
            requests: Arc::default(),
        }
    }

    pub(crate) fn unreachable(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            requests: Arc::default(),
        }
    }

    pub(crate) fn requests(&self) -> Vec<StkPushRequest> {
        self.requests.lock().expect("gateway mutex poisoned").clone()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn stk_push(&self, request: StkPushRequest) -> Result<StkPushResponse, PaymentError> {
        self.requests
            .lock()
            .expect("gateway mutex poisoned")
            .push(request);
        self.outcome
            .clone()
            .map_err(PaymentError::Transport)
    }
}

/// Registry store whose every call fails as if the backend were offline.
pub(crate) struct UnavailableStore;

fn offline<T>() -> Result<T, RepositoryError> {
    Err(RepositoryError::Unavailable("database offline".to_string()))
}

impl AccountRepository for UnavailableStore {
    fn insert_account(&self, _account: NewAccount) -> Result<Account, RepositoryError> {
        offline()
    }

    fn update_account(&self, _account: Account) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_account(&self, _id: AccountId) -> Result<Option<Account>, RepositoryError> {
        offline()
    }

    fn staff_accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        offline()
    }
}

impl SourceRepository for UnavailableStore {
    fn insert_source(&self, _source: NewWaterSource) -> Result<WaterSource, RepositoryError> {
        offline()
    }

    fn update_source(&self, _source: WaterSource) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_source(&self, _id: SourceId) -> Result<Option<WaterSource>, RepositoryError> {
        offline()
    }

    fn list_sources(&self) -> Result<Vec<WaterSource>, RepositoryError> {
        offline()
    }

    fn delete_source(&self, _id: SourceId) -> Result<(), RepositoryError> {
        offline()
    }
}

impl IssueRepository for UnavailableStore {
    fn insert_issue(
        &self,
        _issue: NewIssueReport,
    ) -> Result<IssueReport, RepositoryError> {
        offline()
    }

    fn update_issue(&self, _issue: IssueReport) -> Result<(), RepositoryError> {
        offline()
    }

    fn fetch_issue(
        &self,
        _id: IssueId,
    ) -> Result<Option<IssueReport>, RepositoryError> {
        offline()
    }

    fn list_issues(&self) -> Result<Vec<IssueReport>, RepositoryError> {
        offline()
    }

    fn issues_for_source(
        &self,
        _source: SourceId,
    ) -> Result<Vec<IssueReport>, RepositoryError> {
        offline()
    }

    fn issues_by_reporter(
        &self,
        _reporter: AccountId,
    ) -> Result<Vec<IssueReport>, RepositoryError> {
        offline()
    }
}

impl RepairRepository for UnavailableStore {
    fn insert_repair(
        &self,
        _repair: NewRepairLog,
    ) -> Result<RepairLog, RepositoryError> {
        offline()
    }

    fn repairs_for_source(
        &self,
        _source: SourceId,
    ) -> Result<Vec<RepairLog>, RepositoryError> {
        offline()
    }
}
