//! Storage abstractions so services can be exercised in isolation.
//!
//! Each entity gets its own repository trait. Services bound themselves on the
//! traits they touch; [`MemoryStore`] implements all of them.

mod memory;

pub use memory::MemoryStore;

use chrono::{DateTime, Utc};

use crate::accounts::{Account, AccountId, NewAccount};
use crate::marketplace::{
    NewClick, NewOrder, NewReview, NewVendor, OrderId, TotalOutOfRange, VendorClickLog, VendorId,
    VendorReview, WaterOrder, WaterVendor,
};
use crate::payments::{MpesaTransaction, NewTransaction};
use crate::registry::{
    IssueId, IssueReport, NewIssueReport, NewRepairLog, NewWaterSource, RepairLog, SourceId,
    WaterSource,
};

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

impl From<TotalOutOfRange> for RepositoryError {
    fn from(_: TotalOutOfRange) -> Self {
        Self::Conflict("Order total is too large for this vendor's rates.".to_string())
    }
}

pub trait AccountRepository: Send + Sync {
    /// Fails with `Conflict` when the username is taken (case-insensitive).
    fn insert_account(&self, account: NewAccount) -> Result<Account, RepositoryError>;
    fn update_account(&self, account: Account) -> Result<(), RepositoryError>;
    fn fetch_account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError>;
    fn staff_accounts(&self) -> Result<Vec<Account>, RepositoryError>;
}

pub trait SourceRepository: Send + Sync {
    fn insert_source(&self, source: NewWaterSource) -> Result<WaterSource, RepositoryError>;
    fn update_source(&self, source: WaterSource) -> Result<(), RepositoryError>;
    fn fetch_source(&self, id: SourceId) -> Result<Option<WaterSource>, RepositoryError>;
    fn list_sources(&self) -> Result<Vec<WaterSource>, RepositoryError>;
    /// Removes the source together with its issue reports and repair logs.
    fn delete_source(&self, id: SourceId) -> Result<(), RepositoryError>;
}

pub trait IssueRepository: Send + Sync {
    fn insert_issue(&self, issue: NewIssueReport) -> Result<IssueReport, RepositoryError>;
    fn update_issue(&self, issue: IssueReport) -> Result<(), RepositoryError>;
    fn fetch_issue(&self, id: IssueId) -> Result<Option<IssueReport>, RepositoryError>;
    fn list_issues(&self) -> Result<Vec<IssueReport>, RepositoryError>;
    fn issues_for_source(&self, source: SourceId) -> Result<Vec<IssueReport>, RepositoryError>;
    fn issues_by_reporter(&self, reporter: AccountId)
        -> Result<Vec<IssueReport>, RepositoryError>;
}

pub trait RepairRepository: Send + Sync {
    fn insert_repair(&self, repair: NewRepairLog) -> Result<RepairLog, RepositoryError>;
    fn repairs_for_source(&self, source: SourceId) -> Result<Vec<RepairLog>, RepositoryError>;
}

pub trait VendorRepository: Send + Sync {
    /// Fails with `Conflict` when the owner already runs a vendor.
    fn insert_vendor(&self, vendor: NewVendor) -> Result<WaterVendor, RepositoryError>;
    fn update_vendor(&self, vendor: WaterVendor) -> Result<(), RepositoryError>;
    fn fetch_vendor(&self, id: VendorId) -> Result<Option<WaterVendor>, RepositoryError>;
    fn vendor_for_owner(&self, owner: AccountId) -> Result<Option<WaterVendor>, RepositoryError>;
    fn list_vendors(&self) -> Result<Vec<WaterVendor>, RepositoryError>;
}

/// Orders are re-priced from their vendor on every insert and update.
pub trait OrderRepository: Send + Sync {
    fn insert_order(&self, order: NewOrder) -> Result<WaterOrder, RepositoryError>;
    fn update_order(&self, order: WaterOrder) -> Result<WaterOrder, RepositoryError>;
    fn fetch_order(&self, id: OrderId) -> Result<Option<WaterOrder>, RepositoryError>;
    fn orders_for_customer(&self, customer: AccountId)
        -> Result<Vec<WaterOrder>, RepositoryError>;
    fn orders_for_vendor(&self, vendor: VendorId) -> Result<Vec<WaterOrder>, RepositoryError>;
}

pub trait ReviewRepository: Send + Sync {
    /// Inserts, or replaces the reviewer's earlier review of the same vendor.
    fn upsert_review(&self, review: NewReview) -> Result<VendorReview, RepositoryError>;
    fn reviews_for_vendor(&self, vendor: VendorId) -> Result<Vec<VendorReview>, RepositoryError>;
}

pub trait ClickLogRepository: Send + Sync {
    fn insert_click(&self, click: NewClick) -> Result<VendorClickLog, RepositoryError>;
    fn clicks_since(
        &self,
        vendor: VendorId,
        since: DateTime<Utc>,
    ) -> Result<Vec<VendorClickLog>, RepositoryError>;
}

pub trait TransactionRepository: Send + Sync {
    fn insert_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<MpesaTransaction, RepositoryError>;
    fn update_transaction(&self, transaction: MpesaTransaction) -> Result<(), RepositoryError>;
    fn transaction_by_checkout(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<MpesaTransaction>, RepositoryError>;
    fn list_transactions(&self) -> Result<Vec<MpesaTransaction>, RepositoryError>;
    fn transactions_for_order(
        &self,
        order: OrderId,
    ) -> Result<Vec<MpesaTransaction>, RepositoryError>;
}

/// Repositories behind the source registry.
pub trait RegistryStore:
    AccountRepository + SourceRepository + IssueRepository + RepairRepository
{
}

impl<T> RegistryStore for T where
    T: AccountRepository + SourceRepository + IssueRepository + RepairRepository
{
}

/// Repositories behind the vendor marketplace.
pub trait MarketplaceStore:
    AccountRepository + VendorRepository + OrderRepository + ReviewRepository + ClickLogRepository
{
}

impl<T> MarketplaceStore for T where
    T: AccountRepository
        + VendorRepository
        + OrderRepository
        + ReviewRepository
        + ClickLogRepository
{
}

/// Repositories behind STK push payments.
pub trait PaymentStore:
    AccountRepository + VendorRepository + OrderRepository + TransactionRepository
{
}

impl<T> PaymentStore for T where
    T: AccountRepository + VendorRepository + OrderRepository + TransactionRepository
{
}

/// Everything the HTTP surface needs from a single backing store.
pub trait EntityStore:
    AccountRepository
    + SourceRepository
    + IssueRepository
    + RepairRepository
    + VendorRepository
    + OrderRepository
    + ReviewRepository
    + ClickLogRepository
    + TransactionRepository
{
}

impl<T> EntityStore for T where
    T: AccountRepository
        + SourceRepository
        + IssueRepository
        + RepairRepository
        + VendorRepository
        + OrderRepository
        + ReviewRepository
        + ClickLogRepository
        + TransactionRepository
{
}
