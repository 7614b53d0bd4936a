use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    AccountRepository, ClickLogRepository, IssueRepository, OrderRepository, RepairRepository,
    RepositoryError, ReviewRepository, SourceRepository, TransactionRepository, VendorRepository,
};
use crate::accounts::{Account, AccountId, NewAccount};
use crate::marketplace::{
    order_total, ClickId, NewClick, NewOrder, NewReview, NewVendor, OrderId, OrderStatus,
    ReviewId, VendorClickLog, VendorId, VendorReview, WaterOrder, WaterVendor,
};
use crate::payments::{MpesaTransaction, NewTransaction, TransactionId, TransactionStatus};
use crate::registry::{
    IssueId, IssueReport, NewIssueReport, NewRepairLog, NewWaterSource, RepairId, RepairLog,
    SourceId, WaterSource,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct Tables {
    sequence: u64,
    accounts: BTreeMap<u64, Account>,
    sources: BTreeMap<u64, WaterSource>,
    issues: BTreeMap<u64, IssueReport>,
    repairs: BTreeMap<u64, RepairLog>,
    vendors: BTreeMap<u64, WaterVendor>,
    orders: BTreeMap<u64, WaterOrder>,
    reviews: BTreeMap<u64, VendorReview>,
    clicks: BTreeMap<u64, VendorClickLog>,
    transactions: BTreeMap<u64, MpesaTransaction>,
}

impl Tables {
    fn next_id(&mut self) -> u64 {
        self.sequence += 1;
        self.sequence
    }
}

/// Mutex-guarded entity tables, optionally mirrored to a JSON snapshot file.
///
/// Writes run against a copy of the tables that replaces the live state only
/// once the snapshot, when configured, has been rewritten through a temporary
/// file and a rename. A failed write leaves nothing behind in memory or on disk.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<Tables>,
    snapshot: Option<PathBuf>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens a store backed by `path`, loading it when the file exists.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        let tables = if path.exists() {
            let raw = fs::read(&path).map_err(|err| unavailable(&path, err))?;
            serde_json::from_slice(&raw).map_err(|err| unavailable(&path, err))?
        } else {
            Tables::default()
        };
        Ok(Self {
            state: Mutex::new(tables),
            snapshot: Some(path),
        })
    }

    pub fn snapshot_path(&self) -> Option<&Path> {
        self.snapshot.as_deref()
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, RepositoryError> {
        let guard = self
            .state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))?;
        Ok(f(&guard))
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut guard = self
            .state
            .lock()
            .map_err(|_| RepositoryError::Unavailable("store mutex poisoned".to_string()))?;
        let mut staged = guard.clone();
        let value = f(&mut staged)?;
        if let Some(path) = &self.snapshot {
            persist(path, &staged)?;
        }
        *guard = staged;
        Ok(value)
    }
}

fn persist(path: &Path, tables: &Tables) -> Result<(), RepositoryError> {
    let encoded = serde_json::to_vec_pretty(tables).map_err(|err| unavailable(path, err))?;
    let staging = path.with_extension("tmp");
    fs::write(&staging, encoded).map_err(|err| unavailable(&staging, err))?;
    fs::rename(&staging, path).map_err(|err| unavailable(path, err))
}

fn unavailable(path: &Path, err: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Unavailable(format!("snapshot {}: {err}", path.display()))
}

fn replace<T>(table: &mut BTreeMap<u64, T>, id: u64, value: T) -> Result<(), RepositoryError> {
    match table.get_mut(&id) {
        Some(slot) => {
            *slot = value;
            Ok(())
        }
        None => Err(RepositoryError::NotFound),
    }
}

fn vendor_rates(tables: &Tables, vendor: VendorId) -> Result<&WaterVendor, RepositoryError> {
    tables.vendors.get(&vendor.0).ok_or(RepositoryError::NotFound)
}

impl AccountRepository for MemoryStore {
    fn insert_account(&self, account: NewAccount) -> Result<Account, RepositoryError> {
        self.write(|tables| {
            let taken = tables
                .accounts
                .values()
                .any(|existing| existing.username.eq_ignore_ascii_case(&account.username));
            if taken {
                return Err(RepositoryError::Conflict(
                    "A user with that username already exists.".to_string(),
                ));
            }
            let record = Account {
                id: AccountId(tables.next_id()),
                username: account.username,
                email: account.email,
                first_name: account.first_name,
                last_name: account.last_name,
                is_staff: account.is_staff,
                is_superuser: account.is_superuser,
                date_joined: account.date_joined,
            };
            tables.accounts.insert(record.id.0, record.clone());
            Ok(record)
        })
    }

    fn update_account(&self, account: Account) -> Result<(), RepositoryError> {
        self.write(|tables| replace(&mut tables.accounts, account.id.0, account))
    }

    fn fetch_account(&self, id: AccountId) -> Result<Option<Account>, RepositoryError> {
        self.read(|tables| tables.accounts.get(&id.0).cloned())
    }

    fn staff_accounts(&self) -> Result<Vec<Account>, RepositoryError> {
        self.read(|tables| {
            tables
                .accounts
                .values()
                .filter(|account| account.is_staff)
                .cloned()
                .collect()
        })
    }
}

impl SourceRepository for MemoryStore {
    fn insert_source(&self, source: NewWaterSource) -> Result<WaterSource, RepositoryError> {
        self.write(|tables| {
            let record = WaterSource {
                id: SourceId(tables.next_id()),
                name: source.name,
                source_type: source.source_type,
                latitude: source.latitude,
                longitude: source.longitude,
                status: source.status,
                is_verified: source.is_verified,
                created_by: source.created_by,
                installation_date: source.installation_date,
                description: source.description,
                last_updated: source.last_updated,
            };
            tables.sources.insert(record.id.0, record.clone());
            Ok(record)
        })
    }

    fn update_source(&self, source: WaterSource) -> Result<(), RepositoryError> {
        self.write(|tables| replace(&mut tables.sources, source.id.0, source))
    }

    fn fetch_source(&self, id: SourceId) -> Result<Option<WaterSource>, RepositoryError> {
        self.read(|tables| tables.sources.get(&id.0).cloned())
    }

    fn list_sources(&self) -> Result<Vec<WaterSource>, RepositoryError> {
        self.read(|tables| tables.sources.values().cloned().collect())
    }

    fn delete_source(&self, id: SourceId) -> Result<(), RepositoryError> {
        self.write(|tables| {
            tables
                .sources
                .remove(&id.0)
                .ok_or(RepositoryError::NotFound)?;
            tables.issues.retain(|_, issue| issue.source_id != id);
            tables.repairs.retain(|_, repair| repair.source_id != id);
            Ok(())
        })
    }
}

impl IssueRepository for MemoryStore {
    fn insert_issue(&self, issue: NewIssueReport) -> Result<IssueReport, RepositoryError> {
        self.write(|tables| {
            if !tables.sources.contains_key(&issue.source_id.0) {
                return Err(RepositoryError::NotFound);
            }
            let record = IssueReport {
                id: IssueId(tables.next_id()),
                source_id: issue.source_id,
                reporter: issue.reporter,
                description: issue.description,
                priority: issue.priority,
                is_resolved: false,
                reported_at: issue.reported_at,
            };
            tables.issues.insert(record.id.0, record.clone());
            Ok(record)
        })
    }

    fn update_issue(&self, issue: IssueReport) -> Result<(), RepositoryError> {
        self.write(|tables| replace(&mut tables.issues, issue.id.0, issue))
    }

    fn fetch_issue(&self, id: IssueId) -> Result<Option<IssueReport>, RepositoryError> {
        self.read(|tables| tables.issues.get(&id.0).cloned())
    }

    fn list_issues(&self) -> Result<Vec<IssueReport>, RepositoryError> {
        self.read(|tables| tables.issues.values().cloned().collect())
    }

    fn issues_for_source(&self, source: SourceId) -> Result<Vec<IssueReport>, RepositoryError> {
        self.read(|tables| {
            tables
                .issues
                .values()
                .filter(|issue| issue.source_id == source)
                .cloned()
                .collect()
        })
    }

    fn issues_by_reporter(
        &self,
        reporter: AccountId,
    ) -> Result<Vec<IssueReport>, RepositoryError> {
        self.read(|tables| {
            tables
                .issues
                .values()
                .filter(|issue| issue.reporter == Some(reporter))
                .cloned()
                .collect()
        })
    }
}

impl RepairRepository for MemoryStore {
    fn insert_repair(&self, repair: NewRepairLog) -> Result<RepairLog, RepositoryError> {
        self.write(|tables| {
            if !tables.sources.contains_key(&repair.source_id.0) {
                return Err(RepositoryError::NotFound);
            }
            let record = RepairLog {
                id: RepairId(tables.next_id()),
                source_id: repair.source_id,
                technician: repair.technician,
                repair_date: repair.repair_date,
                work_done: repair.work_done,
                cost: repair.cost,
            };
            tables.repairs.insert(record.id.0, record.clone());
            Ok(record)
        })
    }

    fn repairs_for_source(&self, source: SourceId) -> Result<Vec<RepairLog>, RepositoryError> {
        self.read(|tables| {
            tables
                .repairs
                .values()
                .filter(|repair| repair.source_id == source)
                .cloned()
                .collect()
        })
    }
}

impl VendorRepository for MemoryStore {
    fn insert_vendor(&self, vendor: NewVendor) -> Result<WaterVendor, RepositoryError> {
        self.write(|tables| {
            if tables.vendors.values().any(|v| v.owner == vendor.owner) {
                return Err(RepositoryError::Conflict(
                    "This account already has a vendor profile.".to_string(),
                ));
            }
            let record = WaterVendor {
                id: VendorId(tables.next_id()),
                owner: vendor.owner,
                business_name: vendor.business_name,
                phone_number: vendor.phone_number,
                location_name: vendor.location_name,
                latitude: vendor.latitude,
                longitude: vendor.longitude,
                is_open: vendor.is_open,
                is_verified: false,
                price_per_20l: vendor.price_per_20l,
                delivery_fee: vendor.delivery_fee,
                created_at: vendor.created_at,
            };
            tables.vendors.insert(record.id.0, record.clone());
            Ok(record)
        })
    }

    fn update_vendor(&self, vendor: WaterVendor) -> Result<(), RepositoryError> {
        self.write(|tables| replace(&mut tables.vendors, vendor.id.0, vendor))
    }

    fn fetch_vendor(&self, id: VendorId) -> Result<Option<WaterVendor>, RepositoryError> {
        self.read(|tables| tables.vendors.get(&id.0).cloned())
    }

    fn vendor_for_owner(&self, owner: AccountId) -> Result<Option<WaterVendor>, RepositoryError> {
        self.read(|tables| {
            tables
                .vendors
                .values()
                .find(|vendor| vendor.owner == owner)
                .cloned()
        })
    }

    fn list_vendors(&self) -> Result<Vec<WaterVendor>, RepositoryError> {
        self.read(|tables| tables.vendors.values().cloned().collect())
    }
}

impl OrderRepository for MemoryStore {
    fn insert_order(&self, order: NewOrder) -> Result<WaterOrder, RepositoryError> {
        self.write(|tables| {
            let vendor = vendor_rates(tables, order.vendor_id)?;
            let total_cost =
                order_total(vendor.price_per_20l, vendor.delivery_fee, order.quantity)?;
            let record = WaterOrder {
                id: OrderId(tables.next_id()),
                customer: order.customer,
                vendor_id: order.vendor_id,
                quantity: order.quantity,
                total_cost,
                delivery_address: order.delivery_address,
                customer_phone: order.customer_phone,
                status: OrderStatus::Pending,
                created_at: order.created_at,
                updated_at: order.created_at,
            };
            tables.orders.insert(record.id.0, record.clone());
            Ok(record)
        })
    }

    fn update_order(&self, mut order: WaterOrder) -> Result<WaterOrder, RepositoryError> {
        self.write(|tables| {
            order.recompute_total(vendor_rates(tables, order.vendor_id)?)?;
            replace(&mut tables.orders, order.id.0, order.clone())?;
            Ok(order)
        })
    }

    fn fetch_order(&self, id: OrderId) -> Result<Option<WaterOrder>, RepositoryError> {
        self.read(|tables| tables.orders.get(&id.0).cloned())
    }

    fn orders_for_customer(
        &self,
        customer: AccountId,
    ) -> Result<Vec<WaterOrder>, RepositoryError> {
        self.read(|tables| {
            tables
                .orders
                .values()
                .filter(|order| order.customer == customer)
                .cloned()
                .collect()
        })
    }

    fn orders_for_vendor(&self, vendor: VendorId) -> Result<Vec<WaterOrder>, RepositoryError> {
        self.read(|tables| {
            tables
                .orders
                .values()
                .filter(|order| order.vendor_id == vendor)
                .cloned()
                .collect()
        })
    }
}

impl ReviewRepository for MemoryStore {
    fn upsert_review(&self, review: NewReview) -> Result<VendorReview, RepositoryError> {
        self.write(|tables| {
            let existing = tables
                .reviews
                .values()
                .find(|r| r.vendor_id == review.vendor_id && r.reviewer == review.reviewer)
                .map(|r| r.id);
            let id = match existing {
                Some(id) => id,
                None => ReviewId(tables.next_id()),
            };
            let record = VendorReview {
                id,
                vendor_id: review.vendor_id,
                reviewer: review.reviewer,
                rating: review.rating,
                comment: review.comment,
                created_at: review.created_at,
            };
            tables.reviews.insert(id.0, record.clone());
            Ok(record)
        })
    }

    fn reviews_for_vendor(&self, vendor: VendorId) -> Result<Vec<VendorReview>, RepositoryError> {
        self.read(|tables| {
            tables
                .reviews
                .values()
                .filter(|review| review.vendor_id == vendor)
                .cloned()
                .collect()
        })
    }
}

impl ClickLogRepository for MemoryStore {
    fn insert_click(&self, click: NewClick) -> Result<VendorClickLog, RepositoryError> {
        self.write(|tables| {
            let record = VendorClickLog {
                id: ClickId(tables.next_id()),
                vendor_id: click.vendor_id,
                kind: click.kind,
                clicked_at: click.clicked_at,
            };
            tables.clicks.insert(record.id.0, record.clone());
            Ok(record)
        })
    }

    fn clicks_since(
        &self,
        vendor: VendorId,
        since: DateTime<Utc>,
    ) -> Result<Vec<VendorClickLog>, RepositoryError> {
        self.read(|tables| {
            tables
                .clicks
                .values()
                .filter(|click| click.vendor_id == vendor && click.clicked_at >= since)
                .cloned()
                .collect()
        })
    }
}

impl TransactionRepository for MemoryStore {
    fn insert_transaction(
        &self,
        transaction: NewTransaction,
    ) -> Result<MpesaTransaction, RepositoryError> {
        self.write(|tables| {
            let record = MpesaTransaction {
                id: TransactionId(tables.next_id()),
                phone_number: transaction.phone_number,
                amount: transaction.amount,
                purpose: transaction.purpose,
                vendor_id: transaction.vendor_id,
                order_id: transaction.order_id,
                initiated_by: transaction.initiated_by,
                status: TransactionStatus::Pending,
                checkout_request_id: transaction.checkout_request_id,
                receipt_number: None,
                result_description: None,
                created_at: transaction.created_at,
                updated_at: transaction.created_at,
            };
            tables.transactions.insert(record.id.0, record.clone());
            Ok(record)
        })
    }

    fn update_transaction(&self, transaction: MpesaTransaction) -> Result<(), RepositoryError> {
        self.write(|tables| replace(&mut tables.transactions, transaction.id.0, transaction))
    }

    fn transaction_by_checkout(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<MpesaTransaction>, RepositoryError> {
        self.read(|tables| {
            tables
                .transactions
                .values()
                .find(|tx| tx.checkout_request_id == checkout_request_id)
                .cloned()
        })
    }

    fn list_transactions(&self) -> Result<Vec<MpesaTransaction>, RepositoryError> {
        self.read(|tables| tables.transactions.values().cloned().collect())
    }

    fn transactions_for_order(
        &self,
        order: OrderId,
    ) -> Result<Vec<MpesaTransaction>, RepositoryError> {
        self.read(|tables| {
            tables
                .transactions
                .values()
                .filter(|transaction| transaction.order_id == Some(order))
                .cloned()
                .collect()
        })
    }
}
