use std::sync::Arc;

use chrono::Utc;

use super::dashboard::{
    click_window_start, resident_dashboard, staff_dashboard, vendor_dashboard, Dashboard,
};
use super::map::{map_points, MapPoint};
use super::overview::{build_overview, Overview};
use crate::accounts::{require_account, AccountId};
use crate::error::ServiceError;
use crate::store::EntityStore;

/// Read-only aggregate views across the registry and the marketplace.
pub struct ReportService<S> {
    store: Arc<S>,
}

impl<S> ReportService<S>
where
    S: EntityStore + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn overview(&self) -> Result<Overview, ServiceError> {
        let sources = self.store.list_sources()?;
        let issues = self.store.list_issues()?;
        Ok(build_overview(sources, &issues))
    }

    pub fn map_data(&self) -> Result<Vec<MapPoint>, ServiceError> {
        let sources = self.store.list_sources()?;
        let vendors = self.store.list_vendors()?;
        Ok(map_points(&sources, &vendors))
    }

    /// Staff see the registry backlog; vendor owners their analytics; everyone
    /// else their own reports and orders.
    pub fn dashboard(&self, actor: Option<AccountId>) -> Result<Dashboard, ServiceError> {
        let account = require_account(self.store.as_ref(), actor)?;

        if account.is_staff {
            let sources = self.store.list_sources()?;
            let issues = self.store.list_issues()?;
            return Ok(Dashboard::Staff(staff_dashboard(sources, issues)));
        }

        if let Some(vendor) = self.store.vendor_for_owner(account.id)? {
            let clicks = self
                .store
                .clicks_since(vendor.id, click_window_start(Utc::now()))?;
            let orders = self.store.orders_for_vendor(vendor.id)?;
            let reviews = self.store.reviews_for_vendor(vendor.id)?;
            return Ok(Dashboard::Vendor(vendor_dashboard(
                vendor, &clicks, orders, &reviews,
            )));
        }

        let issues = self.store.issues_by_reporter(account.id)?;
        let orders = self.store.orders_for_customer(account.id)?;
        Ok(Dashboard::Resident(resident_dashboard(issues, orders)))
    }
}
