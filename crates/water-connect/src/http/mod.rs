//! HTTP surface: request extractors and the composed JSON API router.

mod actor;
mod extract;

pub use actor::{ActorId, ACCOUNT_HEADER};
pub use extract::{FormBody, IdPath};

use std::sync::Arc;

use axum::Router;

use crate::accounts::{account_router, AccountService};
use crate::marketplace::{marketplace_router, MarketplaceService};
use crate::notifications::{IssueNotifier, Mailer};
use crate::payments::{payments_router, PaymentGateway, PaymentService};
use crate::registry::{registry_router, SourceRegistryService};
use crate::reports::{reports_router, ReportService};
use crate::store::EntityStore;

/// Every domain router over one shared store.
pub fn api_router<S>(store: Arc<S>, mailer: Arc<dyn Mailer>, gateway: Arc<dyn PaymentGateway>) -> Router
where
    S: EntityStore + 'static,
{
    let accounts = Arc::new(AccountService::new(Arc::clone(&store)));
    let registry = Arc::new(SourceRegistryService::new(
        Arc::clone(&store),
        IssueNotifier::new(mailer),
    ));
    let marketplace = Arc::new(MarketplaceService::new(Arc::clone(&store)));
    let payments = Arc::new(PaymentService::new(Arc::clone(&store), gateway));
    let reports = Arc::new(ReportService::new(store));

    Router::new()
        .merge(account_router(accounts))
        .merge(registry_router(registry))
        .merge(marketplace_router(marketplace))
        .merge(payments_router(payments))
        .merge(reports_router(reports))
}
