use std::sync::Arc;

use axum::Router;

use crate::notifications::{IssueNotifier, Mailer};
use crate::registry::{registry_router, IssueReportForm, SourceRegistryService, WaterSourceForm};
use crate::store::MemoryStore;
use crate::test_support::RecordingMailer;

pub(super) struct Harness {
    pub(super) store: Arc<MemoryStore>,
    pub(super) mailer: RecordingMailer,
    pub(super) service: Arc<SourceRegistryService<MemoryStore>>,
}

pub(super) fn harness() -> Harness {
    let mailer = RecordingMailer::default();
    harness_with_mailer(mailer.clone(), Arc::new(mailer.clone()))
}

pub(super) fn harness_with_mailer(recorder: RecordingMailer, mailer: Arc<dyn Mailer>) -> Harness {
    let store = Arc::new(MemoryStore::new());
    let service = Arc::new(SourceRegistryService::new(
        Arc::clone(&store),
        IssueNotifier::new(mailer),
    ));
    Harness {
        store,
        mailer: recorder,
        service,
    }
}

pub(super) fn router(harness: &Harness) -> Router {
    registry_router(Arc::clone(&harness.service))
}

pub(super) fn source_form(name: &str) -> WaterSourceForm {
    WaterSourceForm {
        name: Some(name.to_string()),
        source_type: Some("borehole".to_string()),
        latitude: Some(rust_decimal::Decimal::new(-1_300_000, 6)),
        longitude: Some(rust_decimal::Decimal::new(36_800_000, 6)),
        ..WaterSourceForm::default()
    }
}

pub(super) fn issue_form(source: u64, priority: u8) -> IssueReportForm {
    IssueReportForm {
        water_source: Some(source),
        description: Some("No water since morning".to_string()),
        priority_level: Some(priority),
    }
}
