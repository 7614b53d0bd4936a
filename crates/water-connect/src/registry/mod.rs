//! Water source registry: sources, resident issue reports, and repair logs.

mod domain;
mod export;
mod forms;
mod router;
mod service;
mod workflow;

#[cfg(test)]
mod tests;

pub use domain::{
    sort_by_urgency, IssueId, IssueReport, NewIssueReport, NewRepairLog, NewWaterSource, Priority,
    RepairId, RepairLog, SourceDetail, SourceId, SourceStatus, SourceSummary, SourceType,
    WaterSource,
};
pub use export::{write_open_issues, OPEN_ISSUES_FILENAME};
pub use forms::{IssueInput, IssueReportForm, RepairInput, RepairLogForm, SourceInput, WaterSourceForm};
pub use router::registry_router;
pub use service::SourceRegistryService;
pub use workflow::{derive_status, SourceEvent};
