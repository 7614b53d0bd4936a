use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;

use super::domain::{
    sort_by_urgency, IssueId, IssueReport, NewIssueReport, NewRepairLog, NewWaterSource,
    RepairLog, SourceDetail, SourceId, SourceSummary, WaterSource,
};
use super::export::write_open_issues;
use super::forms::{IssueReportForm, RepairLogForm, WaterSourceForm};
use super::workflow::{derive_status, SourceEvent};
use crate::accounts::{require_account, require_staff, resolve_actor, AccountId};
use crate::error::ServiceError;
use crate::forms::{FieldErrors, INVALID_CHOICE};
use crate::notifications::IssueNotifier;
use crate::store::RegistryStore;

/// Water sources, their issue reports, and repair logs.
pub struct SourceRegistryService<S> {
    store: Arc<S>,
    notifier: IssueNotifier,
}

impl<S> SourceRegistryService<S>
where
    S: RegistryStore + 'static,
{
    pub fn new(store: Arc<S>, notifier: IssueNotifier) -> Self {
        Self { store, notifier }
    }

    /// All sources by name, each with its number of unresolved issues.
    pub fn list_sources(&self) -> Result<Vec<SourceSummary>, ServiceError> {
        let mut sources = self.store.list_sources()?;
        sources.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let mut open: HashMap<SourceId, usize> = HashMap::new();
        for issue in self.store.list_issues()? {
            if !issue.is_resolved {
                *open.entry(issue.source_id).or_default() += 1;
            }
        }

        Ok(sources
            .into_iter()
            .map(|source| {
                let count = open.get(&source.id).copied().unwrap_or_default();
                SourceSummary::new(source, count)
            })
            .collect())
    }

    pub fn source_detail(&self, id: SourceId) -> Result<SourceDetail, ServiceError> {
        let source = self.fetch_source(id)?;

        let mut open_issues: Vec<IssueReport> = self
            .store
            .issues_for_source(id)?
            .into_iter()
            .filter(|issue| !issue.is_resolved)
            .collect();
        open_issues.sort_by(|a, b| b.reported_at.cmp(&a.reported_at).then(b.id.cmp(&a.id)));

        let mut repair_history = self.store.repairs_for_source(id)?;
        repair_history.sort_by(|a, b| b.repair_date.cmp(&a.repair_date).then(b.id.cmp(&a.id)));

        let summary = SourceSummary::new(source, open_issues.len());
        Ok(SourceDetail {
            summary,
            open_issues,
            repair_history,
        })
    }

    pub fn create_source(
        &self,
        actor: Option<AccountId>,
        form: WaterSourceForm,
    ) -> Result<WaterSource, ServiceError> {
        let account = require_account(self.store.as_ref(), actor)?;
        let input = form.clean()?;
        let now = Utc::now();

        let source = self.store.insert_source(NewWaterSource {
            name: input.name,
            source_type: input.source_type,
            latitude: input.latitude,
            longitude: input.longitude,
            status: input.status.unwrap_or_default(),
            is_verified: input.is_verified.unwrap_or(false),
            created_by: Some(account.id),
            installation_date: input.installation_date.unwrap_or_else(|| now.date_naive()),
            description: input.description,
            last_updated: now,
        })?;
        tracing::info!(source_id = %source.id, created_by = %account.id, "water source created");
        Ok(source)
    }

    /// Omitted optional fields keep their stored values.
    pub fn update_source(
        &self,
        actor: Option<AccountId>,
        id: SourceId,
        form: WaterSourceForm,
    ) -> Result<WaterSource, ServiceError> {
        let account = require_account(self.store.as_ref(), actor)?;
        let mut source = self.fetch_source(id)?;
        if !source.can_be_edited_by(&account) {
            return Err(ServiceError::PermissionDenied(
                "You do not have permission to edit this source.",
            ));
        }
        let input = form.clean()?;

        source.name = input.name;
        source.source_type = input.source_type;
        source.latitude = input.latitude;
        source.longitude = input.longitude;
        source.status = input.status.unwrap_or(source.status);
        source.is_verified = input.is_verified.unwrap_or(source.is_verified);
        source.description = input.description;
        source.installation_date = input.installation_date.unwrap_or(source.installation_date);
        source.last_updated = Utc::now();

        self.store.update_source(source.clone())?;
        Ok(source)
    }

    pub fn delete_source(&self, actor: Option<AccountId>, id: SourceId) -> Result<(), ServiceError> {
        let account = require_account(self.store.as_ref(), actor)?;
        let source = self.fetch_source(id)?;
        if !source.can_be_deleted_by(&account) {
            return Err(ServiceError::PermissionDenied(
                "You do not have permission to delete this source.",
            ));
        }
        self.store.delete_source(id)?;
        tracing::info!(source_id = %id, deleted_by = %account.id, "water source deleted");
        Ok(())
    }

    /// Records an issue, applies the status workflow, then emails staff.
    pub fn submit_issue(
        &self,
        actor: Option<AccountId>,
        form: IssueReportForm,
    ) -> Result<IssueReport, ServiceError> {
        let reporter = resolve_actor(self.store.as_ref(), actor)?;
        let input = form.clean()?;
        let Some(source) = self.store.fetch_source(input.source_id)? else {
            let mut errors = FieldErrors::new();
            errors.add("water_source", INVALID_CHOICE);
            return Err(errors.into());
        };

        let issue = self.store.insert_issue(NewIssueReport {
            source_id: source.id,
            reporter: reporter.as_ref().map(|account| account.id),
            description: input.description,
            priority: input.priority,
            reported_at: Utc::now(),
        })?;
        tracing::info!(
            issue_id = %issue.id,
            source_id = %source.id,
            priority = issue.priority.level(),
            "issue reported"
        );

        let source = self.apply_event(
            source,
            SourceEvent::IssueReported {
                priority: issue.priority,
            },
        )?;

        let staff = self.store.staff_accounts()?;
        self.notifier
            .issue_reported(&source, &issue, reporter.as_ref(), &staff);
        Ok(issue)
    }

    pub fn toggle_issue_resolved(
        &self,
        actor: Option<AccountId>,
        id: IssueId,
    ) -> Result<IssueReport, ServiceError> {
        require_staff(self.store.as_ref(), actor)?;
        let mut issue = self
            .store
            .fetch_issue(id)?
            .ok_or_else(|| ServiceError::not_found("issue report", id.0))?;
        issue.is_resolved = !issue.is_resolved;
        self.store.update_issue(issue.clone())?;
        Ok(issue)
    }

    /// Logs a repair by the actor and returns the source to operation.
    pub fn log_repair(
        &self,
        actor: Option<AccountId>,
        source_id: SourceId,
        form: RepairLogForm,
    ) -> Result<RepairLog, ServiceError> {
        let technician = require_account(self.store.as_ref(), actor)?;
        let source = self.fetch_source(source_id)?;
        let input = form.clean()?;

        let repair = self.store.insert_repair(NewRepairLog {
            source_id,
            technician: Some(technician.id),
            repair_date: input.repair_date.unwrap_or_else(|| Utc::now().date_naive()),
            work_done: input.work_done,
            cost: input.cost,
        })?;
        tracing::info!(repair_id = %repair.id, %source_id, "repair logged");

        self.apply_event(source, SourceEvent::RepairLogged)?;
        Ok(repair)
    }

    /// Unresolved issues, most urgent first. Staff only.
    pub fn open_issues(&self, actor: Option<AccountId>) -> Result<Vec<IssueReport>, ServiceError> {
        require_staff(self.store.as_ref(), actor)?;
        let mut issues: Vec<IssueReport> = self
            .store
            .list_issues()?
            .into_iter()
            .filter(|issue| !issue.is_resolved)
            .collect();
        sort_by_urgency(&mut issues);
        Ok(issues)
    }

    pub fn export_open_issues(&self, actor: Option<AccountId>) -> Result<Vec<u8>, ServiceError> {
        require_staff(self.store.as_ref(), actor)?;
        self.open_issues_csv()
    }

    /// CSV of unresolved issues without an actor check, for operator tooling.
    pub fn open_issues_csv(&self) -> Result<Vec<u8>, ServiceError> {
        let issues = self.store.list_issues()?;
        let sources = self.store.list_sources()?;
        let mut buffer = Vec::new();
        write_open_issues(&mut buffer, &issues, &sources)
            .map_err(|err| ServiceError::Export(err.to_string()))?;
        Ok(buffer)
    }

    fn fetch_source(&self, id: SourceId) -> Result<WaterSource, ServiceError> {
        self.store
            .fetch_source(id)?
            .ok_or_else(|| ServiceError::not_found("water source", id.0))
    }

    fn apply_event(
        &self,
        mut source: WaterSource,
        event: SourceEvent,
    ) -> Result<WaterSource, ServiceError> {
        if let Some(status) = derive_status(event) {
            if source.status != status {
                tracing::info!(
                    source_id = %source.id,
                    from = source.status.label(),
                    to = status.label(),
                    "source status changed"
                );
            }
            source.status = status;
            source.last_updated = Utc::now();
            self.store.update_source(source.clone())?;
        }
        Ok(source)
    }
}
