use std::sync::Arc;

use super::mailer::{EmailMessage, Mailer};
use crate::accounts::Account;
use crate::registry::{IssueReport, WaterSource};

/// Emails staff about new issue reports without holding up the request.
#[derive(Clone)]
pub struct IssueNotifier {
    mailer: Arc<dyn Mailer>,
}

impl IssueNotifier {
    pub fn new(mailer: Arc<dyn Mailer>) -> Self {
        Self { mailer }
    }

    /// Spawns the send on the current runtime; outside a runtime it is skipped.
    pub fn issue_reported(
        &self,
        source: &WaterSource,
        issue: &IssueReport,
        reporter: Option<&Account>,
        staff: &[Account],
    ) {
        let Some(message) = issue_email(source, issue, reporter, staff) else {
            tracing::debug!(issue_id = %issue.id, "no staff addresses, skipping notification");
            return;
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(issue_id = %issue.id, "no async runtime, notification dropped");
            return;
        };

        let mailer = Arc::clone(&self.mailer);
        let issue_id = issue.id;
        runtime.spawn(async move {
            if let Err(err) = mailer.send(message).await {
                tracing::warn!(%issue_id, error = %err, "failed to send issue notification");
            }
        });
    }
}

/// Builds the staff email, or `None` when no staff member has an address.
pub fn issue_email(
    source: &WaterSource,
    issue: &IssueReport,
    reporter: Option<&Account>,
    staff: &[Account],
) -> Option<EmailMessage> {
    let recipients: Vec<String> = staff
        .iter()
        .map(|account| account.email.trim())
        .filter(|email| !email.is_empty())
        .map(str::to_string)
        .collect();
    if recipients.is_empty() {
        return None;
    }

    let reporter = reporter.map_or_else(|| "Anonymous".to_string(), Account::display_name);
    let body = format!(
        "A new issue has been reported.\n\n\
         Source: {source}\n\
         Priority: {priority}\n\
         Description: {description}\n\
         Reported by: {reporter}\n\
         Time: {time}\n",
        source = source.name,
        priority = issue.priority.label(),
        description = issue.description,
        time = issue.reported_at.format("%Y-%m-%d %H:%M UTC"),
    );

    Some(EmailMessage {
        subject: format!("New issue reported: {}", source.name),
        body,
        recipients,
    })
}
