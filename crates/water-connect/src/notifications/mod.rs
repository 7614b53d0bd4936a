//! Outbound email and the staff notification sent when an issue is reported.

mod dispatch;
mod http;
mod mailer;

pub use dispatch::{issue_email, IssueNotifier};
pub use http::HttpMailer;
pub use mailer::{EmailMessage, LogMailer, MailError, Mailer};
