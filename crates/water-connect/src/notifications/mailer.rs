use async_trait::async_trait;
use serde::Serialize;

/// Plain-text email addressed to one or more recipients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub recipients: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum MailError {
    #[error("mail transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail provider rejected the message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Outbound email port.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError>;
}

/// Writes messages to the log instead of delivering them.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        tracing::info!(
            subject = %message.subject,
            recipients = ?message.recipients,
            body = %message.body,
            "email not delivered, no mail API key configured"
        );
        Ok(())
    }
}
