//! Reqwest-backed transactional mail adapter.
//!
//! Speaks the Brevo v3 `/smtp/email` request shape: a JSON body with sender,
//! recipient list, subject, and text content, authenticated by an `api-key`
//! header.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use super::mailer::{EmailMessage, MailError, Mailer};

pub struct HttpMailer {
    client: Client,
    endpoint: String,
    api_key: String,
    sender: String,
}

#[derive(Serialize)]
struct Address<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    sender: Address<'a>,
    to: Vec<Address<'a>>,
    subject: &'a str,
    text_content: &'a str,
}

impl HttpMailer {
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        sender: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            sender: sender.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), MailError> {
        let request = SendRequest {
            sender: Address {
                email: &self.sender,
            },
            to: message
                .recipients
                .iter()
                .map(|email| Address {
                    email: email.as_str(),
                })
                .collect(),
            subject: &message.subject,
            text_content: &message.body,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .header("api-key", self.api_key.as_str())
            .header(reqwest::header::ACCEPT, "application/json")
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            tracing::debug!(subject = %message.subject, "email accepted by provider");
            return Ok(());
        }
        let body = response.text().await.unwrap_or_default();
        Err(MailError::Rejected {
            status: status.as_u16(),
            body,
        })
    }
}
