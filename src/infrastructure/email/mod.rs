//! Email Module
//!
//! Outbound mail behind a single-call trait. The production
//! implementation talks to the Sendinblue transactional HTTP API; tests
//! substitute a recording fake.

pub mod templates;

pub use templates::MailContent;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, error, info, instrument};

use crate::config::MailerSettings;
use crate::shared::error::AppError;

const SENDINBLUE_API_URL: &str = "https://api.sendinblue.com/v3/smtp/email";

/// Trait for outbound mail.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send one mail to one recipient.
    async fn send(&self, to_name: &str, to_email: &str, mail: &MailContent)
        -> Result<(), AppError>;
}

#[derive(Debug, Clone, Serialize)]
struct Party {
    name: String,
    email: String,
}

#[derive(Debug, Serialize)]
struct SendRequest {
    sender: Party,
    to: Vec<Party>,
    #[serde(rename = "htmlContent")]
    html_content: String,
    #[serde(rename = "textContent")]
    text_content: String,
    subject: String,
}

/// Sendinblue HTTP API mailer.
pub struct SendinblueMailer {
    sender: Party,
    api_key: String,
    http_client: reqwest::Client,
}

impl SendinblueMailer {
    pub fn new(settings: &MailerSettings) -> Self {
        info!(sender = %settings.sender_email, "Initializing Sendinblue mailer");
        Self {
            sender: Party {
                name: settings.sender_name.clone(),
                email: settings.sender_email.clone(),
            },
            api_key: settings.api_key.clone(),
            http_client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailSender for SendinblueMailer {
    #[instrument(skip(self, mail), fields(subject = %mail.subject))]
    async fn send(
        &self,
        to_name: &str,
        to_email: &str,
        mail: &MailContent,
    ) -> Result<(), AppError> {
        let body = SendRequest {
            sender: self.sender.clone(),
            to: vec![Party {
                name: to_name.to_string(),
                email: to_email.to_string(),
            }],
            html_content: mail.html.clone(),
            text_content: mail.text.clone(),
            subject: mail.subject.clone(),
        };

        debug!("Sending HTTP request to mail API");
        let response = self
            .http_client
            .post(SENDINBLUE_API_URL)
            .header("Accept", "application/json")
            .header("api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("mail request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response.text().await.unwrap_or_default();
            error!(%status, %error_body, "Mail API returned error");
            return Err(AppError::Internal(format!(
                "mail API returned {}",
                status
            )));
        }

        Ok(())
    }
}
