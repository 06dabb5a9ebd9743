use async_trait::async_trait;
use serde::Serialize;

use crate::core::error::{AppError, Result};

/// A rendered email ready for delivery
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivery backend for outbound email
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Posts messages as JSON to an HTTP mail relay
pub struct HttpMailer {
    http_client: reqwest::Client,
    relay_url: String,
    relay_token: Option<String>,
}

impl HttpMailer {
    pub fn new(relay_url: String, relay_token: Option<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            relay_url,
            relay_token,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        let mut request = self.http_client.post(&self.relay_url).json(message);
        if let Some(token) = &self.relay_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("Failed to reach mail relay: {}", e);
            AppError::ExternalServiceError(format!("Failed to reach mail relay: {}", e))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Mail relay error: HTTP {} - {}", status, body);
            return Err(AppError::ExternalServiceError(format!(
                "Mail relay error: HTTP {}",
                status
            )));
        }

        Ok(())
    }
}

/// Logs messages instead of delivering them. Used when no relay is configured.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: &EmailMessage) -> Result<()> {
        tracing::info!(
            to = %message.to,
            subject = %message.subject,
            "Email delivery disabled, message not sent"
        );
        Ok(())
    }
}
