//! Outbound email delivery.

use crate::errors::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{info, instrument};

const SERVICE: &str = "email";

/// A rendered message ready to send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html: String,
}

/// Delivers email, returning the provider's delivery id.
#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, from: &str, message: &EmailMessage) -> Result<String>;
}

#[derive(Debug, Serialize)]
struct SendRequest<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    id: String,
}

/// Resend HTTP API client
#[derive(Clone)]
pub struct ResendClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl ResendClient {
    #[must_use]
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl EmailSender for ResendClient {
    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    async fn send(&self, from: &str, message: &EmailMessage) -> Result<String> {
        let request = SendRequest {
            from,
            to: [message.to.as_str()],
            subject: &message.subject,
            html: &message.html,
        };

        let response = self
            .client
            .post(format!("{}/emails", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::upstream(SERVICE, format!("HTTP {status}: {body}")));
        }

        let sent = response
            .json::<SendResponse>()
            .await
            .map_err(|e| Error::upstream(SERVICE, format!("unreadable response: {e}")))?;
        Ok(sent.id)
    }
}

/// Used when no email provider is configured: messages are only logged.
#[derive(Debug, Default)]
pub struct LogEmailSender {
    sent: AtomicU64,
}

#[async_trait]
impl EmailSender for LogEmailSender {
    async fn send(&self, from: &str, message: &EmailMessage) -> Result<String> {
        let n = self.sent.fetch_add(1, Ordering::Relaxed) + 1;
        info!(
            from,
            to = %message.to,
            subject = %message.subject,
            "Email provider not configured, logging message instead of sending"
        );
        Ok(format!("logged-{n}"))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[tokio::test]
    async fn test_log_sender_returns_sequential_ids() {
        let sender = LogEmailSender::default();
        let message = EmailMessage {
            to: "client@example.com".to_string(),
            subject: "Booking received".to_string(),
            html: "<p>hi</p>".to_string(),
        };
        assert_eq!(sender.send("noreply@example.com", &message).await.unwrap(), "logged-1");
        assert_eq!(sender.send("noreply@example.com", &message).await.unwrap(), "logged-2");
    }

    #[test]
    fn test_send_request_shape() {
        let request = SendRequest {
            from: "a@example.com",
            to: ["b@example.com"],
            subject: "s",
            html: "<p></p>",
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["to"], serde_json::json!(["b@example.com"]));
    }
}
