//! Application configuration loaded from environment variables.
//!
//! Secrets (session key, gateway key, internal bearer secret, model key) are
//! required; everything else has a development default. The resulting
//! `AppConfig` is handed to the components that need it; core functions never
//! read the environment themselves.

use super::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use std::env;
use tracing::info;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub app_base_url: String,

    /// Key for signing session tokens
    pub session_secret: String,
    pub session_ttl_hours: i64,

    /// Gateway secret key, also the webhook HMAC key
    pub paystack_secret_key: String,
    pub paystack_base_url: String,
    pub currency: String,

    /// Bearer secret for the internal chef-assignment endpoint
    pub webhook_secret_key: String,

    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,

    /// Emails are only logged when this is unset
    pub resend_api_key: Option<String>,
    pub resend_base_url: String,
    pub sender_email: String,
    pub admin_email: String,

    pub upload_dir: String,
    pub catalog_path: String,
}

fn required(name: &str) -> Result<String> {
    env::var(name).map_err(|e| Error::Config {
        message: format!("Missing environment variable '{name}': {e}"),
    })
}

fn optional(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

impl AppConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    /// Returns `Error::Config` when a required secret is missing or a numeric
    /// value does not parse.
    pub fn from_env() -> Result<Self> {
        let server_host = optional("SERVER_HOST", "127.0.0.1");
        let server_port = optional("SERVER_PORT", "8080")
            .parse::<u16>()
            .map_err(|e| Error::Config {
                message: format!("Invalid SERVER_PORT: {e}"),
            })?;
        let session_ttl_hours = optional("SESSION_TTL_HOURS", "168")
            .parse::<i64>()
            .map_err(|e| Error::Config {
                message: format!("Invalid SESSION_TTL_HOURS: {e}"),
            })?;
        let app_base_url = optional(
            "APP_BASE_URL",
            &format!("http://{server_host}:{server_port}"),
        );

        let config = Self {
            database_url: optional("DATABASE_URL", DEFAULT_DATABASE_URL),
            session_secret: required("SESSION_SECRET")?,
            session_ttl_hours,
            paystack_secret_key: required("PAYSTACK_SECRET_KEY")?,
            paystack_base_url: optional("PAYSTACK_BASE_URL", "https://api.paystack.co"),
            currency: optional("PAYMENT_CURRENCY", "NGN"),
            webhook_secret_key: required("WEBHOOK_SECRET_KEY")?,
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: optional("GEMINI_MODEL", "gemini-pro"),
            gemini_base_url: optional(
                "GEMINI_BASE_URL",
                "https://generativelanguage.googleapis.com",
            ),
            resend_api_key: env::var("RESEND_API_KEY").ok().filter(|k| !k.is_empty()),
            resend_base_url: optional("RESEND_BASE_URL", "https://api.resend.com"),
            sender_email: optional("SENDER_EMAIL", "onboarding@resend.dev"),
            admin_email: optional("ADMIN_EMAIL", "admin@needachef.ng"),
            upload_dir: optional("UPLOAD_DIR", "uploads"),
            catalog_path: optional("CATALOG_PATH", "catalog.toml"),
            server_host,
            server_port,
            app_base_url,
        };

        info!(
            host = %config.server_host,
            port = config.server_port,
            email_delivery = config.resend_api_key.is_some(),
            "Application configuration loaded."
        );
        Ok(config)
    }

    /// Address the HTTP server binds to.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}
