//! Payment gateway client.
//!
//! Talks to a Paystack-compatible REST API: `POST /transaction/initialize`
//! starts a charge and `GET /transaction/verify/{reference}` reports its
//! outcome. Amounts cross this boundary in minor units (kobo/cents).

use crate::errors::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::{debug, instrument};

const SERVICE: &str = "payment gateway";

/// Converts a major-unit amount to the gateway's minor units.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn to_minor_units(amount: f64) -> i64 {
    (amount * 100.0).round() as i64
}

/// Converts a gateway minor-unit amount back to major units.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn from_minor_units(amount: i64) -> f64 {
    amount as f64 / 100.0
}

/// Identifiers echoed back by the gateway in verify responses and webhooks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargeMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_id")]
    pub booking_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_id")]
    pub order_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "lenient_id")]
    pub user_id: Option<i64>,
}

/// Accepts ids sent either as JSON numbers or as numeric strings.
fn lenient_id<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// The gateway sends `""` instead of an object when no metadata was attached.
pub(crate) fn lenient_metadata<'de, D>(
    deserializer: D,
) -> std::result::Result<ChargeMetadata, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match value {
        Value::Object(_) => serde_json::from_value(value).map_err(serde::de::Error::custom),
        _ => Ok(ChargeMetadata::default()),
    }
}

/// Request to start a new charge
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChargeRequest {
    pub email: String,
    /// Amount in minor units
    pub amount: i64,
    pub currency: String,
    pub metadata: ChargeMetadata,
}

/// Handles returned when a charge is initialized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeInit {
    pub authorization_url: String,
    #[serde(default)]
    pub access_code: String,
    pub reference: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargeOutcome {
    Success,
    Failure,
}

/// Outcome of a charge as reported by the verify endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct ChargeVerification {
    pub outcome: ChargeOutcome,
    /// Gateway-assigned transaction id
    pub transaction_id: String,
    pub reference: String,
    /// Amount in minor units
    pub amount: i64,
    pub metadata: ChargeMetadata,
}

/// External payment gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Starts a charge and returns the handles the client needs to pay.
    async fn initialize(&self, request: &ChargeRequest) -> Result<ChargeInit>;

    /// Looks up the outcome of a charge by reference.
    async fn verify(&self, reference: &str) -> Result<ChargeVerification>;
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct VerifyData {
    id: Value,
    status: String,
    #[serde(default)]
    reference: String,
    #[serde(default)]
    amount: i64,
    #[serde(default, deserialize_with = "lenient_metadata")]
    metadata: ChargeMetadata,
}

impl From<VerifyData> for ChargeVerification {
    fn from(data: VerifyData) -> Self {
        let transaction_id = match data.id {
            Value::String(s) => s,
            other => other.to_string(),
        };
        Self {
            outcome: if data.status == "success" {
                ChargeOutcome::Success
            } else {
                ChargeOutcome::Failure
            },
            transaction_id,
            reference: data.reference,
            amount: data.amount,
            metadata: data.metadata,
        }
    }
}

/// Paystack REST client
#[derive(Clone)]
pub struct PaystackClient {
    client: Client,
    secret_key: String,
    base_url: String,
}

impl PaystackClient {
    #[must_use]
    pub fn new(secret_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            secret_key,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn read_response<T: for<'de> Deserialize<'de>>(
        response: reqwest::Response,
    ) -> Result<T> {
        match response.status() {
            StatusCode::OK => {
                let parsed = response
                    .json::<ApiResponse<T>>()
                    .await
                    .map_err(|e| Error::upstream(SERVICE, format!("unreadable response: {e}")))?;
                if !parsed.status {
                    return Err(Error::upstream(SERVICE, parsed.message));
                }
                parsed
                    .data
                    .ok_or_else(|| Error::upstream(SERVICE, "response carried no data"))
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                Err(Error::upstream(SERVICE, format!("HTTP {status}: {body}")))
            }
        }
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    #[instrument(skip(self, request), fields(amount = request.amount, currency = %request.currency))]
    async fn initialize(&self, request: &ChargeRequest) -> Result<ChargeInit> {
        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(request)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e))?;

        let init: ChargeInit = Self::read_response(response).await?;
        debug!(reference = %init.reference, "Charge initialized");
        Ok(init)
    }

    #[instrument(skip(self))]
    async fn verify(&self, reference: &str) -> Result<ChargeVerification> {
        let response = self
            .client
            .get(format!("{}/transaction/verify/{reference}", self.base_url))
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| Error::upstream(SERVICE, e))?;

        let data: VerifyData = Self::read_response(response).await?;
        Ok(data.into())
    }
}
