//! Gateway webhook endpoint.

use crate::{
    api::state::AppState,
    core::payment::{self, SIGNATURE_HEADER},
    errors::Error,
};
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{error, info};

fn acknowledged() -> Response {
    (StatusCode::OK, Json(json!({ "received": true }))).into_response()
}

/// Receives gateway callbacks.
///
/// Bad signatures and malformed bodies are refused. Once a delivery is
/// verified, internal failures are logged and still acknowledged with 200 so
/// the gateway does not redeliver an event whose payment state may already
/// be committed.
pub async fn paystack_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok());

    match payment::handle_webhook(
        &state.db,
        &state.tasks,
        &state.config.paystack_secret_key,
        &body,
        signature,
    )
    .await
    {
        Ok(outcome) => {
            info!(?outcome, "Webhook processed");
            acknowledged()
        }
        Err(e @ (Error::SignatureMismatch | Error::Json(_))) => e.into_response(),
        Err(e) => {
            error!("Webhook processing failed after verification: {}", e);
            acknowledged()
        }
    }
}
