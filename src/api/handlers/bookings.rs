//! Client booking endpoints: create, list, retry and verify payment.

use crate::{
    api::{extractors::AuthUser, state::AppState},
    core::{
        booking::{self, BookingCheckout, NewBooking},
        payment,
    },
    entities::booking as booking_entity,
    errors::Result,
};
use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RetryPaymentRequest {
    pub reference: String,
}

#[derive(Debug, Deserialize)]
pub struct VerifyQuery {
    #[serde(rename = "ref")]
    pub reference: String,
}

pub async fn create_booking(
    State(state): State<AppState>,
    AuthUser(client): AuthUser,
    Json(input): Json<NewBooking>,
) -> Result<(StatusCode, Json<BookingCheckout>)> {
    let checkout = booking::create_booking(
        &state.db,
        state.gateway.as_ref(),
        &state.config.currency,
        &client,
        input,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(checkout)))
}

pub async fn list_my_bookings(
    State(state): State<AppState>,
    AuthUser(client): AuthUser,
) -> Result<Json<Vec<booking_entity::Model>>> {
    Ok(Json(
        booking::list_bookings_for_client(&state.db, client.id).await?,
    ))
}

pub async fn retry_payment(
    State(state): State<AppState>,
    AuthUser(client): AuthUser,
    Json(request): Json<RetryPaymentRequest>,
) -> Result<Json<BookingCheckout>> {
    let checkout = booking::retry_payment(
        &state.db,
        state.gateway.as_ref(),
        &state.config.currency,
        &client,
        &request.reference,
    )
    .await?;
    Ok(Json(checkout))
}

/// Client poll after returning from the gateway's checkout page.
pub async fn verify_payment(
    State(state): State<AppState>,
    Query(query): Query<VerifyQuery>,
) -> Result<Json<booking_entity::Model>> {
    let booking = payment::verify_payment(
        &state.db,
        state.gateway.as_ref(),
        &state.tasks,
        &query.reference,
    )
    .await?;
    Ok(Json(booking))
}
