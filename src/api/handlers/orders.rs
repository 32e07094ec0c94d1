//! Shop checkout and order history.

use crate::{
    api::{extractors::AuthUser, state::AppState},
    core::orders::{self, CheckoutRequest, OrderCheckout},
    entities::order,
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

pub async fn checkout(
    State(state): State<AppState>,
    AuthUser(customer): AuthUser,
    Json(request): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderCheckout>)> {
    let checkout = orders::create_checkout(
        &state.db,
        state.gateway.as_ref(),
        &state.config.currency,
        &customer,
        request,
    )
    .await?;
    Ok((StatusCode::CREATED, Json(checkout)))
}

pub async fn list_my_orders(
    State(state): State<AppState>,
    AuthUser(customer): AuthUser,
) -> Result<Json<Vec<order::Model>>> {
    Ok(Json(orders::list_orders_for_user(&state.db, customer.id).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(order_id): Path<i64>,
) -> Result<Json<order::Model>> {
    Ok(Json(orders::get_order_for(&state.db, &caller, order_id).await?))
}
