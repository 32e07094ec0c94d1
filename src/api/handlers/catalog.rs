//! Public catalog endpoints.

use crate::{
    api::state::AppState,
    core::catalog,
    entities::{product, service},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, State},
};

pub async fn list_services(State(state): State<AppState>) -> Result<Json<Vec<service::Model>>> {
    Ok(Json(catalog::list_services(&state.db).await?))
}

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<product::Model>>> {
    Ok(Json(catalog::get_all_active_products(&state.db).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> Result<Json<product::Model>> {
    catalog::get_active_product_by_id(&state.db, product_id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("Product", product_id))
}
