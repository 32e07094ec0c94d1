//! Public chef directory.

use crate::{
    api::state::AppState,
    core::chefs::{self, PublicChef},
    errors::Result,
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ChefSearch {
    pub query: Option<String>,
    pub specialty: Option<String>,
}

pub async fn list_chefs(
    State(state): State<AppState>,
    Query(search): Query<ChefSearch>,
) -> Result<Json<Vec<PublicChef>>> {
    Ok(Json(
        chefs::list_public_chefs(&state.db, search.query.as_deref(), search.specialty.as_deref())
            .await?,
    ))
}

pub async fn get_chef(
    State(state): State<AppState>,
    Path(chef_id): Path<i64>,
) -> Result<Json<PublicChef>> {
    Ok(Json(chefs::get_public_chef(&state.db, chef_id).await?))
}
