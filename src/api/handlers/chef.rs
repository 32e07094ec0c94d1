//! Chef-facing endpoints: applying, working assigned bookings and keeping a portfolio.

use crate::{
    api::{
        extractors::{AuthUser, ChefUser},
        state::AppState,
    },
    core::{
        applications::{self, NewApplication},
        booking::{self, BookingUpdate},
        chefs, notifications,
    },
    entities::{BookingStatus, booking as booking_entity, chef_application, chef_profile},
    errors::{Error, Result},
    services::storage::sanitize_file_name,
    tasks::BackgroundTask,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct ChefStatusUpdate {
    pub status: BookingStatus,
}

#[derive(Debug, Deserialize)]
pub struct PortfolioUploadParams {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PortfolioImages {
    pub images: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioUpload {
    pub url: String,
    pub portfolio_images: Vec<String>,
}

pub async fn submit_application(
    State(state): State<AppState>,
    AuthUser(applicant): AuthUser,
    Json(input): Json<NewApplication>,
) -> Result<(StatusCode, Json<chef_application::Model>)> {
    let application =
        applications::submit_application(&state.db, &state.tasks, &applicant, input).await?;
    state.tasks.dispatch(BackgroundTask::SendEmail(
        notifications::new_application_alert(&state.config.admin_email, &application),
    ));
    Ok((StatusCode::CREATED, Json(application)))
}

pub async fn my_application(
    State(state): State<AppState>,
    AuthUser(applicant): AuthUser,
) -> Result<Json<chef_application::Model>> {
    applications::get_application_for_user(&state.db, applicant.id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("Application", format!("user {}", applicant.id)))
}

pub async fn my_bookings(
    State(state): State<AppState>,
    ChefUser(chef): ChefUser,
) -> Result<Json<Vec<booking_entity::Model>>> {
    Ok(Json(booking::list_bookings_for_chef(&state.db, chef.id).await?))
}

pub async fn update_booking(
    State(state): State<AppState>,
    ChefUser(chef): ChefUser,
    Path(booking_id): Path<i64>,
    Json(update): Json<ChefStatusUpdate>,
) -> Result<Json<booking_entity::Model>> {
    let updated = booking::update_booking(
        &state.db,
        &chef,
        booking_id,
        BookingUpdate {
            status: Some(update.status),
            chef_id: None,
        },
    )
    .await?;
    Ok(Json(updated))
}

/// Stores an image and appends its URL to the chef's portfolio.
pub async fn upload_portfolio_image(
    State(state): State<AppState>,
    ChefUser(chef): ChefUser,
    Query(params): Query<PortfolioUploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<PortfolioUpload>)> {
    if body.is_empty() {
        return Err(Error::invalid_input("Upload body is empty"));
    }
    let name = format!("portfolio_{}_{}", chef.id, sanitize_file_name(&params.name)?);
    let blob = state.blobs.put(&name, &body).await?;
    let profile = chefs::add_portfolio_image(&state.db, chef.id, &blob.url).await?;
    info!(chef_id = chef.id, path = %blob.path, "Portfolio image uploaded");
    Ok((
        StatusCode::CREATED,
        Json(PortfolioUpload {
            url: blob.url,
            portfolio_images: profile.portfolio_images.0,
        }),
    ))
}

pub async fn set_portfolio(
    State(state): State<AppState>,
    ChefUser(chef): ChefUser,
    Json(update): Json<PortfolioImages>,
) -> Result<Json<chef_profile::Model>> {
    Ok(Json(
        chefs::set_portfolio_images(&state.db, chef.id, update.images).await?,
    ))
}
