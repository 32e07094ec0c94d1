//! Raw file uploads (resumes, portfolio images).

use crate::{
    api::{extractors::AuthUser, state::AppState},
    errors::{Error, Result},
    services::StoredBlob,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct UploadParams {
    /// Original file name; only its last path segment is kept
    pub name: String,
}

pub async fn upload(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Query(params): Query<UploadParams>,
    body: Bytes,
) -> Result<(StatusCode, Json<StoredBlob>)> {
    if body.is_empty() {
        return Err(Error::invalid_input("Upload body is empty"));
    }
    let blob = state.blobs.put(&params.name, &body).await?;
    info!(user_id = user.id, path = %blob.path, size = body.len(), "File uploaded");
    Ok((StatusCode::CREATED, Json(blob)))
}
