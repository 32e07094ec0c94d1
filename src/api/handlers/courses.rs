//! Course catalog and learning progress.

use crate::{
    api::{extractors::AuthUser, state::AppState},
    core::courses::{self, ProgressUpdate},
    entities::{course, course_progress},
    errors::{Error, Result},
};
use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct CourseSearch {
    pub query: Option<String>,
    pub category: Option<String>,
}

pub async fn list_courses(
    State(state): State<AppState>,
    Query(search): Query<CourseSearch>,
) -> Result<Json<Vec<course::Model>>> {
    Ok(Json(
        courses::list_courses(&state.db, search.query.as_deref(), search.category.as_deref())
            .await?,
    ))
}

pub async fn get_course(
    State(state): State<AppState>,
    Path(course_id): Path<i64>,
) -> Result<Json<course::Model>> {
    courses::get_course(&state.db, course_id)
        .await?
        .map(Json)
        .ok_or_else(|| Error::not_found("Course", course_id))
}

pub async fn my_progress(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<course_progress::Model>>> {
    Ok(Json(courses::list_progress_for_user(&state.db, user.id).await?))
}

pub async fn record_progress(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(update): Json<ProgressUpdate>,
) -> Result<Json<course_progress::Model>> {
    Ok(Json(courses::record_progress(&state.db, user.id, update).await?))
}
