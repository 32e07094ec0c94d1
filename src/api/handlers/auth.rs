//! Sign up, log in, current-user and password endpoints.

use crate::{
    api::{extractors::{AuthUser, SESSION_COOKIE}, state::AppState},
    core::{identity, notifications},
    entities::user,
    errors::Result,
    tasks::BackgroundTask,
};
use axum::{
    Json,
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LogInRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_password: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: String,
    pub user: user::Model,
}

fn session(state: &AppState, user: user::Model) -> Result<([(header::HeaderName, String); 1], Json<SessionResponse>)> {
    let ttl_hours = state.config.session_ttl_hours;
    let token = identity::issue_token(&state.config.session_secret, &user, ttl_hours)?;
    let cookie = format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        ttl_hours * 3600
    );
    Ok(([(header::SET_COOKIE, cookie)], Json(SessionResponse { token, user })))
}

pub async fn sign_up(
    State(state): State<AppState>,
    Json(request): Json<SignUpRequest>,
) -> Result<impl IntoResponse> {
    let user = identity::sign_up(&state.db, &request.name, &request.email, &request.password).await?;
    let (cookie, body) = session(&state, user)?;
    Ok((StatusCode::CREATED, cookie, body))
}

pub async fn log_in(
    State(state): State<AppState>,
    Json(request): Json<LogInRequest>,
) -> Result<impl IntoResponse> {
    let user = identity::log_in(&state.db, &request.email, &request.password).await?;
    session(&state, user)
}

#[allow(clippy::unused_async)]
pub async fn me(AuthUser(user): AuthUser) -> Json<user::Model> {
    Json(user)
}

pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>> {
    identity::change_password(
        &state.db,
        user.id,
        &request.current_password,
        &request.new_password,
        &request.confirm_password,
    )
    .await?;
    Ok(Json(MessageResponse {
        message: "Password updated successfully.",
    }))
}

/// Always answers the same way, whether or not the email is registered.
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    if let Some((user, token)) = identity::request_password_reset(&state.db, &request.email).await? {
        let reset_url = format!("{}/reset-password/{token}", state.config.app_base_url);
        state.tasks.dispatch(BackgroundTask::SendEmail(notifications::password_reset(
            &user, &reset_url,
        )));
    }
    Ok(Json(MessageResponse {
        message: "If an account with that email exists, a password reset link has been sent.",
    }))
}

pub async fn reset_password(
    State(state): State<AppState>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    identity::reset_password(&state.db, &request.token, &request.new_password).await?;
    Ok(Json(MessageResponse {
        message: "Password has been reset successfully.",
    }))
}
