//! Partner inquiries and referral reporting.

use crate::{
    api::{extractors::AuthUser, state::AppState},
    core::{
        inquiries::{self, NewInquiry},
        notifications,
        report::{self, PartnerReport},
    },
    entities::{Role, inquiry},
    errors::{Error, Result},
    tasks::BackgroundTask,
};
use axum::{Json, extract::State, http::StatusCode};

pub async fn submit_inquiry(
    State(state): State<AppState>,
    Json(input): Json<NewInquiry>,
) -> Result<(StatusCode, Json<inquiry::Model>)> {
    let inquiry = inquiries::submit_inquiry(&state.db, &state.tasks, input).await?;
    state.tasks.dispatch(BackgroundTask::SendEmail(notifications::new_inquiry_alert(
        &state.config.admin_email,
        &inquiry,
    )));
    Ok((StatusCode::CREATED, Json(inquiry)))
}

pub async fn referrals(
    State(state): State<AppState>,
    AuthUser(partner): AuthUser,
) -> Result<Json<PartnerReport>> {
    if partner.role != Role::Partner {
        return Err(Error::forbidden("Partner access required"));
    }
    Ok(Json(report::generate_partner_report(&state.db, &partner).await?))
}
