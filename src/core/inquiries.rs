//! Partner inquiries - leads from companies interested in partnering.

use crate::{
    core::{identity, notifications},
    entities::{Inquiry, InquiryStatus, inquiry},
    errors::{Error, Result},
    tasks::{BackgroundTask, TaskQueue},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewInquiry {
    pub company_name: String,
    pub contact_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub message: String,
    /// Referral code of the partner who sent the lead
    #[serde(default, rename = "ref")]
    pub referral_code: Option<String>,
}

fn validate(input: &NewInquiry) -> Result<()> {
    if input.company_name.trim().is_empty() {
        return Err(Error::invalid_input("Company name is required"));
    }
    if input.contact_name.trim().chars().count() < 2 {
        return Err(Error::invalid_input(
            "Contact name must be at least 2 characters",
        ));
    }
    if !identity::is_valid_email(&input.email) {
        return Err(Error::invalid_input("Email address is not valid"));
    }
    if input.message.trim().is_empty() {
        return Err(Error::invalid_input("Message is required"));
    }
    Ok(())
}

#[instrument(skip(db, tasks, input), fields(company = %input.company_name))]
pub async fn submit_inquiry(
    db: &DatabaseConnection,
    tasks: &TaskQueue,
    input: NewInquiry,
) -> Result<inquiry::Model> {
    validate(&input)?;
    let partner = identity::resolve_partner(db, input.referral_code.as_deref()).await?;

    let inquiry = inquiry::ActiveModel {
        company_name: Set(input.company_name.trim().to_string()),
        contact_name: Set(input.contact_name.trim().to_string()),
        email: Set(input.email.trim().to_string()),
        phone: Set(input.phone.filter(|p| !p.trim().is_empty())),
        message: Set(input.message.trim().to_string()),
        status: Set(InquiryStatus::New),
        partner_id: Set(partner.as_ref().map(|p| p.id)),
        referral_code: Set(partner.and_then(|p| p.referral_code)),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(inquiry_id = inquiry.id, partner_id = ?inquiry.partner_id, "Partner inquiry received");
    tasks.dispatch(BackgroundTask::SendEmail(notifications::inquiry_received(
        &inquiry,
    )));
    Ok(inquiry)
}

/// All inquiries, newest first.
pub async fn list_inquiries(db: &DatabaseConnection) -> Result<Vec<inquiry::Model>> {
    Inquiry::find()
        .order_by_desc(inquiry::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

pub async fn update_inquiry_status(
    db: &DatabaseConnection,
    inquiry_id: i64,
    status: InquiryStatus,
) -> Result<inquiry::Model> {
    let inquiry = Inquiry::find_by_id(inquiry_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Inquiry", inquiry_id))?;

    let mut active: inquiry::ActiveModel = inquiry.into();
    active.status = Set(status);
    active.update(db).await.map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    fn form() -> NewInquiry {
        NewInquiry {
            company_name: "Eko Hotels".to_string(),
            contact_name: "Tunde".to_string(),
            email: "tunde@eko.example".to_string(),
            phone: None,
            message: "We would like chefs for our events".to_string(),
            referral_code: None,
        }
    }

    #[test]
    fn test_validation() {
        assert!(validate(&form()).is_ok());

        let mut short_name = form();
        short_name.contact_name = "T".to_string();
        assert!(validate(&short_name).is_err());

        let mut bad_email = form();
        bad_email.email = "tunde".to_string();
        assert!(validate(&bad_email).is_err());

        let mut no_message = form();
        no_message.message = "  ".to_string();
        assert!(validate(&no_message).is_err());
    }

    #[tokio::test]
    async fn test_submit_with_referral_and_update() -> Result<()> {
        let db = setup_test_db().await?;
        let partner = create_test_partner(&db, "Pat Partner").await?;
        let (tasks, mut receiver) = TaskQueue::new();

        let mut input = form();
        input.referral_code = partner.referral_code.clone();
        let inquiry = submit_inquiry(&db, &tasks, input).await?;
        assert_eq!(inquiry.status, InquiryStatus::New);
        assert_eq!(inquiry.partner_id, Some(partner.id));
        assert!(matches!(receiver.try_recv().unwrap(), BackgroundTask::SendEmail(_)));

        let contacted = update_inquiry_status(&db, inquiry.id, InquiryStatus::Contacted).await?;
        assert_eq!(contacted.status, InquiryStatus::Contacted);
        assert!(matches!(
            update_inquiry_status(&db, 999, InquiryStatus::Closed).await,
            Err(Error::NotFound { .. })
        ));
        assert_eq!(list_inquiries(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_referral_code_is_ignored() -> Result<()> {
        let db = setup_test_db().await?;
        let (tasks, _receiver) = TaskQueue::new();
        let mut input = form();
        input.referral_code = Some("NAC-DEADBEEF".to_string());

        let inquiry = submit_inquiry(&db, &tasks, input).await?;
        assert!(inquiry.partner_id.is_none());
        assert!(inquiry.referral_code.is_none());
        Ok(())
    }
}
