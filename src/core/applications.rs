//! Chef applications - submission and admin review.

use crate::{
    core::{identity, notifications},
    entities::{
        ApplicationStatus, ChefApplication, ChefProfile, Role, StringList, chef_application,
        chef_profile, user,
    },
    errors::{Error, Result},
    tasks::{BackgroundTask, TaskQueue},
};
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewApplication {
    pub full_name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub level: String,
    pub experience: String,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub resume_url: Option<String>,
}

/// Reads the leading whole number of a free-text experience field
/// ("5 years" is 5). Text without a leading number counts as 0.
#[must_use]
pub fn parse_years_of_experience(text: &str) -> i32 {
    let digits: String = text
        .trim_start()
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

/// Records a user's application to become a chef.
///
/// # Errors
/// `InvalidInput` for missing fields, `Conflict` if the user already applied.
/// The duplicate check is a lookup before insert, so two simultaneous
/// submissions can both succeed.
#[instrument(skip(db, tasks, applicant, input), fields(user_id = applicant.id))]
pub async fn submit_application(
    db: &DatabaseConnection,
    tasks: &TaskQueue,
    applicant: &user::Model,
    input: NewApplication,
) -> Result<chef_application::Model> {
    if input.full_name.trim().is_empty()
        || input.level.trim().is_empty()
        || input.experience.trim().is_empty()
    {
        return Err(Error::invalid_input(
            "Full name, level and experience are required",
        ));
    }
    if !identity::is_valid_email(&input.email) {
        return Err(Error::invalid_input("Email address is not valid"));
    }

    if get_application_for_user(db, applicant.id).await?.is_some() {
        return Err(Error::Conflict {
            message: "You have already submitted an application".to_string(),
        });
    }

    let application = chef_application::ActiveModel {
        user_id: Set(applicant.id),
        full_name: Set(input.full_name.trim().to_string()),
        email: Set(input.email.trim().to_string()),
        phone: Set(input.phone.filter(|p| !p.trim().is_empty())),
        level: Set(input.level.trim().to_string()),
        experience: Set(input.experience.trim().to_string()),
        bio: Set(input.bio.filter(|b| !b.trim().is_empty())),
        resume_url: Set(input.resume_url.filter(|r| !r.trim().is_empty())),
        status: Set(ApplicationStatus::Pending),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(application_id = application.id, "Chef application submitted");
    tasks.dispatch(BackgroundTask::SendEmail(notifications::application_received(
        &application,
    )));
    Ok(application)
}

pub async fn get_application_for_user(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Option<chef_application::Model>> {
    ChefApplication::find()
        .filter(chef_application::Column::UserId.eq(user_id))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All applications, newest first.
pub async fn list_applications(db: &DatabaseConnection) -> Result<Vec<chef_application::Model>> {
    ChefApplication::find()
        .order_by_desc(chef_application::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Ensures the applicant is a chef with a profile.
async fn promote_to_chef<C>(db: &C, application: &chef_application::Model) -> Result<()>
where
    C: ConnectionTrait,
{
    let applicant = identity::find_user_by_id(db, application.user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", application.user_id))?;

    // Admins keep their role; everyone else becomes a chef
    if applicant.role != Role::Admin && applicant.role != Role::Chef {
        let mut active: user::ActiveModel = applicant.into();
        active.role = Set(Role::Chef);
        active.update(db).await?;
    }

    let years = parse_years_of_experience(&application.experience);
    let existing = ChefProfile::find()
        .filter(chef_profile::Column::UserId.eq(application.user_id))
        .one(db)
        .await?;
    match existing {
        Some(profile) => {
            let mut active: chef_profile::ActiveModel = profile.into();
            active.years_of_experience = Set(years);
            if application.bio.is_some() {
                active.bio = Set(application.bio.clone());
            }
            active.update(db).await?;
        }
        None => {
            chef_profile::ActiveModel {
                user_id: Set(application.user_id),
                specialties: Set(StringList::default()),
                years_of_experience: Set(years),
                portfolio_images: Set(StringList::default()),
                bio: Set(application.bio.clone()),
                ..Default::default()
            }
            .insert(db)
            .await?;
        }
    }
    Ok(())
}

/// Sets an application's review status. Approval promotes the applicant to
/// chef and creates their profile in the same database transaction.
///
/// # Errors
/// `InvalidInput` when asked to move back to PENDING, `NotFound` for an
/// unknown application.
#[instrument(skip(db, tasks))]
pub async fn review_application(
    db: &DatabaseConnection,
    tasks: &TaskQueue,
    application_id: i64,
    status: ApplicationStatus,
) -> Result<chef_application::Model> {
    if status == ApplicationStatus::Pending {
        return Err(Error::invalid_input(
            "Review status must be REVIEWED, APPROVED or DENIED",
        ));
    }

    let txn = db.begin().await?;

    let application = ChefApplication::find_by_id(application_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Application", application_id))?;

    let mut active: chef_application::ActiveModel = application.into();
    active.status = Set(status);
    let application = active.update(&txn).await?;

    if status == ApplicationStatus::Approved {
        promote_to_chef(&txn, &application).await?;
    }

    txn.commit().await?;
    info!(application_id, status = ?status, "Application reviewed");

    if status == ApplicationStatus::Approved {
        tasks.dispatch(BackgroundTask::SendEmail(notifications::application_approved(
            &application,
        )));
    }
    Ok(application)
}
