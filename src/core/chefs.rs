//! Public chef directory and chefs' own portfolio management.
//!
//! Directory entries never carry contact details; clients reach chefs through
//! bookings only.

use crate::{
    entities::{ChefProfile, Role, StringList, User, chef_profile, user},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde::Serialize;
use tracing::{info, instrument};

const MAX_PORTFOLIO_IMAGES: usize = 24;

/// A chef as shown to visitors
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicChef {
    pub id: i64,
    pub name: String,
    pub bio: Option<String>,
    pub specialties: Vec<String>,
    pub years_of_experience: i32,
    pub portfolio_images: Vec<String>,
}

impl PublicChef {
    fn from_parts(user: user::Model, profile: Option<chef_profile::Model>) -> Self {
        let profile = profile.unwrap_or_else(|| chef_profile::Model {
            id: 0,
            user_id: user.id,
            specialties: StringList::default(),
            years_of_experience: 0,
            portfolio_images: StringList::default(),
            bio: None,
        });
        Self {
            id: user.id,
            name: user.name,
            bio: profile.bio,
            specialties: profile.specialties.0,
            years_of_experience: profile.years_of_experience,
            portfolio_images: profile.portfolio_images.0,
        }
    }

    fn matches(&self, query: Option<&str>, specialty: Option<&str>) -> bool {
        let specialty_ok = specialty.is_none_or(|wanted| {
            self.specialties
                .iter()
                .any(|s| s.eq_ignore_ascii_case(wanted))
        });
        let query_ok = query.is_none_or(|q| {
            self.name.to_lowercase().contains(q)
                || self.bio.as_deref().is_some_and(|b| b.to_lowercase().contains(q))
        });
        specialty_ok && query_ok
    }
}

/// Lists chefs, optionally filtered by a name/bio search and an exact specialty.
pub async fn list_public_chefs(
    db: &DatabaseConnection,
    query: Option<&str>,
    specialty: Option<&str>,
) -> Result<Vec<PublicChef>> {
    let query = query.map(|q| q.trim().to_lowercase()).filter(|q| !q.is_empty());
    let specialty = specialty.map(str::trim).filter(|s| !s.is_empty());

    let rows = User::find()
        .filter(user::Column::Role.eq(Role::Chef))
        .find_also_related(ChefProfile)
        .order_by_asc(user::Column::Name)
        .all(db)
        .await?;
    Ok(rows
        .into_iter()
        .map(|(user, profile)| PublicChef::from_parts(user, profile))
        .filter(|chef| chef.matches(query.as_deref(), specialty))
        .collect())
}

/// Looks up one chef for the directory.
///
/// # Errors
/// `NotFound` when the user does not exist or is not a chef.
pub async fn get_public_chef(db: &DatabaseConnection, chef_id: i64) -> Result<PublicChef> {
    let (user, profile) = User::find_by_id(chef_id)
        .find_also_related(ChefProfile)
        .one(db)
        .await?
        .filter(|(user, _)| user.role == Role::Chef)
        .ok_or_else(|| Error::not_found("Chef", chef_id))?;
    Ok(PublicChef::from_parts(user, profile))
}

async fn profile_for(db: &DatabaseConnection, chef_id: i64) -> Result<chef_profile::Model> {
    ChefProfile::find()
        .filter(chef_profile::Column::UserId.eq(chef_id))
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Chef profile", chef_id))
}

fn check_portfolio_size(images: &[String]) -> Result<()> {
    if images.len() > MAX_PORTFOLIO_IMAGES {
        return Err(Error::invalid_input(format!(
            "A portfolio holds at most {MAX_PORTFOLIO_IMAGES} images"
        )));
    }
    Ok(())
}

/// Appends one image URL to a chef's portfolio.
///
/// # Errors
/// `NotFound` if the chef has no profile, `InvalidInput` if the portfolio is full.
#[instrument(skip(db, url))]
pub async fn add_portfolio_image(
    db: &DatabaseConnection,
    chef_id: i64,
    url: &str,
) -> Result<chef_profile::Model> {
    let profile = profile_for(db, chef_id).await?;
    let mut images = profile.portfolio_images.0.clone();
    images.push(url.to_string());
    check_portfolio_size(&images)?;

    let mut active: chef_profile::ActiveModel = profile.into();
    active.portfolio_images = Set(StringList(images));
    let updated = active.update(db).await?;
    info!(chef_id, images = updated.portfolio_images.0.len(), "Portfolio image added");
    Ok(updated)
}

/// Replaces a chef's portfolio with `images`, in the given order.
///
/// Used to remove or reorder images. Blank entries are dropped.
///
/// # Errors
/// `NotFound` if the chef has no profile, `InvalidInput` if too many images
/// are given.
#[instrument(skip(db, images))]
pub async fn set_portfolio_images(
    db: &DatabaseConnection,
    chef_id: i64,
    images: Vec<String>,
) -> Result<chef_profile::Model> {
    let images: Vec<String> = images
        .into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect();
    check_portfolio_size(&images)?;

    let profile = profile_for(db, chef_id).await?;
    let mut active: chef_profile::ActiveModel = profile.into();
    active.portfolio_images = Set(StringList(images));
    let updated = active.update(db).await?;
    info!(chef_id, images = updated.portfolio_images.0.len(), "Portfolio replaced");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_directory_lists_only_chefs_and_filters() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_chef(&db, "Bola Grill", &["Grill", "Nigerian"], 6).await?;
        create_test_chef(&db, "Chi Pastry", &["Pastry"], 2).await?;
        create_test_user(&db, "Ada Client", Role::User).await?;

        let all = list_public_chefs(&db, None, None).await?;
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].name, "Bola Grill");

        let pastry = list_public_chefs(&db, None, Some("pastry")).await?;
        assert_eq!(pastry.len(), 1);
        assert_eq!(pastry[0].name, "Chi Pastry");

        let by_name = list_public_chefs(&db, Some("BOLA"), None).await?;
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].years_of_experience, 6);

        assert!(list_public_chefs(&db, Some("bola"), Some("Pastry")).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_public_chef_lookup() -> Result<()> {
        let db = setup_test_db().await?;
        let chef = create_test_chef(&db, "Bola Grill", &["Grill"], 6).await?;
        let client = create_test_user(&db, "Ada Client", Role::User).await?;

        let found = get_public_chef(&db, chef.id).await?;
        assert_eq!(found.specialties, vec!["Grill".to_string()]);

        let result = get_public_chef(&db, client.id).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        let result = get_public_chef(&db, chef.id + 100).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_portfolio_add_and_replace() -> Result<()> {
        let db = setup_test_db().await?;
        let chef = create_test_chef(&db, "Bola Grill", &["Grill"], 6).await?;

        add_portfolio_image(&db, chef.id, "http://x/uploads/a.jpg").await?;
        let profile = add_portfolio_image(&db, chef.id, "http://x/uploads/b.jpg").await?;
        assert_eq!(profile.portfolio_images.0.len(), 2);

        let profile = set_portfolio_images(
            &db,
            chef.id,
            vec!["http://x/uploads/b.jpg".to_string(), "  ".to_string()],
        )
        .await?;
        assert_eq!(
            profile.portfolio_images,
            StringList(vec!["http://x/uploads/b.jpg".to_string()])
        );

        let too_many = vec!["http://x/i.jpg".to_string(); MAX_PORTFOLIO_IMAGES + 1];
        let result = set_portfolio_images(&db, chef.id, too_many).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let public = get_public_chef(&db, chef.id).await?;
        assert_eq!(public.portfolio_images, vec!["http://x/uploads/b.jpg".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_portfolio_needs_profile() -> Result<()> {
        let db = setup_test_db().await?;
        let bare = create_test_user(&db, "No Profile", Role::Chef).await?;
        let result = add_portfolio_image(&db, bare.id, "http://x/a.jpg").await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }
}
