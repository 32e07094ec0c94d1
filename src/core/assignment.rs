//! Chef assignment - picks a chef for a booking via text generation.
//!
//! The model only ever chooses among the candidates it was shown; any id it
//! returns that is not one of them is rejected.

use crate::{
    core::{booking as bookings, identity, policy},
    entities::{Booking, BookingStatus, ChefProfile, PaymentStatus, Role, User, booking, user},
    errors::{Error, Result},
    services::TextGenerator,
};
use sea_orm::{QueryOrder, Set, prelude::*};
use serde_json::Value;
use std::fmt::Write;
use tracing::{info, instrument, warn};

/// A chef the model may pick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChefCandidate {
    pub id: i64,
    pub name: String,
    pub specialties: Vec<String>,
    pub years_of_experience: i32,
}

/// Result of a successful assignment
#[derive(Debug, Clone)]
pub struct AssignedBooking {
    pub booking: booking::Model,
    pub client: user::Model,
    pub chef: user::Model,
}

/// Users with the chef role that have a chef profile.
pub async fn load_candidates(db: &DatabaseConnection) -> Result<Vec<ChefCandidate>> {
    let rows = User::find()
        .filter(user::Column::Role.eq(Role::Chef))
        .find_also_related(ChefProfile)
        .order_by_asc(user::Column::Id)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(chef, profile)| {
            profile.map(|p| ChefCandidate {
                id: chef.id,
                name: chef.name,
                specialties: p.specialties.0,
                years_of_experience: p.years_of_experience,
            })
        })
        .collect())
}

fn or_none(value: Option<&str>) -> &str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or("None")
}

/// Builds the matching prompt for a booking and its candidate chefs.
#[must_use]
pub fn build_prompt(booking: &booking::Model, candidates: &[ChefCandidate]) -> String {
    let cuisines = if booking.cuisine_preferences.is_empty() {
        "None".to_string()
    } else {
        booking.cuisine_preferences.joined(", ")
    };

    let mut prompt = String::from(
        "Based on the following booking details, select the best chef from the list.\n\
         Return only the JSON object with the \"chefId\" of the most suitable chef. \
         Do not add any other text or explanation.\n\nBooking Details:\n",
    );
    let _ = writeln!(prompt, "- Event Type: {}", or_none(booking.event_type.as_deref()));
    let _ = writeln!(prompt, "- Location: {}", booking.location);
    let _ = writeln!(prompt, "- Number of Guests: {}", booking.guests);
    let _ = writeln!(prompt, "- Cuisine Preferences: {cuisines}");
    let _ = writeln!(
        prompt,
        "- Dietary Restrictions: {}",
        or_none(booking.dietary_restrictions.as_deref())
    );

    prompt.push_str("\nAvailable Chefs:\n");
    for chef in candidates {
        let _ = writeln!(
            prompt,
            "- Chef ID: {}\n  Name: {}\n  Specialties: {}\n  Experience: {} years",
            chef.id,
            chef.name,
            chef.specialties.join(", "),
            chef.years_of_experience
        );
    }
    prompt.push_str("\nResponse format: {\"chefId\": \"your_selected_chef_id_here\"}\n");
    prompt
}

/// Extracts `chefId` from a model reply, tolerating Markdown code fences and
/// either a string or a numeric id.
#[must_use]
pub fn parse_chef_id(reply: &str) -> Option<i64> {
    let cleaned = reply.replace("```json", "").replace("```", "");
    let value: Value = serde_json::from_str(cleaned.trim()).ok()?;
    match value.get("chefId")? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Only paid bookings that may still move to CONFIRMED get a chef.
fn ensure_assignable(booking: &booking::Model) -> Result<()> {
    if booking.payment_status != PaymentStatus::Paid {
        return Err(Error::invalid_input(format!(
            "Booking {} is not paid",
            booking.id
        )));
    }
    if !policy::is_allowed_transition(booking.status, BookingStatus::Confirmed) {
        return Err(Error::invalid_input(format!(
            "Booking {} is {:?} and cannot be confirmed",
            booking.id, booking.status
        )));
    }
    Ok(())
}

/// Asks the generator to pick a chef and records the choice.
///
/// # Errors
/// `NotFound` for an unknown booking, `InvalidInput` when the booking is not
/// paid or can no longer be confirmed, `NoChefsAvailable` when no chef has a
/// profile, `InvalidAssignment` when the reply has no usable id or names a
/// chef that was not offered. Generator failures surface as `Upstream`.
#[instrument(skip(db, generator))]
pub async fn assign_chef(
    db: &DatabaseConnection,
    generator: &dyn TextGenerator,
    booking_id: i64,
) -> Result<AssignedBooking> {
    let booking = bookings::get_booking_by_id(db, booking_id)
        .await?
        .ok_or_else(|| Error::not_found("Booking", booking_id))?;
    ensure_assignable(&booking)?;

    let candidates = load_candidates(db).await?;
    if candidates.is_empty() {
        return Err(Error::NoChefsAvailable);
    }

    let reply = generator.generate(&build_prompt(&booking, &candidates)).await?;
    let chef_id = parse_chef_id(&reply).ok_or_else(|| {
        warn!(booking_id, reply = %reply, "Unusable chef selection reply");
        Error::InvalidAssignment {
            message: "Reply did not contain a chefId".to_string(),
        }
    })?;
    if !candidates.iter().any(|c| c.id == chef_id) {
        return Err(Error::InvalidAssignment {
            message: format!("Chef {chef_id} was not among the candidates"),
        });
    }

    let client = identity::find_user_by_id(db, booking.user_id)
        .await?
        .ok_or_else(|| Error::not_found("User", booking.user_id))?;
    let chef = identity::find_user_by_id(db, chef_id)
        .await?
        .ok_or_else(|| Error::not_found("User", chef_id))?;

    // The booking may have been cancelled or completed while the reply was pending.
    let result = Booking::update_many()
        .col_expr(booking::Column::ChefId, Expr::value(chef_id))
        .col_expr(booking::Column::Status, Expr::value(BookingStatus::Confirmed))
        .col_expr(booking::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(booking::Column::Id.eq(booking_id))
        .filter(booking::Column::PaymentStatus.eq(PaymentStatus::Paid))
        .filter(booking::Column::Status.is_in([BookingStatus::Pending, BookingStatus::Confirmed]))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::invalid_input(format!(
            "Booking {booking_id} changed state during chef assignment"
        )));
    }
    let booking = bookings::get_booking_by_id(db, booking_id)
        .await?
        .ok_or_else(|| Error::not_found("Booking", booking_id))?;

    info!(booking_id, chef_id, "Booking confirmed with chef");
    Ok(AssignedBooking {
        booking,
        client,
        chef,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[test]
    fn test_parse_chef_id_variants() {
        assert_eq!(parse_chef_id(r#"{"chefId": "12"}"#), Some(12));
        assert_eq!(parse_chef_id(r#"{"chefId": 12}"#), Some(12));
        assert_eq!(parse_chef_id("```json\n{\"chefId\": \"3\"}\n```"), Some(3));
        assert_eq!(parse_chef_id("```\n{\"chefId\": 3}\n```"), Some(3));
        assert_eq!(parse_chef_id(r#"{"chef": 3}"#), None);
        assert_eq!(parse_chef_id(r#"{"chefId": "abc"}"#), None);
        assert_eq!(parse_chef_id("I pick chef 3"), None);
    }

    #[test]
    fn test_prompt_lists_booking_and_chefs() {
        let mut booking = booking_model(1, BookingStatus::Pending, None);
        booking.event_type = Some("Birthday".to_string());
        booking.guests = 12;
        let candidates = vec![ChefCandidate {
            id: 42,
            name: "Bola".to_string(),
            specialties: vec!["Grill".to_string(), "Nigerian".to_string()],
            years_of_experience: 7,
        }];

        let prompt = build_prompt(&booking, &candidates);
        assert!(prompt.contains("- Event Type: Birthday"));
        assert!(prompt.contains("- Number of Guests: 12"));
        assert!(prompt.contains("- Dietary Restrictions: None"));
        assert!(prompt.contains("- Chef ID: 42"));
        assert!(prompt.contains("Specialties: Grill, Nigerian"));
        assert!(prompt.contains("Experience: 7 years"));
        assert!(prompt.contains(r#"{"chefId""#));
    }

    #[tokio::test]
    async fn test_candidates_require_profile() -> Result<()> {
        let db = setup_test_db().await?;
        create_test_user(&db, "No Profile", Role::Chef).await?;
        let chef = create_test_chef(&db, "Bola Chef", &["Grill"], 4).await?;

        let candidates = load_candidates(&db).await?;
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, chef.id);
        assert_eq!(candidates[0].specialties, vec!["Grill".to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn test_assign_with_one_chef_confirms_booking() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_user(&db, "Ada Client", Role::User).await?;
        let chef = create_test_chef(&db, "Bola Chef", &["Grill"], 4).await?;
        let booking = create_paid_test_booking(&db, client.id, None).await?;
        let generator = ScriptedGenerator::new(vec![format!("{{\"chefId\": \"{}\"}}", chef.id)]);

        let assigned = assign_chef(&db, &generator, booking.id).await?;
        assert_eq!(assigned.booking.chef_id, Some(chef.id));
        assert_eq!(assigned.booking.status, BookingStatus::Confirmed);
        assert_eq!(assigned.client.id, client.id);
        assert_eq!(assigned.chef.id, chef.id);
        assert!(generator.prompts()[0].contains(&format!("Chef ID: {}", chef.id)));
        Ok(())
    }

    #[tokio::test]
    async fn test_no_chefs_available() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_user(&db, "Ada Client", Role::User).await?;
        let booking = create_paid_test_booking(&db, client.id, None).await?;
        let generator = ScriptedGenerator::new(vec![]);

        let result = assign_chef(&db, &generator, booking.id).await;
        assert!(matches!(result, Err(Error::NoChefsAvailable)));
        assert!(generator.prompts().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_invented_chef_is_rejected() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_user(&db, "Ada Client", Role::User).await?;
        create_test_chef(&db, "Bola Chef", &["Grill"], 4).await?;
        let booking = create_paid_test_booking(&db, client.id, None).await?;

        // The client is a real user but not a candidate
        let generator = ScriptedGenerator::new(vec![format!("{{\"chefId\": {}}}", client.id)]);
        let result = assign_chef(&db, &generator, booking.id).await;
        assert!(matches!(result, Err(Error::InvalidAssignment { .. })));

        let generator = ScriptedGenerator::new(vec!["{}".to_string()]);
        let result = assign_chef(&db, &generator, booking.id).await;
        assert!(matches!(result, Err(Error::InvalidAssignment { .. })));

        let stored = bookings::get_booking_by_id(&db, booking.id).await?.unwrap();
        assert!(stored.chef_id.is_none());
        assert_eq!(stored.status, BookingStatus::Pending);
        Ok(())
    }

    #[tokio::test]
    async fn test_unpaid_or_finished_bookings_are_not_assigned() -> Result<()> {
        let db = setup_test_db().await?;
        let client = create_test_user(&db, "Ada Client", Role::User).await?;
        let chef = create_test_chef(&db, "Bola Chef", &["Grill"], 4).await?;
        let reply = format!("{{\"chefId\": \"{}\"}}", chef.id);

        let unpaid = create_test_booking(&db, client.id, None).await?;
        let generator = ScriptedGenerator::new(vec![reply.clone()]);
        let result = assign_chef(&db, &generator, unpaid.id).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        assert!(generator.prompts().is_empty());

        let completed = create_paid_test_booking(&db, client.id, None).await?;
        let mut active: booking::ActiveModel = completed.clone().into();
        active.status = Set(BookingStatus::Completed);
        active.update(&db).await?;

        let result = assign_chef(&db, &generator, completed.id).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));
        let stored = bookings::get_booking_by_id(&db, completed.id).await?.unwrap();
        assert_eq!(stored.status, BookingStatus::Completed);
        assert!(stored.chef_id.is_none());
        assert!(generator.prompts().is_empty());
        Ok(())
    }
}
