//! Booking lifecycle - creation, payment (re)initialization and status changes.
//!
//! A booking starts PENDING/PENDING with no chef. Payment reconciliation (see
//! `core::payment`) moves the payment status; chef assignment and chef/admin
//! actions move the workflow status through `core::policy`.

use crate::{
    core::{catalog, identity, policy, pricing},
    entities::{Booking, BookingStatus, PaymentStatus, Role, StringList, booking, user},
    errors::{Error, Result},
    services::{
        ChargeInit, ChargeMetadata, ChargeRequest, PaymentGateway, gateway::to_minor_units,
    },
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*, sea_query::Expr};
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument};

/// Booking form as submitted by a client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBooking {
    pub service_id: Option<i64>,
    /// Tier to book for tiered services; the first tier when omitted
    #[serde(default)]
    pub tier_index: Option<usize>,
    /// RFC 3339 timestamp or `YYYY-MM-DD`
    pub date: String,
    #[serde(default)]
    pub time: Option<String>,
    pub location: String,
    #[serde(default)]
    pub guests: i32,
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub cuisine_preferences: Vec<String>,
    #[serde(default)]
    pub dietary_restrictions: Option<String>,
    #[serde(default)]
    pub kitchen_equipment: Vec<String>,
    #[serde(default)]
    pub details: Option<String>,
    /// Partner referral code
    #[serde(default, rename = "ref")]
    pub referral_code: Option<String>,
    #[serde(default)]
    pub utm_source: Option<String>,
    #[serde(default)]
    pub utm_medium: Option<String>,
    #[serde(default)]
    pub utm_campaign: Option<String>,
}

/// A booking together with the gateway handles the client needs to pay for it
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingCheckout {
    pub booking: booking::Model,
    pub payment: ChargeInit,
}

/// Requested change from a chef or admin
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingUpdate {
    #[serde(default)]
    pub status: Option<BookingStatus>,
    #[serde(default)]
    pub chef_id: Option<i64>,
}

/// Parses a booking date given either as RFC 3339 or as a bare `YYYY-MM-DD`.
pub fn parse_booking_date(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| Error::invalid_input(format!("Unparseable booking date '{raw}'")))
}

fn clean(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

async fn start_charge(
    gateway: &dyn PaymentGateway,
    currency: &str,
    client: &user::Model,
    booking: &booking::Model,
    amount: f64,
) -> Result<ChargeInit> {
    let request = ChargeRequest {
        email: client.email.clone(),
        amount: to_minor_units(amount),
        currency: currency.to_string(),
        metadata: ChargeMetadata {
            booking_id: Some(booking.id),
            user_id: Some(client.id),
            ..Default::default()
        },
    };
    gateway
        .initialize(&request)
        .await
        .inspect_err(|e| error!(booking_id = booking.id, "Payment initialization failed: {}", e))
}

/// Records a fresh payment reference unless the booking has been paid meanwhile.
async fn store_reference(
    db: &DatabaseConnection,
    booking_id: i64,
    reference: &str,
) -> Result<booking::Model> {
    let result = Booking::update_many()
        .col_expr(
            booking::Column::PaymentReference,
            Expr::value(Some(reference.to_string())),
        )
        .col_expr(
            booking::Column::PaymentStatus,
            Expr::value(PaymentStatus::Pending),
        )
        .col_expr(booking::Column::UpdatedAt, Expr::value(Utc::now()))
        .filter(booking::Column::Id.eq(booking_id))
        .filter(booking::Column::PaymentStatus.ne(PaymentStatus::Paid))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::AlreadyPaid { booking_id });
    }
    get_booking_by_id(db, booking_id)
        .await?
        .ok_or_else(|| Error::not_found("Booking", booking_id))
}

/// Creates a PENDING booking and starts its payment.
///
/// The row is written before the gateway is contacted, so a gateway failure
/// leaves a booking without a payment reference that can be retried.
///
/// # Errors
/// `InvalidInput` if the service does not exist, the amount is not positive,
/// the date does not parse or the location is empty. Nothing is persisted in
/// those cases. Gateway failures surface as `Upstream`.
#[instrument(skip(db, gateway, client, input), fields(user_id = client.id, service_id = ?input.service_id))]
pub async fn create_booking(
    db: &DatabaseConnection,
    gateway: &dyn PaymentGateway,
    currency: &str,
    client: &user::Model,
    input: NewBooking,
) -> Result<BookingCheckout> {
    let service_id = input
        .service_id
        .ok_or_else(|| Error::invalid_input("A service must be selected"))?;
    let service = catalog::get_service_by_id(db, service_id)
        .await?
        .ok_or_else(|| Error::invalid_input(format!("Service {service_id} does not exist")))?;

    let pricing = pricing::Pricing::from_service(&service, input.tier_index)?;
    let amount = pricing::compute_amount(&pricing, input.guests);
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::invalid_input(format!(
            "Computed booking amount {amount} is not positive"
        )));
    }

    let date = parse_booking_date(&input.date)?;
    if input.location.trim().is_empty() {
        return Err(Error::invalid_input("Location cannot be empty"));
    }

    let partner = identity::resolve_partner(db, input.referral_code.as_deref()).await?;

    let now = Utc::now();
    let booking = booking::ActiveModel {
        user_id: Set(client.id),
        chef_id: Set(None),
        service_id: Set(Some(service.id)),
        partner_id: Set(partner.as_ref().map(|p| p.id)),
        referral_code: Set(partner.and_then(|p| p.referral_code)),
        utm_source: Set(clean(input.utm_source)),
        utm_medium: Set(clean(input.utm_medium)),
        utm_campaign: Set(clean(input.utm_campaign)),
        date: Set(date),
        time: Set(clean(input.time)),
        location: Set(input.location.trim().to_string()),
        guests: Set(input.guests.max(1)),
        event_type: Set(clean(input.event_type)),
        cuisine_preferences: Set(StringList(input.cuisine_preferences)),
        dietary_restrictions: Set(clean(input.dietary_restrictions)),
        kitchen_equipment: Set(StringList(input.kitchen_equipment)),
        details: Set(clean(input.details)),
        payment_amount: Set(Some(amount)),
        payment_status: Set(PaymentStatus::Pending),
        payment_reference: Set(None),
        transaction_id: Set(None),
        status: Set(BookingStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    info!(booking_id = booking.id, amount, "Booking created");

    let payment = start_charge(gateway, currency, client, &booking, amount).await?;
    let booking = store_reference(db, booking.id, &payment.reference).await?;

    Ok(BookingCheckout { booking, payment })
}

/// Starts a fresh charge for an unpaid booking, replacing its payment reference.
///
/// # Errors
/// `NotFound` for an unknown reference, `Forbidden` if the caller does not own
/// the booking and `AlreadyPaid` if it is already paid. No gateway call is
/// made in any of these cases.
#[instrument(skip(db, gateway, caller), fields(user_id = caller.id))]
pub async fn retry_payment(
    db: &DatabaseConnection,
    gateway: &dyn PaymentGateway,
    currency: &str,
    caller: &user::Model,
    reference: &str,
) -> Result<BookingCheckout> {
    let booking = find_booking_by_reference(db, reference)
        .await?
        .ok_or_else(|| Error::not_found("Booking", reference))?;

    if booking.user_id != caller.id {
        return Err(Error::forbidden("This booking belongs to another user"));
    }
    if booking.payment_status == PaymentStatus::Paid {
        return Err(Error::AlreadyPaid {
            booking_id: booking.id,
        });
    }
    let amount = booking
        .payment_amount
        .filter(|a| *a > 0.0)
        .ok_or_else(|| Error::invalid_input("Booking has no payable amount"))?;

    let payment = start_charge(gateway, currency, caller, &booking, amount).await?;
    info!(
        booking_id = booking.id,
        old_reference = reference,
        new_reference = %payment.reference,
        "Payment retried"
    );
    let booking = store_reference(db, booking.id, &payment.reference).await?;

    Ok(BookingCheckout { booking, payment })
}

/// Applies a chef or admin change to a booking.
///
/// Only admins may (re)assign a chef, and the assignee must hold the chef
/// role. Status changes go through [`policy::authorize_transition`], and a
/// booking is never CONFIRMED without a chef.
#[instrument(skip(db, actor), fields(actor_id = actor.id, actor_role = ?actor.role))]
pub async fn update_booking(
    db: &DatabaseConnection,
    actor: &user::Model,
    booking_id: i64,
    update: BookingUpdate,
) -> Result<booking::Model> {
    if update.status.is_none() && update.chef_id.is_none() {
        return Err(Error::invalid_input("Nothing to update"));
    }

    let booking = get_booking_by_id(db, booking_id)
        .await?
        .ok_or_else(|| Error::not_found("Booking", booking_id))?;

    if let Some(chef_id) = update.chef_id {
        if actor.role != Role::Admin {
            return Err(Error::forbidden("Only administrators can assign chefs"));
        }
        let chef = identity::find_user_by_id(db, chef_id).await?;
        if chef.map(|c| c.role) != Some(Role::Chef) {
            return Err(Error::invalid_input(format!("User {chef_id} is not a chef")));
        }
    }
    if let Some(status) = update.status {
        policy::authorize_transition(actor.role, actor.id, &booking, status)?;
        policy::ensure_chef_for(booking.id, status, update.chef_id.or(booking.chef_id))?;
    }

    let mut active: booking::ActiveModel = booking.into();
    if let Some(chef_id) = update.chef_id {
        active.chef_id = Set(Some(chef_id));
    }
    if let Some(status) = update.status {
        active.status = Set(status);
    }
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;

    info!(booking_id, status = ?updated.status, chef_id = ?updated.chef_id, "Booking updated");
    Ok(updated)
}

pub async fn get_booking_by_id<C>(db: &C, booking_id: i64) -> Result<Option<booking::Model>>
where
    C: ConnectionTrait,
{
    Booking::find_by_id(booking_id)
        .one(db)
        .await
        .map_err(Into::into)
}

pub async fn find_booking_by_reference(
    db: &DatabaseConnection,
    reference: &str,
) -> Result<Option<booking::Model>> {
    Booking::find()
        .filter(booking::Column::PaymentReference.eq(reference))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Bookings made by a client, newest first.
pub async fn list_bookings_for_client(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<booking::Model>> {
    Booking::find()
        .filter(booking::Column::UserId.eq(user_id))
        .order_by_desc(booking::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Bookings assigned to a chef, soonest event first.
pub async fn list_bookings_for_chef(
    db: &DatabaseConnection,
    chef_id: i64,
) -> Result<Vec<booking::Model>> {
    Booking::find()
        .filter(booking::Column::ChefId.eq(chef_id))
        .order_by_asc(booking::Column::Date)
        .all(db)
        .await
        .map_err(Into::into)
}

pub async fn list_all_bookings(db: &DatabaseConnection) -> Result<Vec<booking::Model>> {
    Booking::find()
        .order_by_desc(booking::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}
