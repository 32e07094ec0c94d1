//! Report generation business logic.
//!
//! Aggregates for the admin dashboard and the partner referral report. All
//! functions return plain structs that the HTTP layer serializes as-is.

use crate::{
    entities::{
        ApplicationStatus, Booking, ChefApplication, Inquiry, InquiryStatus, Order, OrderStatus,
        PaymentStatus, User, booking, chef_application, inquiry, order, user,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{PaginatorTrait, QueryOrder, prelude::*};
use serde::Serialize;

/// Share of a referred booking's payment credited to the partner
pub const COMMISSION_RATE: f64 = 0.10;

/// Headline numbers for administrators.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    /// Sum of totals of orders past Pending
    pub order_revenue: f64,
    /// Sum of payment amounts of paid bookings
    pub booking_revenue: f64,
    pub total_bookings: u64,
    pub pending_applications: u64,
    pub new_inquiries: u64,
    pub user_count: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReferralKind {
    Booking,
    Inquiry,
}

/// One booking or inquiry credited to a partner
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralEntry {
    pub kind: ReferralKind,
    pub id: i64,
    /// Event type for bookings, company name for inquiries
    pub label: String,
    pub status: String,
    pub amount: f64,
    pub commission: f64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerReport {
    pub partner_id: i64,
    pub referral_code: Option<String>,
    /// Newest first
    pub referrals: Vec<ReferralEntry>,
    pub total_commission: f64,
}

/// Commission earned on a paid booking amount.
#[must_use]
pub fn calculate_commission(amount: f64) -> f64 {
    (amount * COMMISSION_RATE * 100.0).round() / 100.0
}

pub async fn generate_admin_dashboard(db: &DatabaseConnection) -> Result<AdminDashboard> {
    let order_revenue = Order::find()
        .filter(order::Column::Status.ne(OrderStatus::Pending))
        .all(db)
        .await?
        .iter()
        .map(|o| o.total)
        .sum();

    let booking_revenue = Booking::find()
        .filter(booking::Column::PaymentStatus.eq(PaymentStatus::Paid))
        .all(db)
        .await?
        .iter()
        .filter_map(|b| b.payment_amount)
        .sum();

    Ok(AdminDashboard {
        order_revenue,
        booking_revenue,
        total_bookings: Booking::find().count(db).await?,
        pending_applications: ChefApplication::find()
            .filter(chef_application::Column::Status.eq(ApplicationStatus::Pending))
            .count(db)
            .await?,
        new_inquiries: Inquiry::find()
            .filter(inquiry::Column::Status.eq(InquiryStatus::New))
            .count(db)
            .await?,
        user_count: User::find().count(db).await?,
    })
}

fn booking_entry(booking: booking::Model) -> ReferralEntry {
    // Only money actually received earns commission
    let amount = if booking.payment_status == PaymentStatus::Paid {
        booking.payment_amount.unwrap_or_default()
    } else {
        0.0
    };
    ReferralEntry {
        kind: ReferralKind::Booking,
        id: booking.id,
        label: booking
            .event_type
            .unwrap_or_else(|| "Booking".to_string()),
        status: format!("{:?}", booking.status).to_uppercase(),
        amount,
        commission: calculate_commission(amount),
        created_at: booking.created_at,
    }
}

fn inquiry_entry(inquiry: inquiry::Model) -> ReferralEntry {
    ReferralEntry {
        kind: ReferralKind::Inquiry,
        id: inquiry.id,
        label: inquiry.company_name,
        status: format!("{:?}", inquiry.status).to_uppercase(),
        amount: 0.0,
        commission: 0.0,
        created_at: inquiry.created_at,
    }
}

/// Bookings and inquiries attributed to a partner, with commission totals.
pub async fn generate_partner_report(
    db: &DatabaseConnection,
    partner: &user::Model,
) -> Result<PartnerReport> {
    if partner.referral_code.is_none() {
        return Err(Error::forbidden("Only partners have a referral report"));
    }

    let bookings = Booking::find()
        .filter(booking::Column::PartnerId.eq(partner.id))
        .order_by_desc(booking::Column::CreatedAt)
        .all(db)
        .await?;
    let inquiries = Inquiry::find()
        .filter(inquiry::Column::PartnerId.eq(partner.id))
        .order_by_desc(inquiry::Column::CreatedAt)
        .all(db)
        .await?;

    let mut referrals: Vec<ReferralEntry> = bookings
        .into_iter()
        .map(booking_entry)
        .chain(inquiries.into_iter().map(inquiry_entry))
        .collect();
    referrals.sort_by(|a, b| b.created_at.cmp(&a.created_at));

    let total_commission = referrals.iter().map(|r| r.commission).sum();
    Ok(PartnerReport {
        partner_id: partner.id,
        referral_code: partner.referral_code.clone(),
        referrals,
        total_commission,
    })
}
