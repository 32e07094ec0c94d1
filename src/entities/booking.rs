//! Booking entity - a client's request for a chef service.
//!
//! A booking carries two independent state fields: the workflow `status`
//! (PENDING, CONFIRMED, COMPLETED, CANCELLED) and the `payment_status`
//! (PENDING, PAID, FAILED). `payment_reference` is replaced on every payment
//! retry; `transaction_id` is only set once a payment succeeds.

use super::json::StringList;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "COMPLETED")]
    Completed,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "PAID")]
    Paid,
    #[sea_orm(string_value = "FAILED")]
    Failed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bookings")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Client who requested the booking
    pub user_id: i64,
    /// Assigned chef, None until assignment
    pub chef_id: Option<i64>,
    pub service_id: Option<i64>,
    /// Partner credited with the referral, resolved from `referral_code`
    pub partner_id: Option<i64>,
    pub referral_code: Option<String>,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub date: DateTimeUtc,
    pub time: Option<String>,
    pub location: String,
    pub guests: i32,
    pub event_type: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub cuisine_preferences: StringList,
    pub dietary_restrictions: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub kitchen_equipment: StringList,
    pub details: Option<String>,
    /// Amount in major currency units
    pub payment_amount: Option<f64>,
    pub payment_status: PaymentStatus,
    #[sea_orm(unique)]
    pub payment_reference: Option<String>,
    pub transaction_id: Option<String>,
    pub status: BookingStatus,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    Client,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::ChefId",
        to = "super::user::Column::Id"
    )]
    Chef,
    #[sea_orm(
        belongs_to = "super::service::Entity",
        from = "Column::ServiceId",
        to = "super::service::Column::Id"
    )]
    Service,
}

impl Related<super::service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
