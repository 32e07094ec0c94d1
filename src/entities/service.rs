//! Service entity - a bookable chef service from the catalog.
//!
//! Tiered services list their packages in `tiers`; per-head services use
//! `unit_price` and `min_guests`. See `core::pricing` for how a booking amount
//! is derived from either shape.

use super::json::ServiceTiers;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceKind {
    #[sea_orm(string_value = "TIERED")]
    Tiered,
    #[sea_orm(string_value = "PER_HEAD")]
    PerHead,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub kind: ServiceKind,
    #[sea_orm(column_type = "Json")]
    pub tiers: ServiceTiers,
    /// Per-head price in major currency units
    pub unit_price: Option<f64>,
    pub min_guests: Option<i32>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::booking::Entity")]
    Bookings,
}

impl Related<super::booking::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
