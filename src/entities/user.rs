//! User entity - every account on the marketplace.
//!
//! Clients, chefs, partners and administrators share one table and are told
//! apart by `role`. Partners carry a referral code used for attribution.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role, used for route gating and booking authorization
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[sea_orm(string_value = "USER")]
    User,
    #[sea_orm(string_value = "CHEF")]
    Chef,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
    #[sea_orm(string_value = "PARTNER")]
    Partner,
}

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2 PHC string, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    /// Only set for partners
    #[sea_orm(unique)]
    pub referral_code: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::chef_profile::Entity")]
    ChefProfile,
}

impl Related<super::chef_profile::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ChefProfile.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
