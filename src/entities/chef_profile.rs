//! Chef profile entity - the public-facing details of an approved chef.

use super::json::StringList;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "chef_profiles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// At most one profile per user
    #[sea_orm(unique)]
    pub user_id: i64,
    #[sea_orm(column_type = "Json")]
    pub specialties: StringList,
    pub years_of_experience: i32,
    #[sea_orm(column_type = "Json")]
    pub portfolio_images: StringList,
    pub bio: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
