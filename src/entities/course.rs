//! Course entity - paid cooking courses made of modules and lessons.
//!
//! The module/lesson tree is stored as one JSON column; lessons are only ever
//! read together with their course.

use super::json::CourseModules;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "courses")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub category: Option<String>,
    /// Price in major currency units, 0 for free courses
    pub price: f64,
    pub image: Option<String>,
    /// Free text such as "6 weeks"
    pub duration: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub modules: CourseModules,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::course_progress::Entity")]
    Progress,
}

impl Related<super::course_progress::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Progress.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
