//! JSON-backed column types shared by several entities.
//!
//! SeaORM stores these as JSON text; `FromJsonQueryResult` handles the
//! round trip through the database driver.

use sea_orm::FromJsonQueryResult;
use serde::{Deserialize, Serialize};

/// A list of free-form strings (cuisines, specialties, image URLs, ...).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct StringList(pub Vec<String>);

impl StringList {
    #[must_use]
    pub fn joined(&self, separator: &str) -> String {
        self.0.join(separator)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<String>> for StringList {
    fn from(value: Vec<String>) -> Self {
        Self(value)
    }
}

/// One priced package of a tiered service.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceTier {
    pub name: String,
    /// Price in major currency units
    pub price: f64,
    /// Guest range covered by this tier, e.g. "up to 10 guests"
    #[serde(default)]
    pub coverage: String,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct ServiceTiers(pub Vec<ServiceTier>);

/// A purchased line item, denormalized onto the order at checkout time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: i64,
    pub name: String,
    pub quantity: i32,
    pub unit_price: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct OrderItems(pub Vec<OrderItem>);

/// One lesson inside a course module. `id` is unique within its course and is
/// what learning progress refers to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseModule {
    pub title: String,
    #[serde(default)]
    pub lessons: Vec<Lesson>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
#[serde(transparent)]
pub struct CourseModules(pub Vec<CourseModule>);

impl CourseModules {
    /// All lessons in module order.
    pub fn lessons(&self) -> impl Iterator<Item = &Lesson> {
        self.0.iter().flat_map(|m| m.lessons.iter())
    }
}
