//! Catalog seed loading from a TOML file.
//!
//! The services, products and courses listed in the catalog file are inserted
//! on startup when the corresponding tables are empty.

use crate::entities::{CourseModule, ServiceKind, ServiceTier};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// The whole catalog file
#[derive(Debug, Default, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
    #[serde(default)]
    pub products: Vec<ProductConfig>,
    #[serde(default)]
    pub courses: Vec<CourseConfig>,
}

/// One bookable service
#[derive(Debug, Deserialize, Clone)]
pub struct ServiceConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub kind: ServiceKind,
    #[serde(default)]
    pub tiers: Vec<ServiceTier>,
    #[serde(default)]
    pub unit_price: Option<f64>,
    #[serde(default)]
    pub min_guests: Option<i32>,
}

/// One shop product
#[derive(Debug, Deserialize, Clone)]
pub struct ProductConfig {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub price: f64,
    pub stock: i32,
}

/// One course with its modules and lessons. Also the admin create/update body.
#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CourseConfig {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub modules: Vec<CourseModule>,
}

/// Loads the catalog from a TOML file.
///
/// # Errors
/// Returns an error if the file cannot be read or the TOML is invalid.
pub fn load_catalog<P: AsRef<Path>>(path: P) -> Result<CatalogConfig> {
    let path_ref = path.as_ref();
    tracing::debug!("Attempting to load catalog from: {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read catalog file {path_ref:?}: {e}"),
    })?;

    parse_catalog(&contents)
}

/// Parses catalog TOML text.
pub fn parse_catalog(contents: &str) -> Result<CatalogConfig> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse catalog TOML: {e}"),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_parse_catalog() {
        let toml_str = r#"
            [[services]]
            name = "Private Dinner"
            kind = "TIERED"
            tiers = [
                { name = "Intimate", price = 50000.0, coverage = "up to 4 guests" },
                { name = "Party", price = 120000.0, coverage = "up to 12 guests" },
            ]

            [[services]]
            name = "Buffet"
            kind = "PER_HEAD"
            unit_price = 5000.0
            min_guests = 20

            [[products]]
            name = "Chef Knife"
            price = 1000.0
            stock = 10

            [[courses]]
            title = "Knife Skills"
            category = "Basics"

            [[courses.modules]]
            title = "Cuts"
            lessons = [
                { id = "julienne", title = "Julienne" },
                { id = "brunoise", title = "Brunoise", videoUrl = "https://video.example/b" },
            ]
        "#;

        let catalog = parse_catalog(toml_str).unwrap();
        assert_eq!(catalog.services.len(), 2);
        assert_eq!(catalog.services[0].kind, ServiceKind::Tiered);
        assert_eq!(catalog.services[0].tiers[1].price, 120000.0);
        assert_eq!(catalog.services[1].kind, ServiceKind::PerHead);
        assert_eq!(catalog.services[1].min_guests, Some(20));
        assert_eq!(catalog.products[0].stock, 10);
        assert_eq!(catalog.courses[0].price, 0.0);
        assert_eq!(catalog.courses[0].modules[0].lessons.len(), 2);
        assert_eq!(
            catalog.courses[0].modules[0].lessons[1].video_url.as_deref(),
            Some("https://video.example/b")
        );
    }

    #[test]
    fn test_parse_catalog_rejects_unknown_kind() {
        let toml_str = r#"
            [[services]]
            name = "Mystery"
            kind = "HOURLY"
        "#;

        let result = parse_catalog(toml_str);
        assert!(matches!(result, Err(Error::Config { .. })));
    }

    #[test]
    fn test_load_catalog_missing_file() {
        let result = load_catalog("/definitely/not/here/catalog.toml");
        assert!(matches!(result, Err(Error::Config { .. })));
    }
}
