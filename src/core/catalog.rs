//! Catalog business logic - services that can be booked and products that can be bought.
//!
//! The catalog is read-mostly reference data. Booking and checkout only read it;
//! the one concurrent write is the product stock decrement performed when an
//! order is paid.

use crate::{
    config::catalog::{CatalogConfig, ProductConfig, ServiceConfig},
    entities::{Product, Service, ServiceKind, ServiceTiers, product, service},
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use tracing::info;

fn validate_price(price: f64, what: &str) -> Result<()> {
    if !price.is_finite() || price <= 0.0 {
        return Err(Error::invalid_input(format!(
            "{what} must be a positive amount, got {price}"
        )));
    }
    Ok(())
}

/// Retrieves all services, ordered by name.
pub async fn list_services(db: &DatabaseConnection) -> Result<Vec<service::Model>> {
    Service::find()
        .order_by_asc(service::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

pub async fn get_service_by_id<C>(db: &C, service_id: i64) -> Result<Option<service::Model>>
where
    C: ConnectionTrait,
{
    Service::find_by_id(service_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a bookable service after checking that its price shape matches its kind.
///
/// # Errors
/// Returns `InvalidInput` if the name is empty, a tiered service has no tiers
/// or a non-positive tier price, or a per-head service lacks a positive unit price.
pub async fn create_service(
    db: &DatabaseConnection,
    input: &ServiceConfig,
) -> Result<service::Model> {
    if input.name.trim().is_empty() {
        return Err(Error::invalid_input("Service name cannot be empty"));
    }

    match input.kind {
        ServiceKind::Tiered => {
            if input.tiers.is_empty() {
                return Err(Error::invalid_input("Tiered services need at least one tier"));
            }
            for tier in &input.tiers {
                validate_price(tier.price, "Tier price")?;
            }
        }
        ServiceKind::PerHead => {
            let unit_price = input
                .unit_price
                .ok_or_else(|| Error::invalid_input("Per-head services need a unit price"))?;
            validate_price(unit_price, "Unit price")?;
        }
    }

    let service = service::ActiveModel {
        name: Set(input.name.trim().to_string()),
        description: Set(input.description.clone()),
        kind: Set(input.kind),
        tiers: Set(ServiceTiers(input.tiers.clone())),
        unit_price: Set(input.unit_price),
        min_guests: Set(input.min_guests),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };
    service.insert(db).await.map_err(Into::into)
}

/// Retrieves all active (non-deleted) products, ordered alphabetically by name.
pub async fn get_all_active_products(db: &DatabaseConnection) -> Result<Vec<product::Model>> {
    Product::find()
        .filter(product::Column::IsDeleted.eq(false))
        .order_by_asc(product::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves a product by id, returning None if it does not exist or is deleted.
pub async fn get_active_product_by_id<C>(db: &C, product_id: i64) -> Result<Option<product::Model>>
where
    C: ConnectionTrait,
{
    Product::find_by_id(product_id)
        .filter(product::Column::IsDeleted.eq(false))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a new product, performing input validation.
///
/// # Errors
/// Returns `InvalidInput` if the name is empty, the price is not a positive
/// finite number, or the stock is negative.
pub async fn create_product(
    db: &DatabaseConnection,
    input: &ProductConfig,
) -> Result<product::Model> {
    if input.name.trim().is_empty() {
        return Err(Error::invalid_input("Product name cannot be empty"));
    }
    validate_price(input.price, "Product price")?;
    if input.stock < 0 {
        return Err(Error::invalid_input("Stock cannot be negative"));
    }

    let now = chrono::Utc::now();
    let product = product::ActiveModel {
        name: Set(input.name.trim().to_string()),
        description: Set(input.description.clone()),
        category: Set(input.category.clone()),
        price: Set(input.price),
        stock: Set(input.stock),
        is_deleted: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    product.insert(db).await.map_err(Into::into)
}

/// Atomically decrements a product's stock: `stock = stock - quantity`.
///
/// There is no floor check; stock may go negative when orders oversell.
pub async fn decrement_stock_atomic<C>(db: &C, product_id: i64, quantity: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    use sea_orm::sea_query::Expr;

    let result = Product::update_many()
        .col_expr(
            product::Column::Stock,
            Expr::col(product::Column::Stock).sub(quantity),
        )
        .col_expr(product::Column::UpdatedAt, Expr::value(chrono::Utc::now()))
        .filter(product::Column::Id.eq(product_id))
        .exec(db)
        .await?;

    if result.rows_affected == 0 {
        return Err(Error::not_found("Product", product_id));
    }
    Ok(())
}

/// Inserts the catalog file's services and products into empty tables.
///
/// Each table is seeded independently; a table that already has rows is left
/// untouched. Returns the number of services and products inserted.
pub async fn seed_catalog(db: &DatabaseConnection, catalog: &CatalogConfig) -> Result<(usize, usize)> {
    let mut services = 0;
    if Service::find().count(db).await? == 0 {
        for entry in &catalog.services {
            create_service(db, entry).await?;
            services += 1;
        }
    }

    let mut products = 0;
    if Product::find().count(db).await? == 0 {
        for entry in &catalog.products {
            create_product(db, entry).await?;
            products += 1;
        }
    }

    info!(services, products, "Catalog seeding finished");
    Ok((services, products))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::entities::ServiceTier;
    use crate::test_utils::*;

    fn product_input(name: &str, price: f64, stock: i32) -> ProductConfig {
        ProductConfig {
            name: name.to_string(),
            description: None,
            category: Some("Cookware".to_string()),
            price,
            stock,
        }
    }

    #[tokio::test]
    async fn test_create_product_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let result = create_product(&db, &product_input("   ", 10.0, 1)).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = create_product(&db, &product_input("Pan", -10.0, 1)).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = create_product(&db, &product_input("Pan", f64::NAN, 1)).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let result = create_product(&db, &product_input("Pan", 10.0, -1)).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        assert_eq!(Product::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_create_service_validation() -> Result<()> {
        let db = setup_test_db().await?;

        let tiered_without_tiers = ServiceConfig {
            name: "Dinner".to_string(),
            description: None,
            kind: ServiceKind::Tiered,
            tiers: vec![],
            unit_price: None,
            min_guests: None,
        };
        let result = create_service(&db, &tiered_without_tiers).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        let per_head_without_price = ServiceConfig {
            kind: ServiceKind::PerHead,
            ..tiered_without_tiers
        };
        let result = create_service(&db, &per_head_without_price).await;
        assert!(matches!(result, Err(Error::InvalidInput { .. })));

        assert_eq!(Service::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_active_products_hide_deleted() -> Result<()> {
        let db = setup_test_db().await?;
        let pan = create_test_product(&db, "Pan", 1000.0, 5).await?;
        let knife = create_test_product(&db, "Knife", 2500.0, 5).await?;

        let mut deleted: product::ActiveModel = knife.clone().into();
        deleted.is_deleted = Set(true);
        deleted.update(&db).await?;

        let active = get_all_active_products(&db).await?;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, pan.id);
        assert!(get_active_product_by_id(&db, knife.id).await?.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_decrement_stock_atomic_allows_negative() -> Result<()> {
        let db = setup_test_db().await?;
        let pan = create_test_product(&db, "Pan", 1000.0, 1).await?;

        decrement_stock_atomic(&db, pan.id, 3).await?;

        let stored = Product::find_by_id(pan.id).one(&db).await?.unwrap();
        assert_eq!(stored.stock, -2);

        let missing = decrement_stock_atomic(&db, 9999, 1).await;
        assert!(matches!(missing, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_catalog_only_fills_empty_tables() -> Result<()> {
        let db = setup_test_db().await?;
        let catalog = CatalogConfig {
            services: vec![ServiceConfig {
                name: "Private Dinner".to_string(),
                description: None,
                kind: ServiceKind::Tiered,
                tiers: vec![ServiceTier {
                    name: "Intimate".to_string(),
                    price: 50000.0,
                    coverage: "up to 4 guests".to_string(),
                }],
                unit_price: None,
                min_guests: None,
            }],
            products: vec![product_input("Pan", 1000.0, 5)],
            courses: Vec::new(),
        };

        assert_eq!(seed_catalog(&db, &catalog).await?, (1, 1));
        assert_eq!(seed_catalog(&db, &catalog).await?, (0, 0));
        assert_eq!(list_services(&db).await?.len(), 1);
        Ok(())
    }
}
