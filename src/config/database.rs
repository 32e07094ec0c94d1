//! Database configuration module.
//!
//! This module handles database connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL.

use crate::entities::{
    Booking, ChefApplication, ChefProfile, Course, CourseProgress, Inquiry, Order, PasswordReset,
    Product, Service, User,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};
use tracing::{debug, info};

/// Default location of the `SQLite` database when `DATABASE_URL` is unset.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://data/needachef.sqlite?mode=rwc";

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    debug!("Connecting to database at {}", database_url);
    Database::connect(database_url).await.map_err(Into::into)
}

/// Creates all tables that do not exist yet.
///
/// Users come first because most other tables reference them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    let mut statements = vec![
        schema.create_table_from_entity(User),
        schema.create_table_from_entity(ChefProfile),
        schema.create_table_from_entity(ChefApplication),
        schema.create_table_from_entity(Service),
        schema.create_table_from_entity(Product),
        schema.create_table_from_entity(Booking),
        schema.create_table_from_entity(Order),
        schema.create_table_from_entity(Inquiry),
        schema.create_table_from_entity(Course),
        schema.create_table_from_entity(CourseProgress),
        schema.create_table_from_entity(PasswordReset),
    ];

    for statement in &mut statements {
        statement.if_not_exists();
        db.execute(builder.build(&*statement)).await?;
    }

    info!("Database tables ensured ({} tables).", statements.len());
    Ok(())
}
