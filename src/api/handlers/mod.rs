//! Route handlers, grouped by audience.

pub mod admin;
pub mod auth;
pub mod bookings;
pub mod catalog;
pub mod chef;
pub mod chefs;
pub mod courses;
pub mod orders;
pub mod partners;
pub mod payments;
pub mod uploads;

/// Liveness check. Does not touch the database.
#[allow(clippy::unused_async)]
pub async fn health_check() -> (axum::http::StatusCode, &'static str) {
    (axum::http::StatusCode::OK, "ok")
}
