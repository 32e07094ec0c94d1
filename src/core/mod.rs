//! Framework-agnostic business logic.
//!
//! Every operation is an `async fn` over a SeaORM connection plus whatever
//! collaborators it needs (payment gateway, text generator, task queue),
//! passed in explicitly.

pub mod applications;
pub mod assignment;
pub mod booking;
pub mod catalog;
pub mod chefs;
pub mod courses;
pub mod identity;
pub mod inquiries;
pub mod notifications;
pub mod orders;
pub mod payment;
pub mod policy;
pub mod pricing;
pub mod report;
