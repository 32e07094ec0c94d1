//! Shared state handed to every handler.

use crate::{
    config::AppConfig,
    services::{BlobStore, PaymentGateway, TextGenerator},
    tasks::TaskQueue,
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub generator: Arc<dyn TextGenerator>,
    pub blobs: Arc<dyn BlobStore>,
    pub tasks: TaskQueue,
}
