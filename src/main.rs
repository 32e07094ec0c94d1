#![allow(clippy::result_large_err)]

use dotenvy::dotenv;
use needachef::{
    api::{self, AppState},
    config::{AppConfig, catalog::load_catalog, database},
    core::{catalog::seed_catalog, courses::seed_courses},
    errors::Result,
    services::{
        BlobStore, EmailSender, GeminiClient, LocalBlobStore, LogEmailSender, PaymentGateway,
        PaystackClient, ResendClient, TextGenerator,
    },
    tasks::{TaskQueue, TaskWorker},
};
use std::{path::Path, sync::Arc};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Creates the parent directory of a file-backed `SQLite` URL.
fn ensure_sqlite_dir(database_url: &str) -> Result<()> {
    let Some(rest) = database_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let file = rest.split('?').next().unwrap_or_default();
    if let Some(parent) = Path::new(file).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received.");
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();
    info!("Attempted to load .env file.");

    // 3. Load the main application configuration
    let config = AppConfig::from_env()
        .inspect_err(|e| error!("Critical error loading application configuration: {}", e))?;

    // 4. Initialize database
    ensure_sqlite_dir(&config.database_url)?;
    let db = database::create_connection(&config.database_url)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {}", e))?;
    database::create_tables(&db)
        .await
        .inspect(|()| info!("Database initialized successfully."))
        .inspect_err(|e| error!("Failed to create tables: {}", e))?;

    // 5. Seed the catalog (if a catalog file is present)
    if Path::new(&config.catalog_path).exists() {
        let catalog = load_catalog(&config.catalog_path)?;
        seed_catalog(&db, &catalog)
            .await
            .inspect_err(|e| error!("Failed to seed catalog: {}", e))?;
        seed_courses(&db, &catalog.courses)
            .await
            .inspect_err(|e| error!("Failed to seed courses: {}", e))?;
    } else {
        warn!(path = %config.catalog_path, "No catalog file found, skipping seeding.");
    }

    // 6. External clients
    let gateway: Arc<dyn PaymentGateway> = Arc::new(PaystackClient::new(
        config.paystack_secret_key.clone(),
        config.paystack_base_url.clone(),
    ));
    let generator: Arc<dyn TextGenerator> = Arc::new(GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_model.clone(),
        config.gemini_base_url.clone(),
    ));
    let mailer: Arc<dyn EmailSender> = match &config.resend_api_key {
        Some(key) => Arc::new(ResendClient::new(key.clone(), config.resend_base_url.clone())),
        None => {
            warn!("RESEND_API_KEY not set, emails will only be logged.");
            Arc::new(LogEmailSender::default())
        }
    };
    let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(
        &config.upload_dir,
        &config.app_base_url,
    ));

    // 7. Background worker
    let (tasks, receiver) = TaskQueue::new();
    let worker = TaskWorker::new(
        db.clone(),
        Arc::clone(&generator),
        mailer,
        config.sender_email.clone(),
        receiver,
    );
    tokio::spawn(worker.run());

    // 8. Serve HTTP
    let bind_address = config.bind_address();
    let state = AppState {
        db,
        config: Arc::new(config),
        gateway,
        generator,
        blobs,
        tasks,
    };

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .inspect_err(|e| error!("Failed to bind {}: {}", bind_address, e))?;
    info!("Listening on {}", bind_address);

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped.");
    Ok(())
}
