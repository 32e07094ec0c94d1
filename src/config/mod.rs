/// Application settings read from the environment
pub mod app;

/// Service and product catalog loading from a TOML file
pub mod catalog;

/// Database configuration and connection management
pub mod database;

pub use app::AppConfig;
