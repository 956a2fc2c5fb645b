//! # Userland
//!
//! Identity and session service entry point. Initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Database connection pool and migrations
//! - Redis client, mailer, and Kafka log producer
//! - HTTP server

use anyhow::Result;
use tracing::info;

use userland::config::Settings;
use userland::startup::Application;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing subscriber for structured logging
    userland::telemetry::init_tracing();

    info!("Starting userland...");

    // Load configuration from environment
    let settings = Settings::load()?;
    info!(port = %settings.server.port, "Configuration loaded");

    // Build and run the application
    let application = Application::build(settings).await?;

    info!("Server ready to accept connections");
    application.run_until_stopped().await?;

    Ok(())
}
