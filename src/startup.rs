//! Application Startup
//!
//! Application building and server initialization.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::Router;
use redis::aio::ConnectionManager;
use sqlx::PgPool;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::application::services::TokenService;
use crate::config::Settings;
use crate::infrastructure::email::{EmailSender, SendinblueMailer};
use crate::infrastructure::producer::{KafkaLogProducer, LogProducer};
use crate::infrastructure::{cache, database};
use crate::presentation::http::routes;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub redis: ConnectionManager,
    pub token_service: Arc<TokenService>,
    pub mailer: Arc<dyn EmailSender>,
    pub log_producer: Arc<dyn LogProducer>,
    pub settings: Arc<Settings>,
}

impl AppState {
    /// TTL of the one-shot verification/reset tokens.
    pub fn verification_token_ttl(&self) -> Duration {
        Duration::from_secs(self.settings.jwt.verification_token_expiry_secs)
    }
}

/// Application instance
pub struct Application {
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Build the application from settings
    pub async fn build(settings: Settings) -> Result<Self> {
        // Create database pool
        let db = database::create_pool(&settings.database).await?;
        tracing::info!("Database connection pool created");

        database::run_migrations(&db).await?;
        tracing::info!("Database migrations applied");

        // Create Redis client
        let redis = cache::create_redis_client(&settings.redis).await?;
        tracing::info!("Redis connection established");

        // Process-wide singletons, initialized once and never mutated
        let token_service = Arc::new(TokenService::new(&settings.jwt));
        let mailer: Arc<dyn EmailSender> = Arc::new(SendinblueMailer::new(&settings.mailer));
        let log_producer: Arc<dyn LogProducer> =
            Arc::new(KafkaLogProducer::new(&settings.producer)?);
        tracing::info!("Mailer and log producer initialized");

        // Create app state
        let state = AppState {
            db,
            redis,
            token_service,
            mailer,
            log_producer,
            settings: Arc::new(settings.clone()),
        };

        // Build router with middleware
        let router = routes::create_router(state).layer(TraceLayer::new_for_http());

        // Bind to address
        let addr = SocketAddr::from(([0, 0, 0, 0], settings.server.port));
        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);

        Ok(Self { listener, router })
    }

    /// Run the server until stopped
    pub async fn run_until_stopped(self) -> Result<()> {
        axum::serve(self.listener, self.router).await?;
        Ok(())
    }

    /// Get the bound address
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}
