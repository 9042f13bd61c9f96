//! Nutrilens Backend
//!
//! Photo-first nutrition tracking: meal photos go through a generative
//! analysis gateway, reviewed results land on an append-only per-day
//! ledger, and onboarding derives each user's calorie budget.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! - Routes: HTTP request handling and routing
//! - Services: Business logic
//! - Repositories: Typed access over the document store
//! - Store: Pluggable document database (in-memory or Postgres JSONB)

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusBuilder;
use nutrilens_backend::{
    config::{self, StoreBackend},
    gateway::FoodAnalysisGateway,
    routes,
    state::AppState,
    store::{DocumentStore, MemoryStore, PostgresStore},
};
use secrecy::SecretString;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    init_tracing();

    // Load configuration
    let config = config::AppConfig::load()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = if config::AppConfig::is_production() { "production" } else { "development" },
        "Starting Nutrilens Backend"
    );

    // Validate production configuration
    if config::AppConfig::is_production() {
        validate_production_config(&config)?;
    }

    // Install the global metrics recorder
    let metrics = PrometheusBuilder::new().install_recorder()?;

    // Create the document store
    let store: Arc<dyn DocumentStore> = match config.store.backend {
        StoreBackend::Memory => {
            info!("Using in-memory document store");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Postgres => {
            info!("Connecting to Postgres...");
            let pool = PgPoolOptions::new()
                .max_connections(config.store.max_connections)
                .connect(&config.store.url)
                .await?;
            let store = PostgresStore::new(pool);
            store.ensure_schema().await?;
            Arc::new(store)
        }
    };

    // Create the analysis gateway
    let gateway = Arc::new(FoodAnalysisGateway::new(
        config.ai.base_url.clone(),
        SecretString::new(config.ai.api_key.clone()),
        config.ai.model.clone(),
    ));

    // Create application state
    let state = AppState::new(store, config.clone(), gateway, metrics);

    // Build application
    let app = routes::create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    info!(address = %addr, "Server listening");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Serve with graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if config::AppConfig::is_production() {
            "nutrilens_backend=info,tower_http=info".into()
        } else {
            "nutrilens_backend=debug,tower_http=debug,sqlx=warn".into()
        }
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config::AppConfig::is_production() {
        // JSON logging for production (better for log aggregation)
        subscriber
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        // Pretty logging for development
        subscriber
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

/// Validate configuration for production deployment
fn validate_production_config(config: &config::AppConfig) -> Result<()> {
    let mut errors = Vec::new();

    // Check JWT secret is not default
    if config.auth.jwt_secret.contains("development") || config.auth.jwt_secret.len() < 32 {
        errors.push("JWT secret must be at least 32 characters and not contain 'development'");
    }

    // The in-memory store loses everything on restart
    if config.store.backend == StoreBackend::Memory {
        errors.push("Production must use the postgres store backend");
    }

    if config.ai.api_key.is_empty() {
        errors.push("AI API key must be set in production");
    }

    if !errors.is_empty() {
        for err in &errors {
            error!("Configuration error: {}", err);
        }
        anyhow::bail!("Invalid production configuration");
    }

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
