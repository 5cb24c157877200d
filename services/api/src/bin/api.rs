//! services/api/src/bin/api.rs

use async_openai::{config::OpenAIConfig, Client};
use lpms_api::{
    adapters::{DbAdapter, DisabledCompletion, HttpCourtPortal, MemoryStore, OpenAiCompletionAdapter},
    config::Config,
    error::ApiError,
    web::{build_router, state::AppState},
};
use lpms_core::ports::{CompletionService, DatabaseService};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Connect to Database & Run Migrations ---
    let db: Arc<dyn DatabaseService> = match &config.database_url {
        Some(url) => {
            info!("Connecting to database...");
            let db_pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
            let db_adapter = DbAdapter::new(db_pool);
            info!("Running database migrations...");
            db_adapter.run_migrations().await?;
            info!("Database migrations complete.");
            Arc::new(db_adapter)
        }
        None => {
            warn!("DATABASE_URL is not set; data is kept in memory and lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    // --- 3. Initialize Service Adapters ---
    let completion: Arc<dyn CompletionService> = match &config.openai_api_key {
        Some(key) => {
            let openai_client = Client::with_config(OpenAIConfig::new().with_api_key(key));
            Arc::new(OpenAiCompletionAdapter::new(
                openai_client,
                config.completion_model.clone(),
            ))
        }
        None => {
            warn!("OPENAI_API_KEY is not set; AI features fall back to their defaults");
            Arc::new(DisabledCompletion)
        }
    };
    let court = Arc::new(
        HttpCourtPortal::new(config.court_portal_url.clone(), config.court_timeout)
            .map_err(|e| ApiError::Internal(e.to_string()))?,
    );

    // --- 4. Build the Shared AppState and Router ---
    let app_state = Arc::new(AppState::new(db, config.clone(), completion, court));
    let app = build_router(app_state)?;

    // --- 5. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    info!(
        "Swagger UI available at http://{}/swagger-ui",
        config.bind_address
    );
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
