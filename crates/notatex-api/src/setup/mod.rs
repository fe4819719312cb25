//! Application setup and initialization
//!
//! All startup logic lives here instead of main.rs: telemetry, database
//! pool + migrations, storage, the transcription client, and routing.

pub mod database;
pub mod routes;
pub mod server;

use std::sync::Arc;

use anyhow::{Context, Result};
use notatex_core::Config;
use notatex_db::{AccountRepository, ImageRepository, TokenRepository};
use notatex_storage::{LocalStorage, Storage};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::services::transcription::GeminiTranscriber;
use crate::state::AppState;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    init_telemetry();

    tracing::info!("Configuration loaded and validated successfully");

    if config.gemini_api_key.is_none() {
        tracing::warn!("GEMINI_API_KEY is not set; document generation requests will fail");
    }

    let pool = database::setup_database(&config).await?;

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(config.storage_path.clone())
            .await
            .map_err(|e| anyhow::anyhow!("Failed to initialize local storage: {}", e))?,
    );

    let transcriber = Arc::new(
        GeminiTranscriber::new(config.gemini_api_key.clone(), config.gemini_model.clone())
            .context("Failed to initialize transcription client")?,
    );

    let state = Arc::new(AppState {
        accounts: AccountRepository::new(pool.clone()),
        tokens: TokenRepository::new(pool.clone()),
        images: ImageRepository::new(pool.clone()),
        storage,
        transcriber,
        pool,
        config,
    });

    // Hygiene sweep; expired tokens are otherwise removed lazily on
    // verification.
    if let Err(e) = state.tokens.delete_expired().await {
        tracing::warn!(error = %e, "Startup token sweep failed");
    }

    let router = routes::setup_routes(&state.config, state.clone())?;

    Ok((state, router))
}

fn init_telemetry() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "notatex=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}
