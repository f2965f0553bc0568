//! fairmap server entry point.
//!
//! Starts the Axum HTTP server with the REST API and static uploads.

use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use fairmap::api;
use fairmap::app_state::AppState;
use fairmap::config::{LogFormat, MapConfig};
use fairmap::media::default_transcoder;
use fairmap::persistence::{MapStore, MemoryStore, PostgresStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = MapConfig::from_env().map_err(|e| anyhow::anyhow!(e))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting fairmap");

    // Build persistence layer
    let store: Arc<dyn MapStore> = if config.persistence_enabled {
        let store = PostgresStore::connect(&config)
            .await
            .context("connecting to database")?;
        if config.run_migrations {
            store
                .migrate(&config.migrations_dir)
                .await
                .context("running migrations")?;
        }
        Arc::new(store)
    } else {
        tracing::warn!("persistence disabled, data is kept in memory only");
        Arc::new(MemoryStore::new())
    };

    tokio::fs::create_dir_all(&config.upload_dir)
        .await
        .with_context(|| format!("creating {}", config.upload_dir.display()))?;

    // Build application state and router
    let app_state = AppState::new(&config, store, default_transcoder())?;
    let app = api::build_app(app_state, &config);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
