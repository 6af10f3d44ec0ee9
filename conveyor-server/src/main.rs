use std::sync::Arc;

use anyhow::Context;
use conveyor_engine::Engine;
use conveyor_engine::capability::{self, Capability, CapabilityRegistry, EchoCapability};
use conveyor_engine::store::{FileStore, PgStore, Store};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod api;
pub mod config;

use config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "conveyor_server=info,conveyor_engine=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Conveyor server...");

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    config.validate()?;

    let store = open_store(&config).await?;
    let capabilities = load_capabilities(&config).await?;

    let engine = Arc::new(
        Engine::start(config.engine.clone(), store, capabilities)
            .await
            .context("Failed to start engine")?,
    );

    let app = api::create_router(api::AppState::new(
        Arc::clone(&engine),
        config.api_keys.clone(),
    ));

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    engine.shutdown().await;
    tracing::info!("Conveyor server stopped");
    Ok(())
}

/// PostgreSQL when a database URL is configured, JSON files otherwise
async fn open_store(config: &ServerConfig) -> anyhow::Result<Arc<dyn Store>> {
    match &config.database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let store = PgStore::connect(url)
                .await
                .context("Failed to create database pool")?;
            store
                .run_migrations()
                .await
                .context("Failed to run database migrations")?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::info!("Using file store at {}", config.data_dir.display());
            let store = FileStore::open(config.data_dir.clone())
                .await
                .with_context(|| format!("Failed to open {}", config.data_dir.display()))?;
            Ok(Arc::new(store))
        }
    }
}

/// Built-in capabilities plus any executables found in the plugins directory
async fn load_capabilities(config: &ServerConfig) -> anyhow::Result<CapabilityRegistry> {
    let mut registry = CapabilityRegistry::new();
    registry.register(EchoCapability)?;

    if let Some(dir) = &config.plugins_dir {
        let plugins = capability::discover(dir)
            .await
            .with_context(|| format!("Failed to scan plugins in {}", dir.display()))?;
        for plugin in plugins {
            tracing::info!(
                "Registering plugin {} {} ({})",
                plugin.name(),
                plugin.version(),
                plugin.program().display()
            );
            registry.register(plugin)?;
        }
    }

    Ok(registry)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, draining work");
}
