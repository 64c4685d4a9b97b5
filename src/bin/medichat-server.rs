// ABOUTME: Server binary entrypoint for the medichat service
// ABOUTME: Loads configuration, initializes logging and storage, and serves HTTP
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Medichat

use anyhow::{Context, Result};
use medichat::{
    config::ServerConfig, database::Database, logging::LoggingConfig, resources::ServerResources,
    routes,
};
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let logging = LoggingConfig::from_env();
    logging.init().context("Failed to initialize logging")?;

    let config = ServerConfig::from_env().context("Failed to load configuration")?;

    let database = Arc::new(
        Database::new(&config.database_url)
            .await
            .context("Failed to connect to database")?,
    );
    info!("Database connected and migrated: {}", config.database_url);

    let http_port = config.http_port;
    let resources = Arc::new(
        ServerResources::new(config, database).context("Failed to assemble server resources")?,
    );

    let app = routes::router(resources);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", http_port))
        .await
        .with_context(|| format!("Failed to bind port {http_port}"))?;
    info!("Medichat server listening on port {http_port}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Medichat server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
