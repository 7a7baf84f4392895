// ABOUTME: Server binary: config and logging init, database bootstrap, axum serve
// ABOUTME: All settings come from the environment; flags only override the port
//
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::net::{Ipv4Addr, SocketAddr};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use taskchat_server::config::ServerConfig;
use taskchat_server::logging;
use taskchat_server::resources::ServerResources;
use taskchat_server::routes;

/// Conversational task-management assistant server
#[derive(Debug, Parser)]
#[command(name = "taskchat-server", version, about)]
struct Args {
    /// HTTP listen port, overrides HTTP_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env().context("Failed to initialize logging")?;

    let mut config = ServerConfig::from_env().context("Failed to load configuration")?;
    if let Some(port) = args.port {
        config.http_port = port;
    }

    info!("Starting taskchat-server: {}", config.summary());

    if !config.llm.any_configured() {
        // The server still starts; chat requests will report the missing
        // configuration until a provider key is supplied.
        tracing::warn!("No LLM provider credentials configured");
    }

    let resources = Arc::new(
        ServerResources::from_config(config)
            .await
            .context("Failed to initialize server resources")?,
    );
    info!(providers = ?resources.providers.names(), "Provider registry ready");

    let addr = SocketAddr::from((Ipv4Addr::UNSPECIFIED, resources.config.http_port));
    let app = routes::router(Arc::clone(&resources));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
    }
}
