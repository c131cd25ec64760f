//! Serve command - runs the HTTP server

use std::net::SocketAddr;

use anyhow::Context;
use clap::Args;
use tokio::net::TcpListener;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::api::{create_router, AppState};
use crate::config::{AppConfig, ServerConfig};
use crate::infrastructure::logging::init_logging;
use crate::infrastructure::provider::build_provider;

/// Arguments for the serve command
#[derive(Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to bind, overrides `server.host`
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind, overrides `server.port`
    #[arg(long)]
    pub port: Option<u16>,
}

impl ServeArgs {
    fn apply(&self, server: &mut ServerConfig) {
        if let Some(host) = &self.host {
            server.host = host.clone();
        }
        if let Some(port) = self.port {
            server.port = port;
        }
    }
}

/// Run the server until a shutdown signal arrives
pub async fn run(args: ServeArgs) -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load().context("Failed to load configuration")?;
    args.apply(&mut config.server);

    init_logging(&config.logging);

    let provider = build_provider(&config)
        .await
        .context("Failed to initialize storage and cache backends")?;

    let shutdown = CancellationToken::new();
    let app = create_router(provider, AppState::new(config.retry.clone()), shutdown.clone());

    let addr = build_socket_addr(&config.server)?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!(%addr, "Starting server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    info!("Server shutdown complete");

    Ok(())
}

/// Resolves on ctrl-c or SIGTERM and cancels in-flight backend calls
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, initiating graceful shutdown"),
        _ = terminate => info!("Received SIGTERM, initiating graceful shutdown"),
    }

    shutdown.cancel();
}

fn build_socket_addr(server: &ServerConfig) -> anyhow::Result<SocketAddr> {
    let ip = server
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid server host '{}'", server.host))?;
    Ok(SocketAddr::from((ip, server.port)))
}
