//! # Harvest API
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Harvest API Server                               │
//! │                                                                         │
//! │  Browser ───► HTTP (5000) ───► axum Router ───► SQLite (documents)     │
//! │                                     │    └────► SQLite (accounts)      │
//! │                                     ▼                                   │
//! │                                 Razorpay                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use harvest_api::{build_router, AppConfig, AppState, RazorpayClient};
use harvest_db::{AccountStore, DbConfig, DocumentStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "harvest_api=info,harvest_db=info,tower_http=info".into()),
        )
        .with_target(true)
        .init();

    info!("Starting Harvest API server...");

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;
    info!(
        port = config.port,
        environment = ?config.environment,
        documents = %config.document_db_path.display(),
        accounts = %config.account_db_path.display(),
        "Configuration loaded"
    );

    // Open both stores (migrations run on connect)
    let documents = DocumentStore::new(
        DbConfig::new(config.document_db_path.clone()).max_connections(config.db_max_connections),
    )
        .await
        .context("Failed to open document store")?;
    let accounts = AccountStore::new(
        DbConfig::new(config.account_db_path.clone()).max_connections(config.db_max_connections),
    )
        .await
        .context("Failed to open account store")?;
    info!("Connected to both stores");

    let gateway = RazorpayClient::new(
        config.razorpay_base_url.clone(),
        config.razorpay_key_id.clone(),
        config.razorpay_key_secret.clone(),
    )
    .context("Failed to build payment gateway client")?;

    // Create shared state
    let state = AppState::new(
        documents.clone(),
        accounts.clone(),
        Arc::new(gateway),
        config.clone(),
    );
    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Starting HTTP server");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    documents.close().await;
    accounts.close().await;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown...");
}
