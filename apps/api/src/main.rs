//! # Mesa API Server
//!
//! Entry point: configuration, logging, key material, database, HTTP.
//!
//! ## Startup Sequence
//! ```text
//! .env ──► ServerConfig::load ──► read PEM key pair ──► Database::new
//!                                   (unreadable: exit)    (migrations)
//!                                                            │
//!                                                            ▼
//!                          axum::serve ◄── TcpListener::bind(http_addr)
//!                               │
//!                     Ctrl+C / SIGTERM ──► graceful shutdown ──► pool closed
//! ```

use std::fs;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use mesa_api::{app, AppState, JwtManager, ServerConfig};
use mesa_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; variables may come from the environment.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,mesa_api=debug")),
        )
        .with_target(true)
        .init();

    info!("Starting Mesa API server...");

    let config = ServerConfig::load().context("Invalid configuration")?;
    info!(
        addr = %config.http_addr,
        database = %config.database_path.display(),
        token_hours = config.jwt_lifetime_hours,
        "Configuration loaded"
    );

    let private_pem = fs::read(&config.jwt_private_key_path).with_context(|| {
        format!(
            "Cannot read private key {}",
            config.jwt_private_key_path.display()
        )
    })?;
    let public_pem = fs::read(&config.jwt_public_key_path).with_context(|| {
        format!(
            "Cannot read public key {}",
            config.jwt_public_key_path.display()
        )
    })?;
    let jwt = JwtManager::from_pem(&private_pem, &public_pem, config.jwt_lifetime_hours)
        .context("Invalid RSA key pair")?;
    info!("Signing keys loaded");

    let db = Database::new(
        DbConfig::new(config.database_path.clone()).max_connections(config.max_connections),
    )
    .await
    .context("Failed to open database")?;
    info!("Database ready");

    let state = AppState::new(db.clone(), jwt);
    let listener = TcpListener::bind(config.http_addr)
        .await
        .with_context(|| format!("Cannot bind {}", config.http_addr))?;
    info!(addr = %config.http_addr, "Listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    db.close().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
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
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down"),
        _ = terminate => info!("Received SIGTERM, shutting down"),
    }
}
