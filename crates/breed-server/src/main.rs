//! Breed Inquiry Server - Main entry point

use anyhow::Result;
use axum::{extract::Request, ServiceExt};
use breed_common::logging::{init_logging, LogConfig};
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::info;

use breed_server::{
    api,
    config::{load_dotenv, Config},
    db,
    features::breeds::PgBreedStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // LOG_* keys may live in .env too
    load_dotenv();

    // Environment variables take precedence over these defaults
    let log_config = LogConfig::builder()
        .log_file_prefix("breed-server")
        .filter_directives("breed_server=debug,tower_http=debug,sqlx=warn")
        .build()
        .merge_env()?;

    let _log_guard = init_logging(&log_config)?;

    info!("Starting Breed Inquiry Server");

    let config = Config::load()?;
    let addr: SocketAddr = config.server.socket_addr()?;
    info!("Configuration loaded - server will bind to {}", addr);

    let pool = db::create_pool(&config.database).await?;
    info!("Database connection pool established");

    let store = Arc::new(PgBreedStore::new(pool.clone()));
    let app = api::build_app(store, &config)?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    let token = CancellationToken::new();
    let shutdown = token.clone();
    let mut server = tokio::spawn(async move {
        axum::serve(
            listener,
            ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
        )
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await
    });

    tokio::select! {
        result = &mut server => {
            result??;
        },
        _ = shutdown_signal() => {
            token.cancel();

            let timeout = config.server.shutdown_timeout();
            info!("Waiting up to {:?} for connections to close", timeout);

            match tokio::time::timeout(timeout, &mut server).await {
                Ok(result) => result??,
                Err(_) => {
                    tracing::warn!("Shutdown timed out, dropping open connections");
                    server.abort();
                },
            }
        },
    }

    pool.close().await;
    info!("Server shut down gracefully");

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            },
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
            },
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
