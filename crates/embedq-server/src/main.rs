use std::sync::Arc;

use embedq_core::impls::{InMemoryTaskStore, SqliteTaskStore};
use embedq_core::ports::TaskStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use embedq_server::config::ServerConfig;
use embedq_server::{build_app, build_state};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "embedq_server=debug,embedq_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    let addr = config.socket_addr();
    tracing::info!(%addr, "Loaded server configuration");

    // --- Task store ---
    let sqlite = match &config.database_url {
        Some(url) => match SqliteTaskStore::connect(url).await {
            Ok(store) => Some(Arc::new(store)),
            Err(e) => {
                tracing::error!(error = %e, "Failed to open task database");
                std::process::exit(1);
            }
        },
        None => None,
    };
    let store: Arc<dyn TaskStore> = match &sqlite {
        Some(sqlite) => sqlite.clone(),
        None => {
            tracing::warn!("DATABASE_URL not set, tasks are kept in memory only");
            Arc::new(InMemoryTaskStore::new())
        }
    };

    // --- Router ---
    let app = build_app(build_state(config, store));

    // --- Start server ---
    tracing::info!(%addr, "Starting server");
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, %addr, "Failed to bind to address");
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        tracing::error!(error = %e, "Server error");
    }

    // --- Post-shutdown cleanup ---
    if let Some(sqlite) = sqlite {
        sqlite.close().await;
        tracing::info!("Task database closed");
    }
    tracing::info!("Graceful shutdown complete");
}

/// Wait for SIGINT (Ctrl-C) or, on Unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
