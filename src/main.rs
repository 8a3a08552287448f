//! Tafsir Shell - An offline-first app-shell cache
//!
//! Fronts the application origin and routes every request through the
//! offline controller.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tafsir_shell::{
    api::create_router, cache::MemoryCacheStorage, network::HttpNetwork, spawn_install_task,
    AppState, Config,
};

/// Main entry point.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create cache storage, origin client and controller
/// 4. Start background install task
/// 5. Serve HTTP until SIGINT/SIGTERM
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tafsir_shell=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tafsir Shell offline cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: origin={}, cache={}, shell={}, port={}, quota={} bytes, purge_stale={}",
        config.origin,
        config.cache_name,
        config.shell_path,
        config.server_port,
        config.cache_quota_bytes,
        config.purge_stale_caches
    );

    let storage = Arc::new(MemoryCacheStorage::from_config(&config));
    let network = Arc::new(HttpNetwork::from_config(&config).context("creating origin client")?);
    let state = AppState::from_config(&config, storage, network)
        .context("creating offline controller")?;

    let install_handle = spawn_install_task(state.controller.clone(), config.install_retry_interval);
    info!("Install task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {}", addr))?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(install_handle))
        .await
        .context("serving HTTP")?;

    info!("Shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// Aborts the install task if it is still retrying.
async fn shutdown_signal(install_handle: tokio::task::JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                warn!("Failed to install SIGTERM handler: {}", err);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if !install_handle.is_finished() {
        install_handle.abort();
        warn!("Install task aborted before activation");
    }
}
