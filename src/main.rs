//! httplru - A bounded LRU/TTL cache served over JSON-RPC

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use httplru::api::{create_router, AppState};
use httplru::loader::populate_from_file;
use httplru::{AdmissionController, CacheService, Config, LruCache};

/// Main entry point for the cache server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Open the storage backend and build the eviction engine
/// 4. Pre-populate from `TEST_DATA` if set
/// 5. Start HTTP server on configured port
/// 6. On SIGINT/SIGTERM, drain requests and close the backend
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "httplru=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting httplru cache server");

    let config = Config::from_env().context("failed to load configuration")?;
    info!(
        "Configuration loaded: max_entries={}, ttl={}, max_concurrent={}, rpc_timeout={}",
        config.max_cached_entries,
        humantime::format_duration(config.ttl),
        config.max_concurrent,
        humantime::format_duration(config.rpc_timeout)
    );
    info!(
        "Storage backend={:?}, port={}",
        config.backend, config.server_port
    );

    let backend = config.open_backend()?;
    info!("Storage backend '{}' ready", backend.kind());

    let cache = LruCache::with_backend(backend, config.max_cached_entries, config.ttl)?;
    let admission = AdmissionController::new(config.max_concurrent)?;
    let state = AppState::new(CacheService::new(cache, admission, config.rpc_timeout));

    if let Some(path) = &config.test_data {
        populate_from_file(&state.service, path)
            .await
            .with_context(|| format!("failed to load test data from {}", path.display()))?;
    }

    let app = create_router(state.clone());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Err(err) = state.service.shutdown() {
        error!("Failed to close storage backend: {}", err);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", err);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(err) => {
                error!("Failed to install SIGTERM handler: {}", err);
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
}
