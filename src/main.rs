//! Counter Cache - A bounded TTL cache for externally sourced counters
//!
//! Runs the cache as an HTTP service in front of an upstream counter endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use counter_cache::api::create_router;
use counter_cache::{AppState, Config, CounterService, HttpFetcher, Sweeper};

/// Main entry point for the counter cache service.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Build the upstream fetcher and the counter service
/// 4. Start the expiry sweeper
/// 5. Serve the HTTP API until SIGINT/SIGTERM
/// 6. Stop the sweeper
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "counter_cache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting counter cache");

    let config = Config::from_env();
    info!(
        "Configuration loaded: max_size={}, ttl={}ms, concurrency={}, sweep_interval={}ms, upstream={}, port={}",
        config.max_size,
        config.ttl_ms,
        config.batch_concurrency,
        config.sweep_interval_ms,
        config.upstream_url,
        config.server_port
    );

    let fetcher = HttpFetcher::new(&config.upstream_url, config.fetch_timeout())
        .context("failed to build upstream fetcher")?;
    let counters = CounterService::from_config(&config, Arc::new(fetcher));

    let sweeper = Sweeper::start(counters.store(), config.sweep_interval());

    let app = create_router(AppState::new(counters));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    sweeper.stop().await;
    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
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
                warn!("Failed to install SIGTERM handler: {}", e);
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
