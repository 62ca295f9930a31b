//! Peercache node
//!
//! Serves the `scores` demo group to peers, and optionally a frontend API.
//!
//! # Startup Sequence
//! 1. Initialize tracing subscriber for logging
//! 2. Load configuration from environment variables
//! 3. Create the process registry and the demo group in it
//! 4. Build the peer pool and register it on the group
//! 5. Start the frontend API if configured
//! 6. Serve the peer endpoint until SIGINT/SIGTERM

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use once_cell::sync::Lazy;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use peercache::api::create_router;
use peercache::{AppState, Config, Group, GroupOptions, GroupRegistry, HttpPool};

/// Stand-in for a slow backing database.
static SLOW_DB: Lazy<HashMap<&'static str, &'static str>> =
    Lazy::new(|| HashMap::from([("Tom", "630"), ("Jack", "589"), ("Sam", "567")]));

fn create_scores_group(registry: &GroupRegistry, config: &Config) -> Arc<Group> {
    registry.create_group_with_options(
        "scores",
        config.cache_bytes,
        |key: &str| -> anyhow::Result<Vec<u8>> {
            info!(key, "[SlowDB] search key");
            match SLOW_DB.get(key) {
                Some(value) => Ok(value.as_bytes().to_vec()),
                None => anyhow::bail!("{key} not exist"),
            }
        },
        GroupOptions::default().with_ttl(config.ttl()),
    )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "peercache=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        node = %config.self_addr,
        peers = ?config.peers,
        cache_bytes = config.cache_bytes,
        ttl_secs = config.ttl_secs,
        "configuration loaded"
    );

    let registry = Arc::new(GroupRegistry::new());
    let group = create_scores_group(&registry, &config);

    let pool = Arc::new(
        HttpPool::new(config.self_addr.clone())
            .with_base_path(&config.base_path)
            .with_replicas(config.replicas)
            .with_timeout(config.peer_timeout()),
    );
    pool.set_peers(&config.peers);
    group.register_peers(pool.clone());

    let api_handle = match &config.api_addr {
        Some(api_addr) => Some(spawn_api_server(api_addr, group.clone()).await?),
        None => None,
    };

    let listen_addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("failed to bind peer endpoint on {listen_addr}"))?;
    info!("peercache is running at {}", config.self_addr);

    axum::serve(listener, pool.router(registry))
        .with_graceful_shutdown(shutdown_signal(api_handle))
        .await
        .context("peer server failed")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Binds the frontend API and serves it on a background task.
async fn spawn_api_server(api_addr: &str, group: Arc<Group>) -> anyhow::Result<JoinHandle<()>> {
    let listener = tokio::net::TcpListener::bind(api_addr)
        .await
        .with_context(|| format!("failed to bind frontend API on {api_addr}"))?;
    info!("frontend server is running at {api_addr}");

    let app = create_router(AppState::new(group));
    Ok(tokio::spawn(async move {
        if let Err(err) = axum::serve(listener, app).await {
            warn!(error = %err, "frontend server stopped");
        }
    }))
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the frontend API task if one is running.
async fn shutdown_signal(api_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to install Ctrl+C handler");
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
                warn!(error = %err, "failed to install SIGTERM handler");
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

    if let Some(handle) = api_handle {
        handle.abort();
        warn!("Frontend API aborted");
    }
}
