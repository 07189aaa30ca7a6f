// SPDX-License-Identifier: GPL-3.0-or-later
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::serve;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use yutify_api::router;
use yutify_application::{build_resolver, AppState, CachedResolver};
use yutify_config::{load as load_config, HttpConfig};
use yutify_infrastructure::{
    http_client, init_database, MokaResultCacheStore, SqliteCredentialStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    let config_path = std::env::var_os("YUTIFY_CONFIG").map(PathBuf::from);
    let config = load_config(config_path.as_deref())?;
    init_tracing(&config.telemetry.log_level);

    let pool = init_database(&config).await?;
    let credentials = Arc::new(SqliteCredentialStore::new(pool));

    let resolver = build_resolver(&config.catalogs, http_client(&config.catalogs)?, credentials);
    let ttl = Duration::from_secs(config.cache.ttl_secs);
    let cache = Arc::new(MokaResultCacheStore::new(config.cache.max_capacity, ttl));
    let cached = CachedResolver::new(Arc::new(resolver), cache, ttl);

    let state = AppState::new(Arc::new(cached));
    state.on_start();

    let listener = TcpListener::bind(bind_addr(&config.http)?).await?;
    let addr = listener.local_addr()?;
    info!(target: "cli", "listening on {}", addr);

    serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn init_tracing(default_level: &str) {
    let fmt_layer = fmt::layer().with_target(true).with_thread_names(true).with_level(true);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn bind_addr(http: &HttpConfig) -> Result<SocketAddr> {
    let addr = format!("{}:{}", http.host, http.port);
    addr.parse()
        .with_context(|| format!("invalid listen address '{addr}'"))
}

async fn shutdown_signal() {
    #[cfg(unix)]
    let mut interrupt = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())
        .expect("install SIGINT handler");

    #[cfg(unix)]
    let mut terminate = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .expect("install SIGTERM handler");

    #[cfg(not(unix))]
    let interrupt = tokio::signal::ctrl_c();

    #[cfg(unix)]
    tokio::select! {
        _ = interrupt.recv() => {},
        _ = terminate.recv() => {},
    }

    #[cfg(not(unix))]
    {
        interrupt.await.expect("ctrl_c handler");
    }

    info!(target: "cli", "shutdown signal received");
}
