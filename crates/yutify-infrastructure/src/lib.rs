// SPDX-License-Identifier: GPL-3.0-or-later
pub mod memory;
pub mod sqlite_adapters;
pub mod stores;

pub use memory::{InMemoryCredentialStore, MokaResultCacheStore};
pub use sqlite_adapters::SqliteCredentialStore;
pub use stores::{CredentialStore, ResultCacheStore};

use anyhow::Result;
use reqwest::Client;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::path::Path;
use std::time::Duration;
use tracing::info;
use yutify_config::{AppConfig, CatalogsConfig};

pub const USER_AGENT: &str = concat!("yutify/", env!("CARGO_PKG_VERSION"));

/// Shared outbound client for every catalog adapter.
pub fn http_client(config: &CatalogsConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.request_timeout_secs.max(1)))
        .pool_max_idle_per_host(8)
        .build()?;
    Ok(client)
}

pub async fn init_database(config: &AppConfig) -> Result<SqlitePool> {
    info!(target: "infrastructure", "initializing database");

    let db_url = if config.database.url.starts_with("sqlite://")
        && !config.database.url.starts_with("sqlite://:memory:")
    {
        let db_path = config.database.url.trim_start_matches("sqlite://");
        let path = Path::new(db_path);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
                info!(target: "infrastructure", path = %parent.display(), "created database directory");
            }
        }

        let absolute_path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()?.join(path)
        };

        // SQLite accepts forward slashes on every platform
        let path_str = absolute_path.to_string_lossy().replace('\\', "/");
        format!("sqlite://{}?mode=rwc", path_str)
    } else {
        config.database.url.clone()
    };

    info!(target: "infrastructure", db_url = %db_url, "connecting to database");

    let pool = SqlitePoolOptions::new()
        .max_connections(config.database.pool_max_size)
        .connect(&db_url)
        .await?;

    info!(target: "infrastructure", "running migrations");
    sqlx::migrate!("../../migrations").run(&pool).await?;

    info!(target: "infrastructure", "database initialized successfully");
    Ok(pool)
}
