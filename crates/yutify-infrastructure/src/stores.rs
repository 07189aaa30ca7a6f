// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::Result;
use std::time::Duration;
use yutify_domain::{AccessToken, Catalog, Resolution};

// ============================================================================
// Store Traits
// ============================================================================

/// Persists application-level catalog tokens. Backed by one row per catalog.
#[async_trait::async_trait]
pub trait CredentialStore: Send + Sync {
    async fn get(&self, catalog: Catalog) -> Result<Option<AccessToken>>;
    async fn put(&self, catalog: Catalog, token: &AccessToken) -> Result<()>;
}

/// Key-value store for finished resolutions. Entries expire after their TTL.
#[async_trait::async_trait]
pub trait ResultCacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Option<Resolution>;
    async fn put(&self, key: String, value: Resolution, ttl: Duration);
}
