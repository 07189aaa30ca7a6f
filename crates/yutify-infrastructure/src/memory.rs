// SPDX-License-Identifier: GPL-3.0-or-later
use anyhow::Result;
use moka::sync::Cache;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::trace;
use yutify_domain::{AccessToken, Catalog, Resolution};

use crate::stores::{CredentialStore, ResultCacheStore};

/// Process-local credential store, used when no database is configured and in tests.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    tokens: Mutex<HashMap<Catalog, AccessToken>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, catalog: Catalog) -> Result<Option<AccessToken>> {
        Ok(self.tokens.lock().await.get(&catalog).cloned())
    }

    async fn put(&self, catalog: Catalog, token: &AccessToken) -> Result<()> {
        self.tokens.lock().await.insert(catalog, token.clone());
        Ok(())
    }
}

#[derive(Clone)]
struct CachedResolution {
    value: Resolution,
    expires_at: Instant,
}

/// Moka-backed result cache. The per-entry TTL is checked on read; the cache-wide
/// `max_ttl` bounds how long any entry can occupy memory.
pub struct MokaResultCacheStore {
    cache: Cache<String, CachedResolution>,
}

impl MokaResultCacheStore {
    pub fn new(max_capacity: u64, max_ttl: Duration) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .time_to_live(max_ttl)
                .build(),
        }
    }
}

#[async_trait::async_trait]
impl ResultCacheStore for MokaResultCacheStore {
    async fn get(&self, key: &str) -> Option<Resolution> {
        let entry = self.cache.get(key)?;
        if Instant::now() >= entry.expires_at {
            trace!(target: "cache", key, "entry expired");
            self.cache.invalidate(key);
            return None;
        }
        Some(entry.value)
    }

    async fn put(&self, key: String, value: Resolution, ttl: Duration) {
        self.cache.insert(
            key,
            CachedResolution {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }
}
