// SPDX-License-Identifier: GPL-3.0-or-later
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, instrument};
use yutify_domain::{PlatformFilter, Query, Resolution};
use yutify_infrastructure::ResultCacheStore;

use crate::error::ResolveError;
use crate::resolver::Resolver;

/// Cache key for a request: case-folded, trimmed artist and song plus the filter.
/// Separators inside either part are escaped so distinct queries never share a key.
pub fn cache_key(query: &Query, filter: PlatformFilter) -> String {
    format!(
        "{}:{}?{}",
        key_part(&query.artist),
        key_part(&query.song),
        filter.as_str()
    )
}

fn key_part(value: &str) -> String {
    value
        .trim()
        .to_lowercase()
        .replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('?', "\\?")
}

type InFlight = Arc<OnceCell<Resolution>>;

/// Front door of the engine: validates input, consults the result cache, and
/// collapses concurrent misses for the same key into one resolution.
pub struct CachedResolver {
    resolver: Arc<Resolver>,
    store: Arc<dyn ResultCacheStore>,
    ttl: Duration,
    in_flight: Mutex<HashMap<String, InFlight>>,
}

impl CachedResolver {
    pub fn new(resolver: Arc<Resolver>, store: Arc<dyn ResultCacheStore>, ttl: Duration) -> Self {
        Self {
            resolver,
            store,
            ttl,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    #[instrument(skip(self))]
    pub async fn resolve(
        &self,
        artist: &str,
        song: &str,
        filter: Option<&str>,
    ) -> Result<Resolution, ResolveError> {
        let filter = PlatformFilter::parse(filter)?;
        let query = Query::new(artist, song);
        if query.artist.is_empty() || query.song.is_empty() {
            return Err(ResolveError::EmptyQuery);
        }

        let key = cache_key(&query, filter);
        if let Some(hit) = self.store.get(&key).await {
            debug!(target: "cache", key = %key, "cache hit");
            return Ok(hit);
        }

        let cell = {
            let mut in_flight = self.in_flight.lock().await;
            Arc::clone(in_flight.entry(key.clone()).or_default())
        };

        let resolution = cell
            .get_or_init(|| async {
                // a concurrent leader may have filled the store between our miss and the lock
                if let Some(hit) = self.store.get(&key).await {
                    return hit;
                }
                debug!(target: "cache", key = %key, "cache miss, resolving");
                let resolution = self.resolver.resolve(&query, filter).await;
                self.store
                    .put(key.clone(), resolution.clone(), self.ttl)
                    .await;
                resolution
            })
            .await
            .clone();

        let mut in_flight = self.in_flight.lock().await;
        if in_flight
            .get(&key)
            .is_some_and(|current| Arc::ptr_eq(current, &cell))
        {
            in_flight.remove(&key);
        }

        Ok(resolution)
    }
}
