// SPDX-License-Identifier: GPL-3.0-or-later
pub mod cache;
pub mod engine;
pub mod error;
pub mod merge;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

use std::sync::Arc;
use tracing::info;

pub use cache::{cache_key, CachedResolver};
pub use engine::build_resolver;
pub use error::ResolveError;
pub use merge::{merge, MERGE_PRIORITY};
pub use resolver::{seed_candidates, CatalogSet, Resolver, Seed, SeedSource};

/// Shared handle passed to the HTTP layer.
#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<CachedResolver>,
}

impl AppState {
    pub fn new(resolver: Arc<CachedResolver>) -> Self {
        Self { resolver }
    }

    pub fn on_start(&self) {
        info!(target: "application", "application state initialized");
    }
}
