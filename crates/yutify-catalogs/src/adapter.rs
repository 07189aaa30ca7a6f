// SPDX-License-Identifier: GPL-3.0-or-later
use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde_json::Value;
use tracing::{debug, warn};
use yutify_domain::{Catalog, CatalogRecord};

use crate::credentials::CredentialManager;
use crate::error::{CatalogError, Result};
use crate::transport::Transport;

/// One external catalog as seen by the resolver.
///
/// Implementations never fail: transport, status, payload and credential errors are
/// logged and reported as `None`, so one unreachable catalog cannot fail a resolution.
#[async_trait]
pub trait CatalogAdapter: Send + Sync {
    async fn search(&self, artist: &str, song: &str) -> Option<CatalogRecord>;

    /// Identifier-based lookup. Catalogs without one fall back to [`search`](Self::search).
    async fn search_advanced(
        &self,
        artist: &str,
        song: &str,
        _isrc: Option<&str>,
        _upc: Option<&str>,
    ) -> Option<CatalogRecord> {
        self.search(artist, song).await
    }
}

/// Converts a client result into the adapter contract, logging the failure.
pub(crate) fn absent_on_error(
    catalog: Catalog,
    operation: &'static str,
    result: Result<Option<CatalogRecord>>,
) -> Option<CatalogRecord> {
    match result {
        Ok(record) => {
            if record.is_none() {
                debug!(target: "catalogs", %catalog, operation, "no matching candidate");
            }
            record
        }
        Err(error) => {
            warn!(target: "catalogs", %catalog, operation, error = %error, "catalog lookup failed, treating as absent");
            None
        }
    }
}

/// Sends a bearer-authenticated request. A 401 drops the cached token so the next
/// call refreshes it.
pub(crate) async fn send_authorized(
    transport: &Transport,
    credentials: &CredentialManager,
    request: RequestBuilder,
) -> Result<Value> {
    let token = credentials.ensure_fresh().await?;
    let result = transport
        .send_json(request.bearer_auth(&token.access_token))
        .await;

    if let Err(CatalogError::HttpStatus { status, .. }) = &result {
        if *status == StatusCode::UNAUTHORIZED {
            credentials.invalidate().await;
        }
    }

    result
}

/// Tracks the primary-then-secondary entity search. An empty result or a
/// recoverable error on one kind moves on to the next; the first such error is
/// reported only when no kind matched.
pub(crate) struct EntityFallback {
    catalog: Catalog,
    first_error: Option<CatalogError>,
}

impl EntityFallback {
    pub(crate) fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            first_error: None,
        }
    }

    pub(crate) fn attempt(
        &mut self,
        kind: &'static str,
        outcome: Result<Option<CatalogRecord>>,
    ) -> Result<Option<CatalogRecord>> {
        match outcome {
            Ok(record) => Ok(record),
            Err(error) if error.is_recoverable() => {
                debug!(target: "catalogs", catalog = %self.catalog, kind, error = %error, "entity search failed, trying next kind");
                self.first_error.get_or_insert(error);
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    pub(crate) fn finish(self) -> Result<Option<CatalogRecord>> {
        match self.first_error {
            Some(error) => Err(error),
            None => Ok(None),
        }
    }
}
