// SPDX-License-Identifier: GPL-3.0-or-later
use reqwest::{Client, RequestBuilder, Url};
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::debug;
use yutify_domain::Catalog;

use crate::error::{parse_catalog_body, CatalogError, Result};

/// Rate-limited JSON transport shared by the catalog clients.
pub(crate) struct Transport {
    catalog: Catalog,
    client: Client,
    rate_limiter: Arc<Semaphore>,
    /// Base URL stored without a trailing slash.
    base_url: String,
}

impl Transport {
    pub(crate) fn new(
        catalog: Catalog,
        client: Client,
        base_url: Option<String>,
        default_base_url: &str,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            catalog,
            client,
            rate_limiter: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
            base_url: base_url
                .unwrap_or_else(|| default_base_url.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    pub(crate) fn client(&self) -> &Client {
        &self.client
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn url(&self, path: &str) -> Result<Url> {
        Url::parse(&format!("{}/{}", self.base_url, path.trim_start_matches('/')))
            .map_err(|_| CatalogError::InvalidBaseUrl(self.base_url.clone()))
    }

    /// Sends the request under the concurrency limit and returns the validated JSON body.
    pub(crate) async fn send_json(&self, request: RequestBuilder) -> Result<Value> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|_| CatalogError::RateLimiterClosed)?;

        let response = request.send().await?;
        let status = response.status();
        debug!(target: "catalogs", catalog = %self.catalog, %status, url = %response.url(), "catalog response");
        let body = response.text().await?;
        parse_catalog_body(self.catalog, status, &body)
    }
}
