// SPDX-License-Identifier: GPL-3.0-or-later

//! Application-level client-credentials tokens for catalogs that require them.
//!
//! One [`CredentialManager`] exists per authenticated catalog. The token slot is
//! guarded by a single async mutex held across load, expiry check and refresh, so
//! concurrent callers observing an expired token trigger exactly one refresh.

use chrono::Utc;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info, instrument, warn};
use yutify_domain::{AccessToken, Catalog};
use yutify_infrastructure::CredentialStore;

/// Where and with which client credentials a catalog issues tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenEndpoint {
    pub url: String,
    pub client_id: String,
    pub client_secret: String,
}

impl TokenEndpoint {
    pub fn new(
        url: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }

    fn has_credentials(&self) -> bool {
        !self.client_id.trim().is_empty() && !self.client_secret.trim().is_empty()
    }
}

#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("No client credentials configured for {0}")]
    MissingClientCredentials(Catalog),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Token endpoint returned {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

fn default_expires_in() -> i64 {
    3600
}

#[derive(Default)]
struct TokenSlot {
    token: Option<AccessToken>,
    /// Whether the store has been consulted. It is read at most once per manager.
    loaded: bool,
}

pub struct CredentialManager {
    catalog: Catalog,
    client: Client,
    endpoint: TokenEndpoint,
    store: Arc<dyn CredentialStore>,
    slot: Mutex<TokenSlot>,
}

impl CredentialManager {
    pub fn new(
        catalog: Catalog,
        client: Client,
        endpoint: TokenEndpoint,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            catalog,
            client,
            endpoint,
            store,
            slot: Mutex::new(TokenSlot::default()),
        }
    }

    /// Returns a token valid at the time of the check, refreshing it when absent or expired.
    #[instrument(skip(self), fields(catalog = %self.catalog))]
    pub async fn ensure_fresh(&self) -> Result<AccessToken, CredentialError> {
        let mut slot = self.slot.lock().await;

        if !slot.loaded {
            slot.token = self.load_token().await;
            slot.loaded = true;
        }

        if let Some(token) = slot.token.as_ref() {
            if !token.is_expired() {
                return Ok(token.clone());
            }
            debug!(target: "credentials", catalog = %self.catalog, "access token expired");
        }

        let token = self.request_token().await?;
        self.save_token(&token).await;
        slot.token = Some(token.clone());
        Ok(token)
    }

    /// Drops the cached token so the next [`ensure_fresh`](Self::ensure_fresh) requests a new one.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.lock().await;
        slot.token = None;
        slot.loaded = true;
        debug!(target: "credentials", catalog = %self.catalog, "access token invalidated");
    }

    /// Reads the persisted token. Store failures are logged and treated as absent.
    pub async fn load_token(&self) -> Option<AccessToken> {
        match self.store.get(self.catalog).await {
            Ok(token) => token,
            Err(error) => {
                warn!(target: "credentials", catalog = %self.catalog, error = %error, "failed to load stored token, treating as absent");
                None
            }
        }
    }

    /// Writes through to the store. The store is a cache, so failures only warn.
    pub async fn save_token(&self, token: &AccessToken) {
        if let Err(error) = self.store.put(self.catalog, token).await {
            warn!(target: "credentials", catalog = %self.catalog, error = %error, "failed to persist access token");
        }
    }

    async fn request_token(&self) -> Result<AccessToken, CredentialError> {
        if !self.endpoint.has_credentials() {
            return Err(CredentialError::MissingClientCredentials(self.catalog));
        }

        let requested_at = Utc::now().timestamp();
        debug!(target: "credentials", catalog = %self.catalog, url = %self.endpoint.url, "requesting access token");

        let response = self
            .client
            .post(&self.endpoint.url)
            .basic_auth(&self.endpoint.client_id, Some(&self.endpoint.client_secret))
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(CredentialError::HttpStatus { status, body });
        }

        let payload: TokenResponse = serde_json::from_str(&body)?;
        info!(target: "credentials", catalog = %self.catalog, expires_in = payload.expires_in, "obtained access token");

        Ok(AccessToken {
            access_token: payload.access_token,
            refresh_token: payload.refresh_token,
            expires_in: payload.expires_in,
            requested_at,
        })
    }
}
