// SPDX-License-Identifier: GPL-3.0-or-later
use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;
use yutify_domain::Catalog;

use crate::credentials::CredentialError;

pub type Result<T> = std::result::Result<T, CatalogError>;

/// Error type returned by the catalog clients. Adapters convert it to "absent" at
/// the [`CatalogAdapter`](crate::CatalogAdapter) boundary.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Network or protocol failure while performing the request.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The catalog responded with a non-success HTTP status code.
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    /// The catalog returned an error payload inside an otherwise successful response.
    #[error("{catalog} API error: {message}")]
    Api { catalog: Catalog, message: String },
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Credentials error: {0}")]
    Credentials(#[from] CredentialError),
    #[error("Rate limiter closed")]
    RateLimiterClosed,
}

impl CatalogError {
    /// Failures after which a secondary entity type is still worth trying.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::HttpStatus { .. } | Self::Api { .. })
    }
}

/// Validates status and error payloads shared by the JSON catalogs.
///
/// Deezer and KKBOX report errors as `{"error": {"message": ...}}`, Spotify as
/// `{"error": {"status": ..., "message": ...}}`, iTunes as `{"errorMessage": ...}`.
pub(crate) fn parse_catalog_body(
    catalog: Catalog,
    status: StatusCode,
    response_body: &str,
) -> Result<Value> {
    if !status.is_success() {
        return Err(CatalogError::HttpStatus {
            status,
            body: response_body.to_string(),
        });
    }

    let value: Value = serde_json::from_str(response_body)?;

    let message = match value.get("error") {
        Some(Value::String(message)) => Some(message.clone()),
        Some(error @ Value::Object(_)) => Some(
            error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string(),
        ),
        _ => value
            .get("errorMessage")
            .and_then(Value::as_str)
            .map(str::to_string),
    };

    if let Some(message) = message {
        return Err(CatalogError::Api { catalog, message });
    }

    Ok(value)
}
