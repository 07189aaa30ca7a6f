// SPDX-License-Identifier: GPL-3.0-or-later
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};
use yutify_domain::LyricsRecord;

use crate::error::CatalogError;

pub const LYRICS_OVH_BASE_URL: &str = "https://api.lyrics.ovh";

/// A provider of song lyrics, consulted by [`LyricsChain`] in order.
#[async_trait]
pub trait LyricsSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_lyrics(
        &self,
        artist: &str,
        song: &str,
    ) -> Result<Option<LyricsRecord>, LyricsError>;
}

#[derive(Debug, Error)]
pub enum LyricsError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: StatusCode, body: String },
    #[error("Lyrics API error: {message}")]
    Api { message: String },
    #[error("Deserialization error: {0}")]
    Deserialization(#[from] serde_json::Error),
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),
    #[error("Rate limiter closed")]
    RateLimiterClosed,
}

/// Client for the public lyrics.ovh service.
pub struct LyricsOvhClient {
    client: Client,
    rate_limiter: Arc<Semaphore>,
    base_url: String,
}

impl LyricsOvhClient {
    pub fn new_with_client(
        client: Client,
        base_url: Option<String>,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Semaphore::new(max_concurrent_requests.max(1))),
            base_url: base_url
                .unwrap_or_else(|| LYRICS_OVH_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }
}

#[async_trait]
impl LyricsSource for LyricsOvhClient {
    fn name(&self) -> &'static str {
        "lyrics.ovh"
    }

    #[instrument(skip(self), fields(artist = artist, song = song))]
    async fn fetch_lyrics(
        &self,
        artist: &str,
        song: &str,
    ) -> Result<Option<LyricsRecord>, LyricsError> {
        let _permit = self
            .rate_limiter
            .acquire()
            .await
            .map_err(|_| LyricsError::RateLimiterClosed)?;

        let mut url = Url::parse(&self.base_url)
            .map_err(|source| LyricsError::InvalidBaseUrl(source.to_string()))?;
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| LyricsError::InvalidBaseUrl(self.base_url.clone()))?;
            segments.extend(["v1", artist, song]);
        }

        debug!(target: "lyrics", url = %url, "fetching lyrics");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        let response_body = response.text().await?;

        // lyrics.ovh answers an unknown song with 404 and an error payload
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let payload = parse_lyrics_body(status, &response_body)?;

        Ok(payload
            .lyrics
            .filter(|value| !value.trim().is_empty())
            .map(|lyrics| LyricsRecord {
                artist: artist.to_string(),
                title: song.to_string(),
                lyrics,
                source: self.name().to_string(),
            }))
    }
}

#[derive(Debug, Deserialize)]
struct LyricsApiResponse {
    lyrics: Option<String>,
    error: Option<String>,
}

fn parse_lyrics_body(
    status: StatusCode,
    response_body: &str,
) -> Result<LyricsApiResponse, LyricsError> {
    if !status.is_success() {
        return Err(LyricsError::HttpStatus {
            status,
            body: response_body.to_string(),
        });
    }

    let payload: LyricsApiResponse = serde_json::from_str(response_body)?;

    if let Some(message) = payload.error.as_deref() {
        return Err(LyricsError::Api {
            message: message.to_string(),
        });
    }

    Ok(payload)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub provider: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum LyricsLookupError {
    #[error("All lyrics providers failed")]
    ProvidersFailed(Vec<ProviderError>),
    #[error("No lyrics found from configured providers")]
    NoLyricsFound,
}

/// Ordered lyrics providers; the first non-blank lyrics win.
#[derive(Clone, Default)]
pub struct LyricsChain {
    providers: Vec<Arc<dyn LyricsSource>>,
}

impl LyricsChain {
    pub fn new(providers: Vec<Arc<dyn LyricsSource>>) -> Self {
        Self { providers }
    }

    #[instrument(skip(self), fields(artist = artist, song = song))]
    pub async fn fetch_lyrics(
        &self,
        artist: &str,
        song: &str,
    ) -> Result<LyricsRecord, LyricsLookupError> {
        let mut provider_errors = Vec::new();

        for provider in &self.providers {
            match provider.fetch_lyrics(artist, song).await {
                Ok(Some(record)) if !record.lyrics.trim().is_empty() => return Ok(record),
                Ok(_) => {
                    debug!(target: "lyrics", provider = provider.name(), "no lyrics returned from provider");
                }
                Err(error) => {
                    warn!(target: "lyrics", provider = provider.name(), error = %error, "provider failed");
                    provider_errors.push(ProviderError {
                        provider: provider.name(),
                        message: error.to_string(),
                    });
                }
            }
        }

        if !self.providers.is_empty() && provider_errors.len() == self.providers.len() {
            return Err(LyricsLookupError::ProvidersFailed(provider_errors));
        }

        Err(LyricsLookupError::NoLyricsFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource {
        name: &'static str,
        outcome: fn() -> Result<Option<LyricsRecord>, LyricsError>,
    }

    #[async_trait]
    impl LyricsSource for FixedSource {
        fn name(&self) -> &'static str {
            self.name
        }

        async fn fetch_lyrics(
            &self,
            _artist: &str,
            _song: &str,
        ) -> Result<Option<LyricsRecord>, LyricsError> {
            (self.outcome)()
        }
    }

    fn lyrics(text: &str, source: &str) -> LyricsRecord {
        LyricsRecord {
            artist: "Daft Punk".to_string(),
            title: "Digital Love".to_string(),
            lyrics: text.to_string(),
            source: source.to_string(),
        }
    }

    fn source(
        name: &'static str,
        outcome: fn() -> Result<Option<LyricsRecord>, LyricsError>,
    ) -> Arc<dyn LyricsSource> {
        Arc::new(FixedSource { name, outcome })
    }

    #[tokio::test]
    async fn blank_lyrics_fall_through_to_next_provider() {
        let chain = LyricsChain::new(vec![
            source("first", || Ok(Some(lyrics("   ", "first")))),
            source("second", || Ok(Some(lyrics("Last night I had a dream", "second")))),
        ]);

        let record = chain.fetch_lyrics("Daft Punk", "Digital Love").await.unwrap();
        assert_eq!(record.source, "second");
    }

    #[tokio::test]
    async fn all_failures_are_reported() {
        let chain = LyricsChain::new(vec![
            source("first", || Err(LyricsError::RateLimiterClosed)),
            source("second", || {
                Err(LyricsError::Api {
                    message: "boom".to_string(),
                })
            }),
        ]);

        match chain.fetch_lyrics("Daft Punk", "Digital Love").await {
            Err(LyricsLookupError::ProvidersFailed(errors)) => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[1].provider, "second");
            }
            other => panic!("expected ProvidersFailed, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn one_failure_and_one_miss_is_not_found() {
        let chain = LyricsChain::new(vec![
            source("first", || Err(LyricsError::RateLimiterClosed)),
            source("second", || Ok(None)),
        ]);
        assert!(matches!(
            chain.fetch_lyrics("Daft Punk", "Digital Love").await,
            Err(LyricsLookupError::NoLyricsFound)
        ));
    }

    #[test]
    fn error_payload_is_api_error() {
        let result = parse_lyrics_body(StatusCode::OK, r#"{"error":"No lyrics found"}"#);
        assert!(matches!(result, Err(LyricsError::Api { .. })));
    }
}
