// SPDX-License-Identifier: GPL-3.0-or-later
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument};
use yutify_domain::{Catalog, CatalogRecord};

use crate::adapter::{absent_on_error, send_authorized, CatalogAdapter};
use crate::credentials::CredentialManager;
use crate::dates::normalize_release_date;
use crate::error::Result;
use crate::matcher::matches;
use crate::transport::Transport;

pub const DEFAULT_BASE_URL: &str = "https://api.kkbox.com";
pub const DEFAULT_TOKEN_URL: &str = "https://account.kkbox.com/oauth2/token";
pub const DEFAULT_TERRITORY: &str = "TW";

/// KKBOX Open API client. Only consulted through the platform filter.
pub struct KkboxClient {
    transport: Transport,
    credentials: Arc<CredentialManager>,
    territory: String,
}

impl KkboxClient {
    pub fn new_with_client(
        client: Client,
        base_url: Option<String>,
        credentials: Arc<CredentialManager>,
        territory: &str,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            transport: Transport::new(
                Catalog::Kkbox,
                client,
                base_url,
                DEFAULT_BASE_URL,
                max_concurrent_requests,
            ),
            credentials,
            territory: territory.trim().to_uppercase(),
        }
    }

    #[instrument(skip(self), fields(artist = artist, song = song, territory = %self.territory))]
    pub async fn try_search(&self, artist: &str, song: &str) -> Result<Option<CatalogRecord>> {
        let url = self.transport.url("v1.1/search")?;
        let query = format!("{artist} {song}");
        debug!(target: "kkbox", url = %url, q = %query, "searching KKBOX");

        let request = self.transport.client().get(url).query(&[
            ("q", query.as_str()),
            ("type", "track,album"),
            ("territory", self.territory.as_str()),
            ("limit", "10"),
        ]);
        let value = send_authorized(&self.transport, &self.credentials, request).await?;
        let payload: SearchResponse = serde_json::from_value(value)?;

        if let Some(track) = payload
            .tracks
            .map(|page| page.data)
            .unwrap_or_default()
            .into_iter()
            .find(|track| track.matches(artist, song))
        {
            return Ok(Some(track.into_record()));
        }

        Ok(payload
            .albums
            .map(|page| page.data)
            .unwrap_or_default()
            .into_iter()
            .find(|album| album.matches(artist, song))
            .map(Album::into_record))
    }
}

#[async_trait]
impl CatalogAdapter for KkboxClient {
    async fn search(&self, artist: &str, song: &str) -> Option<CatalogRecord> {
        absent_on_error(Catalog::Kkbox, "search", self.try_search(artist, song).await)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    tracks: Option<Page<Track>>,
    albums: Option<Page<Album>>,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
struct Page<T> {
    #[serde(default)]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Deserialize)]
struct Track {
    id: String,
    name: String,
    isrc: Option<String>,
    url: Option<String>,
    album: Album,
}

#[derive(Debug, Deserialize)]
struct Album {
    id: String,
    name: String,
    url: Option<String>,
    release_date: Option<String>,
    #[serde(default)]
    images: Vec<Image>,
    artist: Option<Artist>,
}

impl Album {
    fn artist_matches(&self, artist: &str) -> bool {
        self.artist
            .as_ref()
            .is_some_and(|credit| matches(&credit.name, artist))
    }

    fn matches(&self, artist: &str, song: &str) -> bool {
        matches(&self.name, song) && self.artist_matches(artist)
    }

    /// Largest image; KKBOX lists them smallest first.
    fn cover(&self) -> Option<String> {
        self.images.last().map(|image| image.url.clone())
    }

    fn into_record(self) -> CatalogRecord {
        CatalogRecord {
            album_art: self.cover(),
            album_title: Some(self.name.clone()),
            album_type: Some("album".to_string()),
            artists: self.artist.map(|artist| artist.name),
            id: Some(self.id),
            release_date: self.release_date.as_deref().and_then(normalize_release_date),
            title: Some(self.name),
            content_type: Some("album".to_string()),
            url: self.url,
            ..Default::default()
        }
    }
}

impl Track {
    fn matches(&self, artist: &str, song: &str) -> bool {
        matches(&self.name, song) && self.album.artist_matches(artist)
    }

    fn into_record(self) -> CatalogRecord {
        let album_type = if self.album.name == self.name {
            "single"
        } else {
            "album"
        };
        CatalogRecord {
            album_art: self.album.cover(),
            album_title: Some(self.album.name),
            album_type: Some(album_type.to_string()),
            artists: self.album.artist.map(|artist| artist.name),
            id: Some(self.id),
            isrc: self.isrc,
            release_date: self.album.release_date.as_deref().and_then(normalize_release_date),
            title: Some(self.name),
            content_type: Some("track".to_string()),
            url: self.url,
            ..Default::default()
        }
    }
}
