// SPDX-License-Identifier: GPL-3.0-or-later
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use yutify_domain::{Catalog, CatalogRecord};

use crate::adapter::{absent_on_error, send_authorized, CatalogAdapter};
use crate::credentials::CredentialManager;
use crate::dates::normalize_release_date;
use crate::error::Result;
use crate::matcher::{any_matches, matches};
use crate::transport::Transport;

pub const DEFAULT_BASE_URL: &str = "https://api.spotify.com";
pub const DEFAULT_TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

/// Spotify Web API client. Leads the field merge.
pub struct SpotifyClient {
    transport: Transport,
    credentials: Arc<CredentialManager>,
}

impl SpotifyClient {
    pub fn new_with_client(
        client: Client,
        base_url: Option<String>,
        credentials: Arc<CredentialManager>,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            transport: Transport::new(
                Catalog::Spotify,
                client,
                base_url,
                DEFAULT_BASE_URL,
                max_concurrent_requests,
            ),
            credentials,
        }
    }

    /// Searches tracks and albums in one request; tracks are scanned first.
    #[instrument(skip(self), fields(artist = artist, song = song))]
    pub async fn try_search(&self, artist: &str, song: &str) -> Result<Option<CatalogRecord>> {
        let query = format!("track:{song} artist:{artist}");
        let payload = self.search_request(&query, "track,album").await?;

        if let Some(track) = payload
            .tracks
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .find(|track| track.matches(artist, song))
        {
            return Ok(Some(track.into_record()));
        }

        match payload
            .albums
            .map(|page| page.items)
            .unwrap_or_default()
            .into_iter()
            .find(|album| album.matches(artist, song))
        {
            Some(album) => Ok(Some(self.enriched_album(album).await)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), fields(artist = artist, song = song))]
    pub async fn try_search_advanced(
        &self,
        artist: &str,
        song: &str,
        isrc: Option<&str>,
        upc: Option<&str>,
    ) -> Result<Option<CatalogRecord>> {
        if let Some(isrc) = isrc {
            match self.search_request(&format!("isrc:{isrc}"), "track").await {
                Ok(payload) => {
                    if let Some(track) = payload
                        .tracks
                        .map(|page| page.items)
                        .unwrap_or_default()
                        .into_iter()
                        .find(|track| track.matches(artist, song))
                    {
                        return Ok(Some(track.into_record()));
                    }
                    debug!(target: "spotify", isrc, "ISRC search did not match the query");
                }
                Err(error) => debug!(target: "spotify", isrc, error = %error, "ISRC search failed"),
            }
        }

        if let Some(upc) = upc {
            match self.search_request(&format!("upc:{upc}"), "album").await {
                Ok(payload) => {
                    if let Some(album) = payload
                        .albums
                        .map(|page| page.items)
                        .unwrap_or_default()
                        .into_iter()
                        .find(|album| album.matches(artist, song))
                    {
                        return Ok(Some(self.enriched_album(album).await));
                    }
                    debug!(target: "spotify", upc, "UPC search did not match the query");
                }
                Err(error) => debug!(target: "spotify", upc, error = %error, "UPC search failed"),
            }
        }

        self.try_search(artist, song).await
    }

    async fn search_request(&self, query: &str, kinds: &str) -> Result<SearchResponse> {
        let url = self.transport.url("v1/search")?;
        debug!(target: "spotify", url = %url, q = %query, kinds, "searching Spotify");

        let request = self
            .transport
            .client()
            .get(url)
            .query(&[("q", query), ("type", kinds), ("limit", "10")]);
        let value = send_authorized(&self.transport, &self.credentials, request).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Adds the UPC from the album endpoint. A failed lookup keeps the search fields.
    async fn enriched_album(&self, album: Album) -> CatalogRecord {
        let id = album.id.clone();
        let mut record = album.into_record();

        match self.album_detail(&id).await {
            Ok(detail) => {
                record.upc = detail.external_ids.and_then(|ids| ids.upc);
                record.genre = detail.genres.into_iter().next();
            }
            Err(error) => warn!(target: "spotify", id = %id, error = %error, "album lookup failed"),
        }
        record
    }

    async fn album_detail(&self, id: &str) -> Result<AlbumDetail> {
        let url = self.transport.url(&format!("v1/albums/{id}"))?;
        debug!(target: "spotify", url = %url, "fetching Spotify album");
        let request = self.transport.client().get(url);
        let value = send_authorized(&self.transport, &self.credentials, request).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl CatalogAdapter for SpotifyClient {
    async fn search(&self, artist: &str, song: &str) -> Option<CatalogRecord> {
        absent_on_error(Catalog::Spotify, "search", self.try_search(artist, song).await)
    }

    async fn search_advanced(
        &self,
        artist: &str,
        song: &str,
        isrc: Option<&str>,
        upc: Option<&str>,
    ) -> Option<CatalogRecord> {
        absent_on_error(
            Catalog::Spotify,
            "search_advanced",
            self.try_search_advanced(artist, song, isrc, upc).await,
        )
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
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Artist {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ExternalIds {
    isrc: Option<String>,
    upc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Image {
    url: String,
}

#[derive(Debug, Deserialize)]
struct Track {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<Artist>,
    album: Album,
    external_urls: Option<ExternalUrls>,
    external_ids: Option<ExternalIds>,
}

#[derive(Debug, Deserialize)]
struct Album {
    id: String,
    name: String,
    album_type: Option<String>,
    #[serde(default)]
    artists: Vec<Artist>,
    #[serde(default)]
    images: Vec<Image>,
    release_date: Option<String>,
    external_urls: Option<ExternalUrls>,
}

#[derive(Debug, Deserialize)]
struct AlbumDetail {
    external_ids: Option<ExternalIds>,
    #[serde(default)]
    genres: Vec<String>,
}

fn join_artists(artists: &[Artist]) -> Option<String> {
    if artists.is_empty() {
        return None;
    }
    Some(
        artists
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

impl Track {
    fn matches(&self, artist: &str, song: &str) -> bool {
        matches(&self.name, song)
            && any_matches(self.artists.iter().map(|credit| credit.name.as_str()), artist)
    }

    fn into_record(self) -> CatalogRecord {
        let album_type = if self.album.name == self.name {
            Some("single".to_string())
        } else {
            self.album.album_type.clone()
        };
        CatalogRecord {
            album_art: self.album.images.first().map(|image| image.url.clone()),
            album_title: Some(self.album.name),
            album_type,
            artists: join_artists(&self.artists),
            id: Some(self.id),
            isrc: self.external_ids.and_then(|ids| ids.isrc),
            release_date: self.album.release_date.as_deref().and_then(normalize_release_date),
            title: Some(self.name),
            content_type: Some("track".to_string()),
            url: self.external_urls.and_then(|urls| urls.spotify),
            ..Default::default()
        }
    }
}

impl Album {
    fn matches(&self, artist: &str, song: &str) -> bool {
        matches(&self.name, song)
            && any_matches(self.artists.iter().map(|credit| credit.name.as_str()), artist)
    }

    fn into_record(self) -> CatalogRecord {
        CatalogRecord {
            album_art: self.images.first().map(|image| image.url.clone()),
            album_title: Some(self.name.clone()),
            album_type: self.album_type,
            artists: join_artists(&self.artists),
            id: Some(self.id),
            release_date: self.release_date.as_deref().and_then(normalize_release_date),
            title: Some(self.name),
            content_type: Some("album".to_string()),
            url: self.external_urls.and_then(|urls| urls.spotify),
            ..Default::default()
        }
    }
}
