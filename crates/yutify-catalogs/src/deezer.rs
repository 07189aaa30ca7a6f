// SPDX-License-Identifier: GPL-3.0-or-later
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument, warn};
use yutify_domain::{Catalog, CatalogRecord};

use crate::adapter::{absent_on_error, CatalogAdapter, EntityFallback};
use crate::dates::normalize_release_date;
use crate::error::Result;
use crate::matcher::matches;
use crate::transport::Transport;

pub const DEFAULT_BASE_URL: &str = "https://api.deezer.com";

/// Public Deezer API client. Supplies ISRC/UPC identifiers for the Spotify seed.
pub struct DeezerClient {
    transport: Transport,
}

impl DeezerClient {
    pub fn new_with_client(
        client: Client,
        base_url: Option<String>,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            transport: Transport::new(
                Catalog::Deezer,
                client,
                base_url,
                DEFAULT_BASE_URL,
                max_concurrent_requests,
            ),
        }
    }

    /// Searches tracks, then albums, returning the first loosely matching candidate.
    #[instrument(skip(self), fields(artist = artist, song = song))]
    pub async fn try_search(&self, artist: &str, song: &str) -> Result<Option<CatalogRecord>> {
        let mut fallback = EntityFallback::new(Catalog::Deezer);
        for kind in ["track", "album"] {
            let outcome = self.search_kind(kind, artist, song).await;
            if let Some(record) = fallback.attempt(kind, outcome)? {
                return Ok(Some(record));
            }
        }
        fallback.finish()
    }

    /// Looks the item up by ISRC (track) or UPC (album), falling back to [`try_search`](Self::try_search).
    #[instrument(skip(self), fields(artist = artist, song = song))]
    pub async fn try_search_advanced(
        &self,
        artist: &str,
        song: &str,
        isrc: Option<&str>,
        upc: Option<&str>,
    ) -> Result<Option<CatalogRecord>> {
        if let Some(isrc) = isrc {
            match self.track_detail(&format!("isrc:{isrc}")).await {
                Ok(track) if track.matches(artist, song) => return Ok(Some(track.into_record())),
                Ok(_) => debug!(target: "deezer", isrc, "ISRC lookup did not match the query"),
                Err(error) => debug!(target: "deezer", isrc, error = %error, "ISRC lookup failed"),
            }
        }

        if let Some(upc) = upc {
            match self.album_detail(&format!("upc:{upc}")).await {
                Ok(album) if album.matches(artist, song) => return Ok(Some(album.into_record())),
                Ok(_) => debug!(target: "deezer", upc, "UPC lookup did not match the query"),
                Err(error) => debug!(target: "deezer", upc, error = %error, "UPC lookup failed"),
            }
        }

        self.try_search(artist, song).await
    }

    async fn search_kind(
        &self,
        kind: &'static str,
        artist: &str,
        song: &str,
    ) -> Result<Option<CatalogRecord>> {
        let url = self.transport.url(&format!("search/{kind}"))?;
        let query = format!("artist:\"{artist}\" {kind}:\"{song}\"");
        debug!(target: "deezer", url = %url, q = %query, "searching Deezer");

        let request = self
            .transport
            .client()
            .get(url)
            .query(&[("q", query.as_str()), ("limit", "10")]);
        let value = self.transport.send_json(request).await?;
        let payload: SearchResponse = serde_json::from_value(value)?;

        let Some(candidate) = payload
            .data
            .into_iter()
            .find(|item| matches(&item.title, song) && matches(&item.artist.name, artist))
        else {
            return Ok(None);
        };

        let record = match kind {
            "album" => self.album_record(candidate).await,
            _ => self.track_record(candidate).await,
        };
        Ok(Some(record))
    }

    async fn track_record(&self, item: SearchItem) -> CatalogRecord {
        let album = item.album.unwrap_or_default();
        let album_type = if album.title.as_deref() == Some(item.title.as_str()) {
            Some("single".to_string())
        } else {
            album.kind.or(item.record_type)
        };

        let mut record = CatalogRecord {
            album_art: album.cover_xl,
            album_title: album.title,
            album_type,
            artists: Some(item.artist.name),
            id: Some(item.id.to_string()),
            title: Some(item.title),
            content_type: Some("track".to_string()),
            url: item.link,
            ..Default::default()
        };

        match self.track_detail(&item.id.to_string()).await {
            Ok(detail) => {
                record.isrc = detail.isrc;
                record.release_date = detail.release_date.as_deref().and_then(normalize_release_date);
                record.tempo = detail.bpm.filter(|bpm| *bpm > 0.0);
            }
            Err(error) => {
                warn!(target: "deezer", id = item.id, error = %error, "track detail lookup failed");
            }
        }
        record
    }

    async fn album_record(&self, item: SearchItem) -> CatalogRecord {
        let mut record = CatalogRecord {
            album_art: item.cover_xl,
            album_title: Some(item.title.clone()),
            album_type: item.record_type,
            artists: Some(item.artist.name),
            id: Some(item.id.to_string()),
            title: Some(item.title),
            content_type: Some("album".to_string()),
            url: item.link,
            ..Default::default()
        };

        match self.album_detail(&item.id.to_string()).await {
            Ok(detail) => {
                record.genre = detail.first_genre();
                record.release_date = detail.release_date.as_deref().and_then(normalize_release_date);
                record.upc = detail.upc;
            }
            Err(error) => {
                warn!(target: "deezer", id = item.id, error = %error, "album detail lookup failed");
            }
        }
        record
    }

    async fn track_detail(&self, id: &str) -> Result<TrackDetail> {
        let url = self.transport.url(&format!("track/{id}"))?;
        debug!(target: "deezer", url = %url, "fetching Deezer track");
        let value = self.transport.send_json(self.transport.client().get(url)).await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn album_detail(&self, id: &str) -> Result<AlbumDetail> {
        let url = self.transport.url(&format!("album/{id}"))?;
        debug!(target: "deezer", url = %url, "fetching Deezer album");
        let value = self.transport.send_json(self.transport.client().get(url)).await?;
        Ok(serde_json::from_value(value)?)
    }
}

#[async_trait]
impl CatalogAdapter for DeezerClient {
    async fn search(&self, artist: &str, song: &str) -> Option<CatalogRecord> {
        absent_on_error(Catalog::Deezer, "search", self.try_search(artist, song).await)
    }

    async fn search_advanced(
        &self,
        artist: &str,
        song: &str,
        isrc: Option<&str>,
        upc: Option<&str>,
    ) -> Option<CatalogRecord> {
        absent_on_error(
            Catalog::Deezer,
            "search_advanced",
            self.try_search_advanced(artist, song, isrc, upc).await,
        )
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: i64,
    title: String,
    link: Option<String>,
    artist: ArtistRef,
    album: Option<AlbumRef>,
    cover_xl: Option<String>,
    record_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ArtistRef {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct AlbumRef {
    title: Option<String>,
    cover_xl: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TrackDetail {
    id: i64,
    title: String,
    link: Option<String>,
    isrc: Option<String>,
    release_date: Option<String>,
    bpm: Option<f64>,
    artist: Option<ArtistRef>,
    album: Option<AlbumRef>,
}

impl TrackDetail {
    fn matches(&self, artist: &str, song: &str) -> bool {
        matches(&self.title, song)
            && self
                .artist
                .as_ref()
                .is_some_and(|credit| matches(&credit.name, artist))
    }

    fn into_record(self) -> CatalogRecord {
        let album = self.album.unwrap_or_default();
        let album_type = if album.title.as_deref() == Some(self.title.as_str()) {
            Some("single".to_string())
        } else {
            album.kind
        };
        CatalogRecord {
            album_art: album.cover_xl,
            album_title: album.title,
            album_type,
            artists: self.artist.map(|artist| artist.name),
            id: Some(self.id.to_string()),
            isrc: self.isrc,
            release_date: self.release_date.as_deref().and_then(normalize_release_date),
            tempo: self.bpm.filter(|bpm| *bpm > 0.0),
            title: Some(self.title),
            content_type: Some("track".to_string()),
            url: self.link,
            ..Default::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct AlbumDetail {
    id: i64,
    title: String,
    link: Option<String>,
    upc: Option<String>,
    release_date: Option<String>,
    record_type: Option<String>,
    cover_xl: Option<String>,
    artist: Option<ArtistRef>,
    genres: Option<GenreList>,
}

#[derive(Debug, Deserialize)]
struct GenreList {
    #[serde(default)]
    data: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    name: String,
}

impl AlbumDetail {
    fn first_genre(&self) -> Option<String> {
        self.genres
            .as_ref()
            .and_then(|genres| genres.data.first())
            .map(|genre| genre.name.clone())
    }

    fn matches(&self, artist: &str, song: &str) -> bool {
        matches(&self.title, song)
            && self
                .artist
                .as_ref()
                .is_some_and(|credit| matches(&credit.name, artist))
    }

    fn into_record(self) -> CatalogRecord {
        let genre = self.first_genre();
        CatalogRecord {
            album_art: self.cover_xl,
            album_title: Some(self.title.clone()),
            album_type: self.record_type,
            artists: self.artist.map(|artist| artist.name),
            genre,
            id: Some(self.id.to_string()),
            release_date: self.release_date.as_deref().and_then(normalize_release_date),
            title: Some(self.title),
            content_type: Some("album".to_string()),
            upc: self.upc,
            url: self.link,
            ..Default::default()
        }
    }
}
