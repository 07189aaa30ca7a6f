// SPDX-License-Identifier: GPL-3.0-or-later
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, instrument};
use yutify_domain::{Catalog, CatalogRecord};

use crate::adapter::{absent_on_error, CatalogAdapter, EntityFallback};
use crate::dates::normalize_release_date;
use crate::error::Result;
use crate::matcher::matches;
use crate::transport::Transport;

pub const DEFAULT_BASE_URL: &str = "https://itunes.apple.com";

/// iTunes Search API client bound to one storefront.
pub struct ItunesClient {
    transport: Transport,
    country: String,
}

impl ItunesClient {
    pub fn new_with_client(
        client: Client,
        base_url: Option<String>,
        country: &str,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            transport: Transport::new(
                Catalog::Itunes,
                client,
                base_url,
                DEFAULT_BASE_URL,
                max_concurrent_requests,
            ),
            country: country.trim().to_uppercase(),
        }
    }

    #[instrument(skip(self), fields(artist = artist, song = song, country = %self.country))]
    pub async fn try_search(&self, artist: &str, song: &str) -> Result<Option<CatalogRecord>> {
        let mut fallback = EntityFallback::new(Catalog::Itunes);
        for entity in ["song", "album"] {
            let outcome = self.search_entity(entity, artist, song).await;
            if let Some(record) = fallback.attempt(entity, outcome)? {
                return Ok(Some(record));
            }
        }
        fallback.finish()
    }

    async fn search_entity(
        &self,
        entity: &'static str,
        artist: &str,
        song: &str,
    ) -> Result<Option<CatalogRecord>> {
        let url = self.transport.url("search")?;
        let term = format!("{artist} - {song}");
        debug!(target: "itunes", url = %url, term = %term, entity, "searching iTunes");

        let mut query = vec![
            ("term", term.as_str()),
            ("media", "music"),
            ("entity", entity),
            ("limit", "10"),
        ];
        if !self.country.is_empty() {
            query.push(("country", self.country.as_str()));
        }

        let request = self.transport.client().get(url).query(&query);
        let value = self.transport.send_json(request).await?;
        let payload: SearchResponse = serde_json::from_value(value)?;

        Ok(payload
            .results
            .into_iter()
            .find(|item| item.matches(artist, song))
            .map(SearchItem::into_record))
    }
}

#[async_trait]
impl CatalogAdapter for ItunesClient {
    async fn search(&self, artist: &str, song: &str) -> Option<CatalogRecord> {
        absent_on_error(Catalog::Itunes, "search", self.try_search(artist, song).await)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchItem {
    wrapper_type: Option<String>,
    kind: Option<String>,
    collection_type: Option<String>,
    track_id: Option<i64>,
    collection_id: Option<i64>,
    track_name: Option<String>,
    collection_name: Option<String>,
    artist_name: Option<String>,
    track_view_url: Option<String>,
    collection_view_url: Option<String>,
    artwork_url100: Option<String>,
    release_date: Option<String>,
    primary_genre_name: Option<String>,
}

impl SearchItem {
    fn title(&self) -> Option<&str> {
        self.track_name.as_deref().or(self.collection_name.as_deref())
    }

    fn matches(&self, artist: &str, song: &str) -> bool {
        match (self.title(), self.artist_name.as_deref()) {
            (Some(title), Some(credit)) => matches(title, song) && matches(credit, artist),
            _ => false,
        }
    }

    fn into_record(self) -> CatalogRecord {
        let (album_title, album_type) = self.album_title_and_type();
        let is_track = self.track_name.is_some();
        let title = self.track_name.or_else(|| album_title.clone());

        CatalogRecord {
            album_art: self.artwork_url100,
            album_title,
            album_type,
            artists: self.artist_name,
            genre: self.primary_genre_name,
            id: self.track_id.or(self.collection_id).map(|id| id.to_string()),
            release_date: self.release_date.as_deref().and_then(normalize_release_date),
            title,
            content_type: Some(if is_track { "track" } else { "album" }.to_string()),
            url: self.track_view_url.or(self.collection_view_url),
            ..Default::default()
        }
    }

    /// `"Title - Single"` and `"Title - EP"` carry the album type in the collection name.
    fn album_title_and_type(&self) -> (Option<String>, Option<String>) {
        let Some(collection) = self.collection_name.as_deref() else {
            return (None, self.kind.clone());
        };

        if let Some((title, suffix)) = collection.rsplit_once(" - ") {
            let suffix = suffix.trim().to_lowercase();
            if suffix == "single" || suffix == "ep" {
                return (Some(title.trim().to_string()), Some(suffix));
            }
        }

        let album_type = if self.track_name.as_deref() == Some(collection) {
            Some("single".to_string())
        } else {
            self.kind
                .as_deref()
                .or(self.collection_type.as_deref())
                .or(self.wrapper_type.as_deref())
                .map(str::to_lowercase)
        };
        (Some(collection.to_string()), album_type)
    }
}
