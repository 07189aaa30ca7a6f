// SPDX-License-Identifier: GPL-3.0-or-later
use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;
use utoipa::ToSchema;
use yutify_application::AppState;
use yutify_domain::{LyricsRecord, Resolution, UnifiedRecord};

// ============================================================================
// Response Types
// ============================================================================

/// Unified record. Keys are emitted in name order.
#[derive(Debug, Serialize, ToSchema)]
pub struct RecordResponse {
    pub album_art: Option<String>,
    pub album_art_source: Option<String>,
    pub album_title: Option<String>,
    pub album_type: Option<String>,
    pub artists: Option<String>,
    pub genre: Option<String>,
    /// Catalog identifier per consulted catalog.
    pub id: BTreeMap<String, Option<String>>,
    pub isrc: Option<String>,
    pub lyrics: Option<String>,
    pub release_date: Option<String>,
    pub tempo: Option<f64>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub upc: Option<String>,
    /// Catalog link per consulted catalog.
    pub url: BTreeMap<String, Option<String>>,
}

fn catalog_map<V>(map: BTreeMap<yutify_domain::Catalog, V>) -> BTreeMap<String, V> {
    map.into_iter()
        .map(|(catalog, value)| (catalog.as_str().to_string(), value))
        .collect()
}

impl From<UnifiedRecord> for RecordResponse {
    fn from(record: UnifiedRecord) -> Self {
        Self {
            album_art: record.album_art,
            album_art_source: record
                .album_art_source
                .map(|catalog| catalog.as_str().to_string()),
            album_title: record.album_title,
            album_type: record.album_type,
            artists: record.artists,
            genre: record.genre,
            id: catalog_map(record.id),
            isrc: record.isrc,
            lyrics: record.lyrics,
            release_date: record.release_date,
            tempo: record.tempo,
            title: record.title,
            content_type: record.content_type,
            upc: record.upc,
            url: catalog_map(record.url),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LyricsResponse {
    pub artist: String,
    pub title: String,
    pub lyrics: String,
    pub source: String,
}

impl From<LyricsRecord> for LyricsResponse {
    fn from(record: LyricsRecord) -> Self {
        Self {
            artist: record.artist,
            title: record.title,
            lyrics: record.lyrics,
            source: record.source,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

// ============================================================================
// Request parsing
// ============================================================================

/// Splits `artist:song` at the first colon. Both halves must be non-blank.
pub fn split_query(query: &str) -> Option<(&str, &str)> {
    let (artist, song) = query.split_once(':')?;
    if artist.trim().is_empty() || song.trim().is_empty() {
        return None;
    }
    Some((artist, song))
}

/// The platform filter is the first query-string key: `?spotify`, `?lyrics`.
pub fn filter_from_query(raw: Option<&str>) -> Option<&str> {
    raw?.split('&')
        .map(|pair| pair.split_once('=').map_or(pair, |(key, _)| key))
        .find(|key| !key.is_empty())
}

// ============================================================================
// Handlers
// ============================================================================

/// Resolve an `artist:song` query across catalogs
#[utoipa::path(
    get,
    path = "/api/search/{query}",
    params(
        ("query" = String, Path, description = "Artist and song separated by a colon"),
    ),
    responses(
        (status = 200, description = "Unified record, or lyrics when `?lyrics` is given", body = RecordResponse),
        (status = 400, description = "Malformed query or unsupported platform", body = ErrorResponse),
        (status = 404, description = "Nothing matched", body = ErrorResponse)
    ),
    tag = "search"
)]
pub async fn search(
    State(state): State<AppState>,
    Path(query): Path<String>,
    RawQuery(raw): RawQuery,
) -> Response {
    let filter = filter_from_query(raw.as_deref());
    debug!(target: "api", %query, filter = ?filter, "search request");

    let Some((artist, song)) = split_query(&query) else {
        return error(
            StatusCode::BAD_REQUEST,
            "Query must be in the form 'artist:song'",
        );
    };

    match state.resolver.resolve(artist, song, filter).await {
        Ok(Resolution::Found(record)) => {
            (StatusCode::OK, Json(RecordResponse::from(*record))).into_response()
        }
        Ok(Resolution::Lyrics(record)) => {
            (StatusCode::OK, Json(LyricsResponse::from(record))).into_response()
        }
        Ok(Resolution::NotFound(not_found)) => error(StatusCode::NOT_FOUND, not_found.message),
        Err(e) => error(StatusCode::BAD_REQUEST, e.to_string()),
    }
}
