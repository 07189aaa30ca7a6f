// SPDX-License-Identifier: GPL-3.0-or-later

//! YouTube Music through the `youtubei/v1` endpoints used by the web client.
//!
//! Responses are deeply nested renderer trees, so they are walked with JSON
//! pointers instead of typed structs. Only the fields needed for a catalog record
//! are read; unknown renderers are skipped.

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, instrument, warn};
use yutify_domain::{Catalog, CatalogRecord, LyricsRecord};

use crate::adapter::{absent_on_error, CatalogAdapter, EntityFallback};
use crate::error::Result;
use crate::lyrics::{LyricsError, LyricsSource};
use crate::matcher::{any_matches, matches};
use crate::transport::Transport;

pub const DEFAULT_BASE_URL: &str = "https://music.youtube.com";
const CLIENT_NAME: &str = "WEB_REMIX";
const CLIENT_VERSION: &str = "1.20240101.01.00";
const WEB_BASE_URL: &str = "https://music.youtube.com";

/// Shelves that never hold a song or an album.
const SKIPPED_SHELVES: [&str; 7] = [
    "artists",
    "community playlists",
    "featured playlists",
    "podcasts",
    "profiles",
    "uploads",
    "episodes",
];

const PAGE_TYPE_ALBUM: &str = "MUSIC_PAGE_TYPE_ALBUM";
const PAGE_TYPE_ARTIST: &str = "MUSIC_PAGE_TYPE_ARTIST";
const PAGE_TYPE_CHANNEL: &str = "MUSIC_PAGE_TYPE_USER_CHANNEL";
const PAGE_TYPE_POINTER: &str = "/navigationEndpoint/browseEndpoint/browseEndpointContextSupportedConfigs/browseEndpointContextMusicConfig/pageType";

pub struct YtMusicClient {
    transport: Transport,
}

impl YtMusicClient {
    pub fn new_with_client(
        client: Client,
        base_url: Option<String>,
        max_concurrent_requests: usize,
    ) -> Self {
        Self {
            transport: Transport::new(
                Catalog::YtMusic,
                client,
                base_url,
                DEFAULT_BASE_URL,
                max_concurrent_requests,
            ),
        }
    }

    /// Tries progressively looser query patterns until one yields a matching row.
    #[instrument(skip(self), fields(artist = artist, song = song))]
    pub async fn try_search(&self, artist: &str, song: &str) -> Result<Option<CatalogRecord>> {
        let patterns = [
            format!("{artist} - {song}"),
            format!("{artist} {song}"),
            format!("{song} {artist}"),
        ];

        let mut fallback = EntityFallback::new(Catalog::YtMusic);
        for pattern in &patterns {
            let outcome = self.search_pattern(pattern, artist, song).await;
            if let Some(mut record) = fallback.attempt("query pattern", outcome)? {
                if record.content_type.as_deref() == Some("track") {
                    if let Some(video_id) = record.id.clone() {
                        record.lyrics = self.lyrics_or_none(&video_id).await;
                    }
                }
                return Ok(Some(record));
            }
        }
        fallback.finish()
    }

    /// Lyrics text for a video, or `None` when the track has no lyrics tab.
    #[instrument(skip(self))]
    pub async fn try_lyrics(&self, video_id: &str) -> Result<Option<String>> {
        let next = self
            .post("youtubei/v1/next", json!({ "videoId": video_id }))
            .await?;
        let Some(browse_id) = lyrics_browse_id(&next) else {
            debug!(target: "ytmusic", video_id, "no lyrics tab for video");
            return Ok(None);
        };

        let browse = self
            .post("youtubei/v1/browse", json!({ "browseId": browse_id }))
            .await?;
        Ok(lyrics_text(&browse))
    }

    async fn lyrics_or_none(&self, video_id: &str) -> Option<String> {
        match self.try_lyrics(video_id).await {
            Ok(lyrics) => lyrics,
            Err(error) => {
                warn!(target: "ytmusic", video_id, error = %error, "lyrics lookup failed");
                None
            }
        }
    }

    async fn search_pattern(
        &self,
        pattern: &str,
        artist: &str,
        song: &str,
    ) -> Result<Option<CatalogRecord>> {
        debug!(target: "ytmusic", query = %pattern, "searching YouTube Music");
        let response = self
            .post("youtubei/v1/search", json!({ "query": pattern }))
            .await?;

        Ok(search_rows(&response)
            .into_iter()
            .find(|row| row.matches(artist, song))
            .map(SearchRow::into_record))
    }

    async fn post(&self, path: &str, mut body: Value) -> Result<Value> {
        let url = self.transport.url(path)?;
        body["context"] = json!({
            "client": {
                "clientName": CLIENT_NAME,
                "clientVersion": CLIENT_VERSION,
                "hl": "en"
            }
        });

        debug!(target: "ytmusic", url = %url, "posting innertube request");
        let request = self
            .transport
            .client()
            .post(url)
            .query(&[("prettyPrint", "false")])
            .header("Origin", self.transport.base_url())
            .json(&body);
        self.transport.send_json(request).await
    }
}

#[async_trait]
impl CatalogAdapter for YtMusicClient {
    async fn search(&self, artist: &str, song: &str) -> Option<CatalogRecord> {
        absent_on_error(Catalog::YtMusic, "search", self.try_search(artist, song).await)
    }
}

#[async_trait]
impl LyricsSource for YtMusicClient {
    fn name(&self) -> &'static str {
        "ytmusic"
    }

    async fn fetch_lyrics(
        &self,
        artist: &str,
        song: &str,
    ) -> std::result::Result<Option<LyricsRecord>, LyricsError> {
        let record = self.try_search(artist, song).await?;

        Ok(record.and_then(|record| {
            let lyrics = record.lyrics.filter(|text| !text.trim().is_empty())?;
            Some(LyricsRecord {
                artist: record.artists.unwrap_or_else(|| artist.to_string()),
                title: record.title.unwrap_or_else(|| song.to_string()),
                lyrics,
                source: "ytmusic".to_string(),
            })
        }))
    }
}

#[derive(Debug, Clone, PartialEq)]
struct SearchRow {
    title: String,
    artists: Vec<String>,
    album: Option<String>,
    /// Album rows carry their type ("Album", "Single", "EP") in the subtitle.
    subtitle_kind: Option<String>,
    video_id: Option<String>,
    browse_id: Option<String>,
    thumbnail: Option<String>,
}

impl SearchRow {
    fn is_album(&self) -> bool {
        self.video_id.is_none() && self.browse_id.is_some()
    }

    fn matches(&self, artist: &str, song: &str) -> bool {
        (self.video_id.is_some() || self.is_album())
            && matches(&self.title, song)
            && any_matches(self.artists.iter().map(String::as_str), artist)
    }

    fn into_record(self) -> CatalogRecord {
        let artists = (!self.artists.is_empty()).then(|| self.artists.join(", "));

        if let Some(video_id) = self.video_id {
            let album_type = self.album.as_ref().map(|album| {
                if *album == self.title {
                    "single".to_string()
                } else {
                    "album".to_string()
                }
            });
            return CatalogRecord {
                album_art: self.thumbnail,
                album_title: self.album,
                album_type,
                artists,
                url: Some(format!("{WEB_BASE_URL}/watch?v={video_id}")),
                id: Some(video_id),
                title: Some(self.title),
                content_type: Some("track".to_string()),
                ..Default::default()
            };
        }

        let browse_id = self.browse_id.unwrap_or_default();
        CatalogRecord {
            album_art: self.thumbnail,
            album_title: Some(self.title.clone()),
            album_type: self.subtitle_kind.map(|kind| kind.to_lowercase()),
            artists,
            url: Some(format!("{WEB_BASE_URL}/browse/{browse_id}")),
            id: Some(browse_id),
            title: Some(self.title),
            content_type: Some("album".to_string()),
            ..Default::default()
        }
    }
}

fn text_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value.pointer(pointer).and_then(Value::as_str)
}

fn flex_runs(item: &Value, column: usize) -> &[Value] {
    item.pointer(&format!(
        "/flexColumns/{column}/musicResponsiveListItemFlexColumnRenderer/text/runs"
    ))
    .and_then(Value::as_array)
    .map(Vec::as_slice)
    .unwrap_or(&[])
}

fn parse_row(item: &Value) -> Option<SearchRow> {
    let title = text_at(item, "/flexColumns/0/musicResponsiveListItemFlexColumnRenderer/text/runs/0/text")?
        .to_string();

    let details = flex_runs(item, 1);
    let mut artists = Vec::new();
    let mut album = None;
    for run in details {
        match text_at(run, PAGE_TYPE_POINTER) {
            Some(PAGE_TYPE_ARTIST) | Some(PAGE_TYPE_CHANNEL) => {
                if let Some(name) = text_at(run, "/text") {
                    artists.push(name.to_string());
                }
            }
            Some(PAGE_TYPE_ALBUM) => album = text_at(run, "/text").map(str::to_string),
            _ => {}
        }
    }

    let video_id = text_at(item, "/playlistItemData/videoId")
        .or_else(|| {
            text_at(
                item,
                "/overlay/musicItemThumbnailOverlayRenderer/content/musicPlayButtonRenderer/playNavigationEndpoint/watchEndpoint/videoId",
            )
        })
        .map(str::to_string);

    let browse_id = match text_at(item, PAGE_TYPE_POINTER) {
        Some(PAGE_TYPE_ALBUM) => {
            text_at(item, "/navigationEndpoint/browseEndpoint/browseId").map(str::to_string)
        }
        _ => None,
    };

    let thumbnail = item
        .pointer("/thumbnail/musicThumbnailRenderer/thumbnail/thumbnails")
        .and_then(Value::as_array)
        .and_then(|thumbnails| thumbnails.last())
        .and_then(|thumbnail| text_at(thumbnail, "/url"))
        .map(str::to_string);

    Some(SearchRow {
        title,
        artists,
        album,
        subtitle_kind: details
            .first()
            .and_then(|run| text_at(run, "/text"))
            .map(str::to_string),
        video_id,
        browse_id,
        thumbnail,
    })
}

/// Flattens every song, video and album row of a search response in display order.
fn search_rows(response: &Value) -> Vec<SearchRow> {
    let sections = response
        .pointer("/contents/tabbedSearchResultsRenderer/tabs/0/tabRenderer/content/sectionListRenderer/contents")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);

    let mut rows = Vec::new();
    for section in sections {
        let Some(shelf) = section.get("musicShelfRenderer") else {
            continue;
        };
        let category = text_at(shelf, "/title/runs/0/text")
            .unwrap_or_default()
            .to_lowercase();
        if SKIPPED_SHELVES.contains(&category.as_str()) {
            continue;
        }

        let items = shelf
            .get("contents")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        rows.extend(
            items
                .iter()
                .filter_map(|item| item.get("musicResponsiveListItemRenderer"))
                .filter_map(parse_row),
        );
    }
    rows
}

fn lyrics_browse_id(next: &Value) -> Option<String> {
    next.pointer("/contents/singleColumnMusicWatchNextResultsRenderer/tabbedRenderer/watchNextTabbedResultsRenderer/tabs")
        .and_then(Value::as_array)?
        .iter()
        .filter_map(|tab| text_at(tab, "/tabRenderer/endpoint/browseEndpoint/browseId"))
        .find(|browse_id| browse_id.starts_with("MPLY"))
        .map(str::to_string)
}

fn lyrics_text(browse: &Value) -> Option<String> {
    browse
        .pointer("/contents/sectionListRenderer/contents")
        .and_then(Value::as_array)?
        .iter()
        .find_map(|section| {
            text_at(
                section,
                "/musicDescriptionShelfRenderer/description/runs/0/text",
            )
        })
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{json, Value};

    fn run(text: &str, page_type: Option<&str>, browse_id: &str) -> Value {
        match page_type {
            Some(page_type) => json!({
                "text": text,
                "navigationEndpoint": {"browseEndpoint": {
                    "browseId": browse_id,
                    "browseEndpointContextSupportedConfigs": {
                        "browseEndpointContextMusicConfig": {"pageType": page_type}
                    }
                }}
            }),
            None => json!({ "text": text }),
        }
    }

    pub fn song_row(title: &str, artist: &str, album: &str, video_id: &str) -> Value {
        json!({"musicResponsiveListItemRenderer": {
            "thumbnail": {"musicThumbnailRenderer": {"thumbnail": {"thumbnails": [
                {"url": "https://lh3.googleusercontent.com/small"},
                {"url": "https://lh3.googleusercontent.com/large"}
            ]}}},
            "flexColumns": [
                {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": [{"text": title}]}}},
                {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": [
                    run("Song", None, ""),
                    run(" • ", None, ""),
                    run(artist, Some("MUSIC_PAGE_TYPE_ARTIST"), "UC1"),
                    run(" • ", None, ""),
                    run(album, Some("MUSIC_PAGE_TYPE_ALBUM"), "MPREb_1"),
                ]}}}
            ],
            "playlistItemData": {"videoId": video_id}
        }})
    }

    pub fn album_row(title: &str, artist: &str, kind: &str, browse_id: &str) -> Value {
        json!({"musicResponsiveListItemRenderer": {
            "flexColumns": [
                {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": [{"text": title}]}}},
                {"musicResponsiveListItemFlexColumnRenderer": {"text": {"runs": [
                    run(kind, None, ""),
                    run(" • ", None, ""),
                    run(artist, Some("MUSIC_PAGE_TYPE_ARTIST"), "UC1"),
                ]}}}
            ],
            "navigationEndpoint": {"browseEndpoint": {
                "browseId": browse_id,
                "browseEndpointContextSupportedConfigs": {
                    "browseEndpointContextMusicConfig": {"pageType": "MUSIC_PAGE_TYPE_ALBUM"}
                }
            }}
        }})
    }

    pub fn search_response(shelves: Vec<(&str, Vec<Value>)>) -> Value {
        let contents: Vec<Value> = shelves
            .into_iter()
            .map(|(title, rows)| {
                json!({"musicShelfRenderer": {
                    "title": {"runs": [{"text": title}]},
                    "contents": rows
                }})
            })
            .collect();
        json!({"contents": {"tabbedSearchResultsRenderer": {"tabs": [
            {"tabRenderer": {"content": {"sectionListRenderer": {"contents": contents}}}}
        ]}}})
    }

    pub fn next_response(lyrics_browse_id: &str) -> Value {
        json!({"contents": {"singleColumnMusicWatchNextResultsRenderer": {"tabbedRenderer": {
            "watchNextTabbedResultsRenderer": {"tabs": [
                {"tabRenderer": {"title": "Up next"}},
                {"tabRenderer": {"title": "Lyrics", "endpoint": {"browseEndpoint": {"browseId": lyrics_browse_id}}}},
                {"tabRenderer": {"title": "Related", "endpoint": {"browseEndpoint": {"browseId": "MPTRt_1"}}}}
            ]}
        }}}})
    }

    pub fn browse_response(lyrics: &str) -> Value {
        json!({"contents": {"sectionListRenderer": {"contents": [
            {"musicDescriptionShelfRenderer": {"description": {"runs": [{"text": lyrics}]}}}
        ]}}})
    }
}
