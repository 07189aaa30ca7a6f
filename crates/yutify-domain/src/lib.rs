// SPDX-License-Identifier: GPL-3.0-or-later
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Catalogs & Platform Filter
// ============================================================================

/// External music catalogs the resolver knows how to query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Catalog {
    Deezer,
    Itunes,
    Kkbox,
    Spotify,
    #[serde(rename = "ytmusic")]
    YtMusic,
}

impl Catalog {
    pub const ALL: [Catalog; 5] = [
        Catalog::Deezer,
        Catalog::Itunes,
        Catalog::Kkbox,
        Catalog::Spotify,
        Catalog::YtMusic,
    ];

    /// Stable lowercase key used in link maps, cache keys and credential rows.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deezer => "deezer",
            Self::Itunes => "itunes",
            Self::Kkbox => "kkbox",
            Self::Spotify => "spotify",
            Self::YtMusic => "ytmusic",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Deezer => "Deezer",
            Self::Itunes => "iTunes",
            Self::Kkbox => "KKBOX",
            Self::Spotify => "Spotify",
            Self::YtMusic => "YouTube Music",
        }
    }
}

impl std::fmt::Display for Catalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Catalog {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "deezer" => Ok(Self::Deezer),
            "itunes" | "apple-music" => Ok(Self::Itunes),
            "kkbox" => Ok(Self::Kkbox),
            "spotify" => Ok(Self::Spotify),
            "ytmusic" => Ok(Self::YtMusic),
            _ => Err(DomainError::UnsupportedPlatform(s.to_string())),
        }
    }
}

/// Restricts a resolution to the default chain, one catalog, or a lyrics-only lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PlatformFilter {
    #[default]
    All,
    Catalog(Catalog),
    Lyrics,
}

impl PlatformFilter {
    /// Parses the optional request parameter. Absent, empty and `all` select the default chain.
    pub fn parse(value: Option<&str>) -> Result<Self, DomainError> {
        match value.map(|v| v.trim().to_lowercase()) {
            None => Ok(Self::All),
            Some(v) if v.is_empty() || v == "all" => Ok(Self::All),
            Some(v) if v == "lyrics" => Ok(Self::Lyrics),
            Some(v) => v.parse::<Catalog>().map(Self::Catalog),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Catalog(catalog) => catalog.as_str(),
            Self::Lyrics => "lyrics",
        }
    }
}

impl std::fmt::Display for PlatformFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainError {
    #[error("Unsupported platform: '{0}'")]
    UnsupportedPlatform(String),
}

// ============================================================================
// Query
// ============================================================================

/// An (artist, song) lookup. Values are kept verbatim for display and outbound requests.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Query {
    pub artist: String,
    pub song: String,
}

impl Query {
    pub fn new(artist: impl Into<String>, song: impl Into<String>) -> Self {
        Self {
            artist: artist.into().trim().to_string(),
            song: song.into().trim().to_string(),
        }
    }
}

// ============================================================================
// Records
// ============================================================================

/// Metadata parsed from one catalog's response. Absent fields are `None`, never placeholders.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CatalogRecord {
    pub album_art: Option<String>,
    pub album_title: Option<String>,
    pub album_type: Option<String>,
    pub artists: Option<String>,
    pub genre: Option<String>,
    pub id: Option<String>,
    pub isrc: Option<String>,
    pub lyrics: Option<String>,
    pub release_date: Option<String>,
    pub tempo: Option<f64>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub upc: Option<String>,
    pub url: Option<String>,
}

/// Canonical record merged across catalogs. Fields are declared in name order so the
/// serialized output is stable.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UnifiedRecord {
    pub album_art: Option<String>,
    pub album_art_source: Option<Catalog>,
    pub album_title: Option<String>,
    pub album_type: Option<String>,
    pub artists: Option<String>,
    pub genre: Option<String>,
    pub id: BTreeMap<Catalog, Option<String>>,
    pub isrc: Option<String>,
    pub lyrics: Option<String>,
    pub release_date: Option<String>,
    pub tempo: Option<f64>,
    pub title: Option<String>,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub upc: Option<String>,
    pub url: BTreeMap<Catalog, Option<String>>,
}

impl UnifiedRecord {
    /// Maps a single catalog's record 1:1 into the response shape.
    pub fn from_catalog_record(catalog: Catalog, record: CatalogRecord) -> Self {
        let album_art_source = record.album_art.as_ref().map(|_| catalog);
        Self {
            album_art: record.album_art,
            album_art_source,
            album_title: record.album_title,
            album_type: record.album_type,
            artists: record.artists,
            genre: record.genre,
            id: BTreeMap::from([(catalog, record.id)]),
            isrc: record.isrc,
            lyrics: record.lyrics,
            release_date: record.release_date,
            tempo: record.tempo,
            title: record.title,
            content_type: record.content_type,
            upc: record.upc,
            url: BTreeMap::from([(catalog, record.url)]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LyricsRecord {
    pub artist: String,
    pub title: String,
    pub lyrics: String,
    /// Provider that supplied the text, e.g. `ytmusic`.
    pub source: String,
}

// ============================================================================
// Resolution outcome
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    Song,
    Lyrics,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotFound {
    pub kind: NotFoundKind,
    pub message: String,
}

impl NotFound {
    pub fn song(query: &Query, catalog: Option<Catalog>) -> Self {
        let mut message = format!("Couldn't find '{}' by '{}'", query.song, query.artist);
        if let Some(catalog) = catalog {
            message.push_str(" on ");
            message.push_str(catalog.display_name());
        }
        Self {
            kind: NotFoundKind::Song,
            message,
        }
    }

    pub fn lyrics(query: &Query) -> Self {
        Self {
            kind: NotFoundKind::Lyrics,
            message: format!(
                "Couldn't find lyrics for '{}' by '{}'",
                query.song, query.artist
            ),
        }
    }
}

/// Terminal artifact of one resolution. Cached as-is, not-found outcomes included.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(Box<UnifiedRecord>),
    Lyrics(LyricsRecord),
    NotFound(NotFound),
}

impl Resolution {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Application-level client-credentials token for one catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Lifetime in seconds, as reported by the token endpoint.
    pub expires_in: i64,
    /// Epoch seconds at which the token was requested.
    pub requested_at: i64,
}

impl AccessToken {
    pub fn is_expired_at(&self, now: i64) -> bool {
        now >= self.requested_at + self.expires_in
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now().timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_from_str_accepts_aliases_and_case() {
        assert_eq!("Spotify".parse::<Catalog>().unwrap(), Catalog::Spotify);
        assert_eq!("apple-music".parse::<Catalog>().unwrap(), Catalog::Itunes);
        assert_eq!(" YTMUSIC ".parse::<Catalog>().unwrap(), Catalog::YtMusic);
        assert!("tidal".parse::<Catalog>().is_err());
    }

    #[test]
    fn test_platform_filter_parse() {
        assert_eq!(PlatformFilter::parse(None).unwrap(), PlatformFilter::All);
        assert_eq!(PlatformFilter::parse(Some("")).unwrap(), PlatformFilter::All);
        assert_eq!(PlatformFilter::parse(Some("ALL")).unwrap(), PlatformFilter::All);
        assert_eq!(
            PlatformFilter::parse(Some("lyrics")).unwrap(),
            PlatformFilter::Lyrics
        );
        assert_eq!(
            PlatformFilter::parse(Some("kkbox")).unwrap(),
            PlatformFilter::Catalog(Catalog::Kkbox)
        );
        assert_eq!(
            PlatformFilter::parse(Some("napster")).unwrap_err(),
            DomainError::UnsupportedPlatform("napster".to_string())
        );
    }

    #[test]
    fn test_not_found_messages() {
        let query = Query::new("Artist", "Song");
        assert_eq!(
            NotFound::song(&query, None).message,
            "Couldn't find 'Song' by 'Artist'"
        );
        assert_eq!(
            NotFound::song(&query, Some(Catalog::Spotify)).message,
            "Couldn't find 'Song' by 'Artist' on Spotify"
        );
        let lyrics = NotFound::lyrics(&query);
        assert_eq!(lyrics.kind, NotFoundKind::Lyrics);
        assert_eq!(lyrics.message, "Couldn't find lyrics for 'Song' by 'Artist'");
    }

    #[test]
    fn test_access_token_expiry_boundary() {
        let token = AccessToken {
            access_token: "abc".to_string(),
            refresh_token: None,
            expires_in: 3600,
            requested_at: 1_000,
        };
        assert!(!token.is_expired_at(1_000));
        assert!(!token.is_expired_at(4_599));
        assert!(token.is_expired_at(4_600));
    }

    #[test]
    fn test_single_catalog_record_maps_links() {
        let record = CatalogRecord {
            id: Some("6rqhFgbbKwnb9MLmUQDhG6".to_string()),
            url: Some("https://open.spotify.com/track/6rqhFgbbKwnb9MLmUQDhG6".to_string()),
            album_art: Some("https://i.scdn.co/image/cover".to_string()),
            title: Some("Song".to_string()),
            ..Default::default()
        };

        let unified = UnifiedRecord::from_catalog_record(Catalog::Spotify, record);
        assert_eq!(unified.album_art_source, Some(Catalog::Spotify));
        assert_eq!(unified.id.len(), 1);
        assert_eq!(
            unified.url.get(&Catalog::Spotify).cloned().flatten().as_deref(),
            Some("https://open.spotify.com/track/6rqhFgbbKwnb9MLmUQDhG6")
        );
    }

    #[test]
    fn test_unified_record_serializes_catalog_keys() {
        let mut record = UnifiedRecord::default();
        record.url.insert(Catalog::YtMusic, None);
        record.url.insert(Catalog::Deezer, Some("https://www.deezer.com/track/1".to_string()));
        record.content_type = Some("track".to_string());

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["type"], "track");
        assert_eq!(value["url"]["deezer"], "https://www.deezer.com/track/1");
        assert!(value["url"]["ytmusic"].is_null());
    }
}
