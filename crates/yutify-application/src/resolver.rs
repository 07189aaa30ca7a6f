// SPDX-License-Identifier: GPL-3.0-or-later
use std::sync::Arc;
use tracing::{debug, info, instrument};
use yutify_catalogs::{CatalogAdapter, LyricsChain};
use yutify_domain::{
    Catalog, CatalogRecord, NotFound, PlatformFilter, Query, Resolution, UnifiedRecord,
};

use crate::merge::merge;

/// One adapter per catalog, constructed once per process.
#[derive(Clone)]
pub struct CatalogSet {
    pub deezer: Arc<dyn CatalogAdapter>,
    pub itunes: Arc<dyn CatalogAdapter>,
    pub kkbox: Arc<dyn CatalogAdapter>,
    pub spotify: Arc<dyn CatalogAdapter>,
    pub ytmusic: Arc<dyn CatalogAdapter>,
}

impl CatalogSet {
    pub fn get(&self, catalog: Catalog) -> &Arc<dyn CatalogAdapter> {
        match catalog {
            Catalog::Deezer => &self.deezer,
            Catalog::Itunes => &self.itunes,
            Catalog::Kkbox => &self.kkbox,
            Catalog::Spotify => &self.spotify,
            Catalog::YtMusic => &self.ytmusic,
        }
    }
}

/// Where a seed for the Spotify lookup came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSource {
    Catalog(Catalog),
    Query,
}

/// Artist, title and optional identifiers handed to the priority leader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seed {
    pub source: SeedSource,
    pub artist: String,
    pub song: String,
    pub isrc: Option<String>,
    pub upc: Option<String>,
}

impl Seed {
    fn from_query(query: &Query) -> Self {
        Self {
            source: SeedSource::Query,
            artist: query.artist.clone(),
            song: query.song.clone(),
            isrc: None,
            upc: None,
        }
    }

    fn from_record(catalog: Catalog, record: &CatalogRecord, query: &Query) -> Self {
        let identifiers = catalog == Catalog::Deezer;
        Self {
            source: SeedSource::Catalog(catalog),
            artist: record.artists.clone().unwrap_or_else(|| query.artist.clone()),
            song: record.title.clone().unwrap_or_else(|| query.song.clone()),
            isrc: record.isrc.clone().filter(|_| identifiers),
            upc: record.upc.clone().filter(|_| identifiers),
        }
    }

    fn has_identifiers(&self) -> bool {
        self.isrc.is_some() || self.upc.is_some()
    }

    fn same_lookup(&self, other: &Seed) -> bool {
        self.artist.to_lowercase() == other.artist.to_lowercase()
            && self.song.to_lowercase() == other.song.to_lowercase()
            && self.isrc == other.isrc
            && self.upc == other.upc
    }
}

/// Ordered seed candidates for the priority leader: the first catalog among
/// Deezer, iTunes and YouTube Music that produced a record, then the raw query
/// unless it repeats that lookup. The catalog's spelling wins over the query's.
pub fn seed_candidates(
    query: &Query,
    deezer: Option<&CatalogRecord>,
    itunes: Option<&CatalogRecord>,
    ytmusic: Option<&CatalogRecord>,
) -> Vec<Seed> {
    let derived = [
        (Catalog::Deezer, deezer),
        (Catalog::Itunes, itunes),
        (Catalog::YtMusic, ytmusic),
    ]
    .into_iter()
    .find_map(|(catalog, record)| record.map(|record| Seed::from_record(catalog, record, query)));

    let raw = Seed::from_query(query);
    match derived {
        Some(seed) if seed.same_lookup(&raw) => vec![seed],
        Some(seed) => vec![seed, raw],
        None => vec![raw],
    }
}

pub struct Resolver {
    catalogs: CatalogSet,
    lyrics: LyricsChain,
}

impl Resolver {
    pub fn new(catalogs: CatalogSet, lyrics: LyricsChain) -> Self {
        Self { catalogs, lyrics }
    }

    pub async fn resolve(&self, query: &Query, filter: PlatformFilter) -> Resolution {
        match filter {
            PlatformFilter::All => self.resolve_all(query).await,
            PlatformFilter::Catalog(catalog) => self.resolve_single(query, catalog).await,
            PlatformFilter::Lyrics => self.resolve_lyrics_only(query).await,
        }
    }

    /// Consults only `catalog` and maps its record 1:1.
    #[instrument(skip(self), fields(artist = %query.artist, song = %query.song, catalog = %catalog))]
    pub async fn resolve_single(&self, query: &Query, catalog: Catalog) -> Resolution {
        match self
            .catalogs
            .get(catalog)
            .search(&query.artist, &query.song)
            .await
        {
            Some(record) => Resolution::Found(Box::new(UnifiedRecord::from_catalog_record(
                catalog, record,
            ))),
            None => Resolution::NotFound(NotFound::song(query, Some(catalog))),
        }
    }

    #[instrument(skip(self), fields(artist = %query.artist, song = %query.song))]
    pub async fn resolve_lyrics_only(&self, query: &Query) -> Resolution {
        match self.lyrics.fetch_lyrics(&query.artist, &query.song).await {
            Ok(record) => Resolution::Lyrics(record),
            Err(error) => {
                debug!(target: "resolver", error = %error, "no lyrics found");
                Resolution::NotFound(NotFound::lyrics(query))
            }
        }
    }

    /// The default chain: Deezer, iTunes and YouTube Music independently, then
    /// Spotify seeded from the best of them, then the field merge.
    #[instrument(skip(self), fields(artist = %query.artist, song = %query.song))]
    pub async fn resolve_all(&self, query: &Query) -> Resolution {
        let (deezer, itunes, ytmusic) = tokio::join!(
            self.catalogs.deezer.search(&query.artist, &query.song),
            self.catalogs.itunes.search(&query.artist, &query.song),
            self.catalogs.ytmusic.search(&query.artist, &query.song),
        );

        let seeds = seed_candidates(query, deezer.as_ref(), itunes.as_ref(), ytmusic.as_ref());
        let spotify = self.lead_lookup(&seeds).await;

        let results = [
            (Catalog::Spotify, spotify),
            (Catalog::Deezer, deezer),
            (Catalog::Itunes, itunes),
            (Catalog::YtMusic, ytmusic),
        ];
        let found: Vec<&str> = results
            .iter()
            .filter(|(_, record)| record.is_some())
            .map(|(catalog, _)| catalog.as_str())
            .collect();
        info!(target: "resolver", artist = %query.artist, song = %query.song, found = ?found, "resolution finished");

        merge(query, &results)
    }

    /// Tries each seed top-down and returns the first Spotify match.
    async fn lead_lookup(&self, seeds: &[Seed]) -> Option<CatalogRecord> {
        for seed in seeds {
            debug!(target: "resolver", source = ?seed.source, artist = %seed.artist, song = %seed.song, "seeding Spotify lookup");
            let record = if seed.has_identifiers() {
                self.catalogs
                    .spotify
                    .search_advanced(
                        &seed.artist,
                        &seed.song,
                        seed.isrc.as_deref(),
                        seed.upc.as_deref(),
                    )
                    .await
            } else {
                self.catalogs.spotify.search(&seed.artist, &seed.song).await
            };

            if record.is_some() {
                return record;
            }
        }
        None
    }
}
