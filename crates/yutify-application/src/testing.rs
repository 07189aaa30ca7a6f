// SPDX-License-Identifier: GPL-3.0-or-later
//! Scripted catalog adapters for resolver tests.
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use yutify_catalogs::{CatalogAdapter, LyricsError, LyricsSource};
use yutify_domain::{CatalogRecord, LyricsRecord};

use crate::resolver::CatalogSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeenQuery {
    pub artist: String,
    pub song: String,
    pub isrc: Option<String>,
    pub upc: Option<String>,
}

pub struct StubAdapter {
    record: Option<CatalogRecord>,
    only_for_song: Option<String>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    seen: Mutex<Vec<SeenQuery>>,
}

impl StubAdapter {
    pub fn found(record: CatalogRecord) -> Self {
        Self {
            record: Some(record),
            only_for_song: None,
            delay: None,
            calls: AtomicUsize::new(0),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn absent() -> Self {
        Self {
            record: None,
            ..Self::found(CatalogRecord::default())
        }
    }

    pub fn only_for_song(mut self, song: &str) -> Self {
        self.only_for_song = Some(song.to_string());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<SeenQuery> {
        self.seen.lock().unwrap().clone()
    }

    async fn answer(&self, seen: SeenQuery) -> Option<CatalogRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let song_matches = self
            .only_for_song
            .as_deref()
            .map_or(true, |song| song == seen.song);
        self.seen.lock().unwrap().push(seen);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.record.clone().filter(|_| song_matches)
    }
}

#[async_trait]
impl CatalogAdapter for StubAdapter {
    async fn search(&self, artist: &str, song: &str) -> Option<CatalogRecord> {
        self.answer(SeenQuery {
            artist: artist.to_string(),
            song: song.to_string(),
            isrc: None,
            upc: None,
        })
        .await
    }

    async fn search_advanced(
        &self,
        artist: &str,
        song: &str,
        isrc: Option<&str>,
        upc: Option<&str>,
    ) -> Option<CatalogRecord> {
        self.answer(SeenQuery {
            artist: artist.to_string(),
            song: song.to_string(),
            isrc: isrc.map(str::to_string),
            upc: upc.map(str::to_string),
        })
        .await
    }
}

/// Typed handles to the stubs alongside the set the resolver consumes.
pub struct StubSet {
    pub catalogs: CatalogSet,
    pub deezer: Arc<StubAdapter>,
    pub itunes: Arc<StubAdapter>,
    pub kkbox: Arc<StubAdapter>,
    pub spotify: Arc<StubAdapter>,
    pub ytmusic: Arc<StubAdapter>,
}

pub fn catalog_set(
    deezer: StubAdapter,
    itunes: StubAdapter,
    ytmusic: StubAdapter,
    spotify: StubAdapter,
) -> StubSet {
    let deezer = Arc::new(deezer);
    let itunes = Arc::new(itunes);
    let kkbox = Arc::new(StubAdapter::absent());
    let spotify = Arc::new(spotify);
    let ytmusic = Arc::new(ytmusic);

    StubSet {
        catalogs: CatalogSet {
            deezer: deezer.clone(),
            itunes: itunes.clone(),
            kkbox: kkbox.clone(),
            spotify: spotify.clone(),
            ytmusic: ytmusic.clone(),
        },
        deezer,
        itunes,
        kkbox,
        spotify,
        ytmusic,
    }
}

pub struct FixedLyrics(pub &'static str);

#[async_trait]
impl LyricsSource for FixedLyrics {
    fn name(&self) -> &'static str {
        "fixed"
    }

    async fn fetch_lyrics(
        &self,
        artist: &str,
        song: &str,
    ) -> Result<Option<LyricsRecord>, LyricsError> {
        Ok(Some(LyricsRecord {
            artist: artist.to_string(),
            title: song.to_string(),
            lyrics: self.0.to_string(),
            source: self.name().to_string(),
        }))
    }
}
