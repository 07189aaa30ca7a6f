// SPDX-License-Identifier: GPL-3.0-or-later
use std::collections::BTreeMap;
use yutify_domain::{Catalog, CatalogRecord, NotFound, Query, Resolution, UnifiedRecord};

/// Field precedence for the default chain: Spotify, Deezer, iTunes, YouTube Music.
pub const MERGE_PRIORITY: [Catalog; 4] = [
    Catalog::Spotify,
    Catalog::Deezer,
    Catalog::Itunes,
    Catalog::YtMusic,
];

fn priority_rank(catalog: Catalog) -> usize {
    MERGE_PRIORITY
        .iter()
        .position(|candidate| *candidate == catalog)
        .unwrap_or(MERGE_PRIORITY.len())
}

fn first<T: Clone>(
    present: &[(Catalog, &CatalogRecord)],
    field: impl Fn(&CatalogRecord) -> Option<&T>,
) -> Option<(Catalog, T)> {
    present
        .iter()
        .find_map(|(catalog, record)| field(*record).map(|value| (*catalog, value.clone())))
}

fn value<T: Clone>(
    present: &[(Catalog, &CatalogRecord)],
    field: impl Fn(&CatalogRecord) -> Option<&T>,
) -> Option<T> {
    first(present, field).map(|(_, value)| value)
}

fn normalize_album_type(album_type: String) -> String {
    if album_type.eq_ignore_ascii_case("track") {
        "single".to_string()
    } else {
        album_type
    }
}

/// Merges per-catalog results into one record.
///
/// Every field takes the first non-absent value in [`MERGE_PRIORITY`] order,
/// independent of the order `results` arrive in. The `id` and `url` maps list every
/// consulted catalog, `None` where it had no result.
pub fn merge(query: &Query, results: &[(Catalog, Option<CatalogRecord>)]) -> Resolution {
    let mut present: Vec<(Catalog, &CatalogRecord)> = results
        .iter()
        .filter_map(|(catalog, record)| record.as_ref().map(|record| (*catalog, record)))
        .collect();

    if present.is_empty() {
        return Resolution::NotFound(NotFound::song(query, None));
    }
    present.sort_by_key(|(catalog, _)| priority_rank(*catalog));

    let mut id = BTreeMap::new();
    let mut url = BTreeMap::new();
    for (catalog, record) in results {
        let record = record.as_ref();
        id.insert(*catalog, record.and_then(|record| record.id.clone()));
        url.insert(*catalog, record.and_then(|record| record.url.clone()));
    }

    let album_art = first(&present, |record| record.album_art.as_ref());

    let unified = UnifiedRecord {
        album_art_source: album_art.as_ref().map(|(catalog, _)| *catalog),
        album_art: album_art.map(|(_, art)| art),
        album_title: value(&present, |record| record.album_title.as_ref()),
        album_type: value(&present, |record| record.album_type.as_ref()).map(normalize_album_type),
        artists: value(&present, |record| record.artists.as_ref()),
        genre: value(&present, |record| record.genre.as_ref()),
        id,
        isrc: value(&present, |record| record.isrc.as_ref()),
        lyrics: value(&present, |record| record.lyrics.as_ref()),
        release_date: value(&present, |record| record.release_date.as_ref()),
        tempo: value(&present, |record| record.tempo.as_ref()),
        title: value(&present, |record| record.title.as_ref()),
        content_type: value(&present, |record| record.content_type.as_ref()),
        upc: value(&present, |record| record.upc.as_ref()),
        url,
    };

    Resolution::Found(Box::new(unified))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str) -> CatalogRecord {
        CatalogRecord {
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    fn found(resolution: Resolution) -> UnifiedRecord {
        match resolution {
            Resolution::Found(record) => *record,
            other => panic!("expected a record, got: {other:?}"),
        }
    }

    #[test]
    fn spotify_title_wins_over_deezer() {
        let query = Query::new("Artist", "Song");
        let results = vec![
            (Catalog::Deezer, Some(record("Deezer Title"))),
            (Catalog::Spotify, Some(record("Spotify Title"))),
        ];
        let unified = found(merge(&query, &results));
        assert_eq!(unified.title.as_deref(), Some("Spotify Title"));
    }

    #[test]
    fn lower_priority_fills_gaps() {
        let query = Query::new("Artist", "Song");
        let deezer = CatalogRecord {
            isrc: Some("GBDUW0000053".to_string()),
            tempo: Some(122.0),
            ..record("One More Time")
        };
        let ytmusic = CatalogRecord {
            lyrics: Some("One more time".to_string()),
            album_art: Some("https://yt.test/art".to_string()),
            ..record("One More Time (Official Video)")
        };
        let results = vec![
            (Catalog::Spotify, None),
            (Catalog::Deezer, Some(deezer)),
            (Catalog::Itunes, None),
            (Catalog::YtMusic, Some(ytmusic)),
        ];

        let unified = found(merge(&query, &results));
        assert_eq!(unified.title.as_deref(), Some("One More Time"));
        assert_eq!(unified.isrc.as_deref(), Some("GBDUW0000053"));
        assert_eq!(unified.lyrics.as_deref(), Some("One more time"));
        assert_eq!(unified.album_art_source, Some(Catalog::YtMusic));
        assert_eq!(unified.tempo, Some(122.0));
    }

    #[test]
    fn link_maps_list_every_consulted_catalog() {
        let query = Query::new("Artist", "Song");
        let itunes = CatalogRecord {
            id: Some("1".to_string()),
            url: Some("https://music.apple.com/1".to_string()),
            ..record("Song")
        };
        let results = vec![
            (Catalog::Spotify, None),
            (Catalog::Deezer, None),
            (Catalog::Itunes, Some(itunes)),
            (Catalog::YtMusic, None),
        ];

        let unified = found(merge(&query, &results));
        assert_eq!(unified.url.len(), 4);
        assert_eq!(unified.id.len(), 4);
        assert_eq!(unified.url[&Catalog::Spotify], None);
        assert_eq!(
            unified.url[&Catalog::Itunes].as_deref(),
            Some("https://music.apple.com/1")
        );
    }

    #[test]
    fn track_album_type_becomes_single() {
        let query = Query::new("Artist", "Song");
        let deezer = CatalogRecord {
            album_type: Some("track".to_string()),
            ..record("Song")
        };
        let unified = found(merge(&query, &[(Catalog::Deezer, Some(deezer))]));
        assert_eq!(unified.album_type.as_deref(), Some("single"));
    }

    #[test]
    fn input_order_does_not_matter() {
        let query = Query::new("Artist", "Song");
        let deezer = CatalogRecord {
            genre: Some("Electro".to_string()),
            ..record("Deezer")
        };
        let itunes = CatalogRecord {
            genre: Some("Dance".to_string()),
            ..record("iTunes")
        };
        let ytmusic = record("YouTube");

        let forward = vec![
            (Catalog::Deezer, Some(deezer.clone())),
            (Catalog::Itunes, Some(itunes.clone())),
            (Catalog::YtMusic, Some(ytmusic.clone())),
        ];
        let reversed = vec![
            (Catalog::YtMusic, Some(ytmusic)),
            (Catalog::Itunes, Some(itunes)),
            (Catalog::Deezer, Some(deezer)),
        ];
        assert_eq!(merge(&query, &forward), merge(&query, &reversed));
    }

    #[test]
    fn nothing_found_is_not_found() {
        let query = Query::new("Artist", "Song");
        let results = vec![(Catalog::Spotify, None), (Catalog::Deezer, None)];
        match merge(&query, &results) {
            Resolution::NotFound(not_found) => {
                assert_eq!(not_found.message, "Couldn't find 'Song' by 'Artist'")
            }
            other => panic!("expected not found, got: {other:?}"),
        }
    }
}
