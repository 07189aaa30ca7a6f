use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};
use yutify_catalogs::{CatalogAdapter, ItunesClient};

#[tokio::test]
async fn test_search_queries_storefront_and_parses_single() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("term", "Daft Punk - Get Lucky"))
        .and(query_param("media", "music"))
        .and(query_param("entity", "song"))
        .and(query_param("country", "GB"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resultCount": 1,
            "results": [{
                "wrapperType": "track",
                "kind": "song",
                "trackId": 1442257200,
                "trackName": "Get Lucky (feat. Pharrell Williams & Nile Rodgers)",
                "collectionName": "Get Lucky (feat. Pharrell Williams & Nile Rodgers) - Single",
                "artistName": "Daft Punk",
                "trackViewUrl": "https://music.apple.com/gb/album/get-lucky/1442257199?i=1442257200",
                "artworkUrl100": "https://is1-ssl.mzstatic.com/image/100x100bb.jpg",
                "releaseDate": "2013-04-19T12:00:00Z",
                "primaryGenreName": "Dance"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ItunesClient::new_with_client(reqwest::Client::new(), Some(server.uri()), "gb", 2);
    let record = client
        .search("Daft Punk", "Get Lucky")
        .await
        .expect("song found");

    assert_eq!(record.id.as_deref(), Some("1442257200"));
    assert_eq!(record.album_type.as_deref(), Some("single"));
    assert_eq!(
        record.album_title.as_deref(),
        Some("Get Lucky (feat. Pharrell Williams & Nile Rodgers)")
    );
    assert_eq!(record.release_date.as_deref(), Some("2013-04-19"));
    assert_eq!(record.genre.as_deref(), Some("Dance"));
    assert_eq!(record.content_type.as_deref(), Some("track"));
}

#[tokio::test]
async fn test_search_falls_back_to_album_entity_after_status_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("entity", "song"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("entity", "album"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resultCount": 1,
            "results": [{
                "wrapperType": "collection",
                "collectionType": "Album",
                "collectionId": 697194953,
                "collectionName": "Random Access Memories",
                "artistName": "Daft Punk",
                "collectionViewUrl": "https://music.apple.com/us/album/697194953",
                "releaseDate": "2013-05-17T07:00:00Z",
                "primaryGenreName": "Pop"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ItunesClient::new_with_client(reqwest::Client::new(), Some(server.uri()), "US", 4);
    let record = client
        .try_search("Daft Punk", "Random Access Memories")
        .await
        .unwrap()
        .expect("album found");

    assert_eq!(record.id.as_deref(), Some("697194953"));
    assert_eq!(record.content_type.as_deref(), Some("album"));
    assert_eq!(record.album_type.as_deref(), Some("album"));
}

#[tokio::test]
async fn test_no_match_is_absent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resultCount": 1,
            "results": [{
                "wrapperType": "track", "kind": "song", "trackId": 1,
                "trackName": "Around the World", "collectionName": "Homework",
                "artistName": "Daft Punk"
            }]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = ItunesClient::new_with_client(reqwest::Client::new(), Some(server.uri()), "US", 4);
    assert!(client.search("Daft Punk", "One More Time").await.is_none());
}
