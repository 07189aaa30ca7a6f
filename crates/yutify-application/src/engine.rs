// SPDX-License-Identifier: GPL-3.0-or-later
use reqwest::Client;
use std::sync::Arc;
use tracing::{info, warn};
use yutify_catalogs::{
    kkbox, spotify, CredentialManager, DeezerClient, ItunesClient, KkboxClient,
    LyricsChain, LyricsOvhClient, LyricsSource, SpotifyClient, TokenEndpoint, YtMusicClient,
};
use yutify_config::CatalogsConfig;
use yutify_domain::Catalog;
use yutify_infrastructure::CredentialStore;

use crate::resolver::{CatalogSet, Resolver};

fn credential_manager(
    catalog: Catalog,
    client: &Client,
    token_url: Option<&String>,
    default_token_url: &str,
    client_id: Option<&String>,
    client_secret: Option<&String>,
    store: Arc<dyn CredentialStore>,
) -> Arc<CredentialManager> {
    let client_id = client_id.map(String::as_str).unwrap_or_default();
    let client_secret = client_secret.map(String::as_str).unwrap_or_default();
    if client_id.trim().is_empty() || client_secret.trim().is_empty() {
        warn!(target: "resolver", catalog = %catalog, "client credentials not configured, lookups will report absent");
    }

    let endpoint = TokenEndpoint::new(
        token_url.map_or(default_token_url, String::as_str),
        client_id,
        client_secret,
    );
    Arc::new(CredentialManager::new(catalog, client.clone(), endpoint, store))
}

/// Builds every catalog client and the lyrics chain once, sharing one HTTP client.
pub fn build_resolver(
    config: &CatalogsConfig,
    client: Client,
    store: Arc<dyn CredentialStore>,
) -> Resolver {
    let max = config.max_concurrent_requests;

    let spotify_credentials = credential_manager(
        Catalog::Spotify,
        &client,
        config.spotify.token_url.as_ref(),
        spotify::DEFAULT_TOKEN_URL,
        config.spotify.client_id.as_ref(),
        config.spotify.client_secret.as_ref(),
        Arc::clone(&store),
    );
    let kkbox_credentials = credential_manager(
        Catalog::Kkbox,
        &client,
        config.kkbox.token_url.as_ref(),
        kkbox::DEFAULT_TOKEN_URL,
        config.kkbox.client_id.as_ref(),
        config.kkbox.client_secret.as_ref(),
        store,
    );

    let ytmusic = Arc::new(YtMusicClient::new_with_client(
        client.clone(),
        config.ytmusic.base_url.clone(),
        max,
    ));

    let catalogs = CatalogSet {
        deezer: Arc::new(DeezerClient::new_with_client(
            client.clone(),
            config.deezer.base_url.clone(),
            max,
        )),
        itunes: Arc::new(ItunesClient::new_with_client(
            client.clone(),
            config.itunes.base_url.clone(),
            &config.itunes.country,
            max,
        )),
        kkbox: Arc::new(KkboxClient::new_with_client(
            client.clone(),
            config.kkbox.base_url.clone(),
            kkbox_credentials,
            &config.kkbox.territory,
            max,
        )),
        spotify: Arc::new(SpotifyClient::new_with_client(
            client.clone(),
            config.spotify.base_url.clone(),
            spotify_credentials,
            max,
        )),
        ytmusic: ytmusic.clone(),
    };

    let mut providers: Vec<Arc<dyn LyricsSource>> = vec![ytmusic as Arc<dyn LyricsSource>];
    if config.lyrics.enabled {
        providers.push(Arc::new(LyricsOvhClient::new_with_client(
            client,
            config.lyrics.base_url.clone(),
            1,
        )));
    }
    info!(target: "resolver", lyrics_providers = providers.len(), "catalog clients ready");

    Resolver::new(catalogs, LyricsChain::new(providers))
}
