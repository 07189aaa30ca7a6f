// SPDX-License-Identifier: GPL-3.0-or-later
use std::path::Path;

use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_max_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://yutify.db".to_string(),
            pool_max_size: 4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    pub host: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Result cache sizing. Not-found outcomes share the same TTL as records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub ttl_secs: u64,
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 300,
            max_capacity: 10_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeezerConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItunesConfig {
    pub base_url: Option<String>,
    pub country: String,
}

impl Default for ItunesConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            country: "US".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct YtMusicConfig {
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SpotifyConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub base_url: Option<String>,
    pub token_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KkboxConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub base_url: Option<String>,
    pub token_url: Option<String>,
    pub territory: String,
}

impl Default for KkboxConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            client_secret: None,
            base_url: None,
            token_url: None,
            territory: "TW".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LyricsServiceConfig {
    pub enabled: bool,
    pub base_url: Option<String>,
}

impl Default for LyricsServiceConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogsConfig {
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
    pub deezer: DeezerConfig,
    pub itunes: ItunesConfig,
    pub ytmusic: YtMusicConfig,
    pub spotify: SpotifyConfig,
    pub kkbox: KkboxConfig,
    pub lyrics: LyricsServiceConfig,
}

impl Default for CatalogsConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            max_concurrent_requests: 4,
            deezer: DeezerConfig::default(),
            itunes: ItunesConfig::default(),
            ytmusic: YtMusicConfig::default(),
            spotify: SpotifyConfig::default(),
            kkbox: KkboxConfig::default(),
            lyrics: LyricsServiceConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub http: HttpConfig,
    pub telemetry: TelemetryConfig,
    pub cache: CacheConfig,
    pub catalogs: CatalogsConfig,
}

/// Load configuration from defaults, optional TOML file, and environment overrides (prefix: YUTIFY_).
pub fn load(config_path: Option<&Path>) -> Result<AppConfig> {
    let mut figment = Figment::from(Serialized::defaults(AppConfig::default()));

    if let Some(path) = config_path {
        figment = figment.merge(Toml::file(path));
    }

    figment = figment.merge(Env::prefixed("YUTIFY_").split("__"));

    let config: AppConfig = figment.extract()?;
    info!(target: "config", "configuration loaded");
    Ok(config)
}
