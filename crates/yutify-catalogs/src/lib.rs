// SPDX-License-Identifier: GPL-3.0-or-later
pub mod adapter;
pub mod credentials;
pub mod dates;
pub mod deezer;
pub mod error;
pub mod itunes;
pub mod kkbox;
pub mod lyrics;
pub mod matcher;
pub mod spotify;
mod transport;
pub mod ytmusic;

pub use adapter::CatalogAdapter;
pub use credentials::{CredentialError, CredentialManager, TokenEndpoint};
pub use deezer::DeezerClient;
pub use error::{CatalogError, Result};
pub use itunes::ItunesClient;
pub use kkbox::KkboxClient;
pub use lyrics::{
    LyricsChain, LyricsError, LyricsLookupError, LyricsOvhClient, LyricsSource, ProviderError,
};
pub use matcher::{any_matches, matches};
pub use spotify::SpotifyClient;
pub use ytmusic::YtMusicClient;
