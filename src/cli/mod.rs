//! # CLI Module
//!
//! Implementations of the `sporlradar` commands:
//!
//! - [`auth`] - OAuth 2.0 PKCE login, stores the token in `cache/token.json`
//! - [`serve`] - the long-running service with crawl and notifier timers and
//!   the HTTP API
//! - [`crawl`] - boots a crawler, runs one crawl and prints a summary table
//! - [`notifiers`] - runs one notifier sweep or clears every marker
//!
//! ## Usage Patterns
//!
//! ```bash
//! sporlradar auth                  # Authenticate with Spotify
//! sporlradar crawl                 # One crawl, then exit
//! sporlradar serve                 # Crawl every 30 minutes
//! sporlradar notifiers --clear     # Remove all "new" markers
//! ```
//!
//! Fatal startup failures, such as a missing token, end the process with
//! [`crate::error!`]. Everything after startup is reported with
//! [`crate::warning!`].

mod auth;
mod crawl;
mod notifiers;
mod serve;

use std::sync::Arc;

use crate::{
    config::Config,
    error,
    management::TokenManager,
    spotify::{SpotifyApi, SpotifyClient},
};

pub use auth::auth;
pub use crawl::crawl;
pub use notifiers::notifiers;
pub use serve::serve;

async fn connect(config: &Config) -> Arc<dyn SpotifyApi> {
    let tokens = match TokenManager::load(config.token_path(), config.spotify.clone()).await {
        Ok(tokens) => tokens,
        Err(e) => error!(
            "Failed to load token. Please run sporlradar auth\n Error: {}",
            e
        ),
    };

    match SpotifyClient::new(config, tokens) {
        Ok(client) => Arc::new(client),
        Err(e) => error!("Cannot create Spotify client. Err: {}", e),
    }
}
