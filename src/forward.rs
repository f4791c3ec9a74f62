use std::time::Duration;

use reqwest::Client;
use serde::Serialize;

use crate::{
    config::ForwardConfig,
    remap::RoutedBundle,
    types::{ExtendedCategory, ReleaseCandidate},
    warning,
};

/// Body POSTed for every forwarded release.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ForwardedRelease {
    pub id: String,
    pub name: String,
    pub category: ExtendedCategory,
    pub release_date: String,
    pub artists: Vec<String>,
    pub url: String,
}

impl ForwardedRelease {
    pub fn new(category: ExtendedCategory, release: &ReleaseCandidate) -> Self {
        Self {
            id: release.id.clone(),
            name: release.name.clone(),
            category,
            release_date: release.release_date.clone(),
            artists: release.artists.iter().map(|a| a.name.clone()).collect(),
            url: format!("https://open.spotify.com/album/{}", release.id),
        }
    }
}

/// Posts written releases to an external endpoint.
///
/// Posts run on their own tasks; the crawl never waits for them.
pub struct Forwarder {
    http: Client,
    config: ForwardConfig,
}

impl Forwarder {
    pub fn new(config: ForwardConfig) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { http, config }
    }

    /// Whether a release passes both whitelists. An empty whitelist passes
    /// everything.
    pub fn accepts(&self, category: ExtendedCategory, release: &ReleaseCandidate) -> bool {
        let category_ok =
            self.config.categories.is_empty() || self.config.categories.contains(&category);
        let artist_ok = self.config.artists.is_empty()
            || release
                .artists
                .iter()
                .filter_map(|a| a.id.as_ref())
                .any(|id| self.config.artists.contains(id));
        category_ok && artist_ok
    }

    /// Spawns one POST per accepted release and returns how many were sent.
    pub fn forward(&self, bundles: &[RoutedBundle]) -> usize {
        let mut sent = 0;
        for routed in bundles {
            if routed.bundle.is_empty() || !self.accepts(routed.category, &routed.bundle.release) {
                continue;
            }

            let payload = ForwardedRelease::new(routed.category, &routed.bundle.release);
            let http = self.http.clone();
            let url = self.config.url.clone();
            tokio::spawn(async move {
                let result = http
                    .post(&url)
                    .json(&payload)
                    .send()
                    .await
                    .and_then(|res| res.error_for_status());
                if let Err(e) = result {
                    warning!("Cannot forward release '{}': {}", payload.name, e);
                }
            });
            sent += 1;
        }
        sent
    }
}
