use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::{
    error::CrawlError,
    management::{ArtistStore, CacheWriter},
    spotify::{Gateway, SpotifyApi},
    types::{ArtistCacheSnapshot, FollowedArtists},
    warning,
};

const FOLLOWED_PAGE_SIZE: u32 = 50;

/// TTL-gated cache of the followed artist ids.
///
/// The snapshot is read from disk on first use. While it is younger than the
/// TTL no remote call is made; afterwards the live list replaces it and the
/// difference is reported as newly followed artists.
pub struct ArtistCache {
    store: ArtistStore,
    writer: CacheWriter,
    ttl: chrono::Duration,
    snapshot: Mutex<Option<ArtistCacheSnapshot>>,
    loaded: Mutex<bool>,
}

impl ArtistCache {
    pub fn new(store: ArtistStore, writer: CacheWriter, ttl: chrono::Duration) -> Self {
        Self {
            store,
            writer,
            ttl,
            snapshot: Mutex::new(None),
            loaded: Mutex::new(false),
        }
    }

    pub async fn followed_artists(
        &self,
        api: &dyn SpotifyApi,
        gateway: &Gateway,
        now: DateTime<Utc>,
    ) -> Result<FollowedArtists, CrawlError> {
        self.load_once().await;

        let mut snapshot = self.snapshot.lock().await;
        if let Some(cached) = snapshot.as_ref() {
            if now - cached.fetched_at < self.ttl {
                return Ok(FollowedArtists {
                    all_ids: cached.ids.iter().cloned().collect(),
                    newly_added_ids: Vec::new(),
                });
            }
        }

        let live = gateway
            .page_cursor(|after| api.get_followed_artists(after, FOLLOWED_PAGE_SIZE))
            .await?;
        if live.is_empty() {
            return Err(CrawlError::EmptyResult("no followed artists"));
        }

        let mut all_ids = Vec::with_capacity(live.len());
        let mut live_ids = BTreeSet::new();
        for artist in live {
            if live_ids.insert(artist.id.clone()) {
                all_ids.push(artist.id);
            }
        }

        let cached_ids = snapshot.as_ref().map(|s| s.ids.clone()).unwrap_or_default();
        let newly_added_ids = all_ids
            .iter()
            .filter(|id| !cached_ids.contains(*id))
            .cloned()
            .collect::<Vec<_>>();
        let removed = cached_ids.difference(&live_ids).count();
        if removed > 0 {
            crate::info!("{} artists were unfollowed since the last fetch", removed);
        }

        let fresh = ArtistCacheSnapshot {
            ids: live_ids,
            fetched_at: now,
        };
        self.writer.artists(fresh.clone());
        *snapshot = Some(fresh);

        Ok(FollowedArtists {
            all_ids,
            newly_added_ids,
        })
    }

    async fn load_once(&self) {
        let mut loaded = self.loaded.lock().await;
        if *loaded {
            return;
        }
        *loaded = true;

        match self.store.load().await {
            Ok(stored) => *self.snapshot.lock().await = stored,
            Err(e) => warning!("Cannot read artist cache, starting empty: {}", e),
        }
    }
}
