//! # Crawl Orchestrator
//!
//! Sequences one crawl through all pipeline stages and makes sure only one
//! crawl runs at a time:
//!
//! ```text
//! purge → followed artists → discovery → filters → tracks
//!       → appears-on filter → remap → route → write + notify + forward
//! ```
//!
//! The crawler moves through three states held in a single atomic:
//!
//! - `Booting` until the first crawl succeeds
//! - `Ready` while idle
//! - `Crawling` while a crawl runs
//!
//! A trigger arriving while a crawl runs is rejected at once, never queued.

use std::{
    collections::{BTreeMap, BTreeSet, HashSet},
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU8, Ordering},
    },
};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
    config::Config,
    discovery::{self, ArtistCache},
    error::{CrawlError, GatewayError},
    executor::FetchExecutor,
    filter,
    forward::Forwarder,
    info,
    management::{ArtistStore, CacheWriter, PlaylistStore, ReleaseStore, targets_from},
    playlist::{self, Notifier, PlaylistWriter, WriteOutcome},
    remap::{self, RemapEngine, WriteBatch},
    spotify::{Gateway, SpotifyApi},
    types::{ExtendedCategory, PlaylistTarget},
    warning,
};

const BOOTING: u8 = 0;
const READY: u8 = 1;
const CRAWLING: u8 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlerState {
    Booting,
    Ready,
    Crawling,
}

impl From<u8> for CrawlerState {
    fn from(value: u8) -> Self {
        match value {
            READY => CrawlerState::Ready,
            CRAWLING => CrawlerState::Crawling,
            _ => CrawlerState::Booting,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlStatus {
    Ok,
    Rejected,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub releases: usize,
    pub tracks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CrawlSummary {
    pub followed_artists: usize,
    pub newly_followed: usize,
    pub purged: usize,
    pub discovered: usize,
    pub after_cache: usize,
    pub after_duplicates: usize,
    pub after_date: usize,
    pub resolved: usize,
    pub written: BTreeMap<ExtendedCategory, CategoryCount>,
    pub forwarded: usize,
    pub rejected_playlists: Vec<String>,
}

impl CrawlSummary {
    pub fn written_releases(&self) -> usize {
        self.written.values().map(|c| c.releases).sum()
    }

    pub fn written_tracks(&self) -> usize {
        self.written.values().map(|c| c.tracks).sum()
    }

    fn record(&mut self, batch: &WriteBatch) {
        for routed in &batch.bundles {
            if routed.bundle.is_empty() {
                continue;
            }
            let count = self.written.entry(routed.category).or_default();
            count.releases += 1;
            count.tracks += routed.bundle.tracks.len();
        }
    }
}

impl fmt::Display for CrawlSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} artists ({} new), candidates {} > {} > {} > {}, {} resolved, wrote {} releases with {} tracks",
            self.followed_artists,
            self.newly_followed,
            self.discovered,
            self.after_cache,
            self.after_duplicates,
            self.after_date,
            self.resolved,
            self.written_releases(),
            self.written_tracks()
        )?;
        if !self.rejected_playlists.is_empty() {
            write!(f, ", rejected {}", self.rejected_playlists.join(","))?;
        }
        Ok(())
    }
}

/// Outcome of a crawl trigger as reported to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrawlReport {
    pub status: CrawlStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<CrawlSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CrawlReport {
    fn from_result(result: Result<CrawlSummary, CrawlError>) -> Self {
        match result {
            Ok(summary) => Self {
                status: CrawlStatus::Ok,
                summary: Some(summary),
                error: None,
            },
            Err(e) => Self {
                status: CrawlStatus::Error,
                summary: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn rejected() -> Self {
        Self {
            status: CrawlStatus::Rejected,
            summary: None,
            error: None,
        }
    }
}

/// Puts the state back when a crawl ends, however it ends.
struct StateGuard<'a> {
    state: &'a AtomicU8,
    on_drop: u8,
}

impl Drop for StateGuard<'_> {
    fn drop(&mut self) {
        self.state.store(self.on_drop, Ordering::Release);
    }
}

pub struct Crawler {
    config: Arc<Config>,
    api: Arc<dyn SpotifyApi>,
    gateway: Gateway,
    executor: FetchExecutor,
    artists: ArtistCache,
    releases: ReleaseStore,
    cache_writer: CacheWriter,
    playlist_writer: PlaylistWriter,
    notifier: Notifier,
    forwarder: Option<Forwarder>,
    targets: Mutex<Vec<PlaylistTarget>>,
    state: AtomicU8,
}

impl Crawler {
    /// Builds a crawler and spawns its cache writer.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(config: Arc<Config>, api: Arc<dyn SpotifyApi>, targets: Vec<PlaylistTarget>) -> Self {
        let gateway = Gateway::from_config(&config);
        let releases = ReleaseStore::new(&config.data_dir);
        let artist_store = ArtistStore::new(&config.data_dir);
        let cache_writer = CacheWriter::spawn(
            releases.clone(),
            artist_store.clone(),
            PlaylistStore::new(&config.data_dir),
        );

        Self {
            executor: FetchExecutor::new(config.pool_size),
            artists: ArtistCache::new(artist_store, cache_writer.clone(), config.artist_cache_ttl),
            playlist_writer: PlaylistWriter::new(
                Arc::clone(&api),
                gateway.clone(),
                config.circular_fitting,
                config.insert_cooldown,
            ),
            notifier: Notifier::new(Arc::clone(&api), gateway.clone(), config.notifier_timeout),
            forwarder: config.forward.clone().map(Forwarder::new),
            targets: Mutex::new(targets),
            state: AtomicU8::new(BOOTING),
            releases,
            cache_writer,
            gateway,
            api,
            config,
        }
    }

    /// Builds a crawler with the playlist targets of the configuration,
    /// completed by the ones remembered in `state/playlists.json`.
    pub async fn from_config(config: Arc<Config>, api: Arc<dyn SpotifyApi>) -> Self {
        let targets = match PlaylistStore::new(&config.data_dir).targets(&config).await {
            Ok(targets) => targets,
            Err(e) => {
                warning!("Cannot read playlist state: {}", e);
                targets_from(&config, &BTreeMap::new())
            }
        };
        Self::new(config, api, targets)
    }

    pub fn state(&self) -> CrawlerState {
        CrawlerState::from(self.state.load(Ordering::Acquire))
    }

    pub fn cache_writer(&self) -> &CacheWriter {
        &self.cache_writer
    }

    pub async fn targets(&self) -> Vec<PlaylistTarget> {
        self.targets.lock().await.clone()
    }

    pub async fn boot(&self) -> Result<CrawlSummary, CrawlError> {
        self.boot_at(Utc::now()).await
    }

    /// Seeds the notifier markers and runs the first crawl.
    ///
    /// On success the crawler becomes ready; on failure it stays booting and
    /// `boot` may be called again.
    pub async fn boot_at(&self, now: DateTime<Utc>) -> Result<CrawlSummary, CrawlError> {
        if self
            .state
            .compare_exchange(BOOTING, CRAWLING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(CrawlError::NotBooting);
        }
        let mut guard = StateGuard {
            state: &self.state,
            on_drop: BOOTING,
        };

        self.seed_notifiers().await;
        let result = self.crawl(now).await;
        if result.is_ok() {
            guard.on_drop = READY;
        }
        result
    }

    pub async fn try_crawl(&self) -> CrawlReport {
        self.try_crawl_at(Utc::now()).await
    }

    /// Runs a crawl unless one is already running or the crawler has not
    /// booted yet, in which case the trigger is rejected immediately.
    pub async fn try_crawl_at(&self, now: DateTime<Utc>) -> CrawlReport {
        if self
            .state
            .compare_exchange(READY, CRAWLING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            info!("Crawler is busy or still booting, trigger rejected");
            return CrawlReport::rejected();
        }
        let _guard = StateGuard {
            state: &self.state,
            on_drop: READY,
        };

        let result = self.crawl(now).await;
        if let Err(e) = &result {
            warning!("Crawl failed: {}", e);
        }
        CrawlReport::from_result(result)
    }

    pub async fn sweep_notifiers(&self) -> Result<usize, GatewayError> {
        self.sweep_notifiers_at(Utc::now()).await
    }

    pub async fn sweep_notifiers_at(&self, now: DateTime<Utc>) -> Result<usize, GatewayError> {
        let mut targets = self.targets.lock().await;
        self.notifier.sweep(&mut targets, now).await
    }

    /// Turns every notifier off regardless of age or playback.
    pub async fn clear_notifiers(&self) -> Result<usize, GatewayError> {
        let mut targets = self.targets.lock().await;
        let mut cleared = 0;
        for target in targets.iter_mut().filter(|t| t.is_new()) {
            self.notifier.clear(target).await?;
            cleared += 1;
        }
        Ok(cleared)
    }

    /// Restores the notifier markers from the playlists themselves.
    pub async fn seed_notifiers(&self) {
        let mut targets = self.targets.lock().await;
        for target in targets.iter_mut() {
            if let Err(e) = self.notifier.seed(target).await {
                warning!("Cannot read notifier state of {}: {}", target.category, e);
            }
        }
    }

    /// One crawl. Seen release ids and names are handed to the cache writer
    /// however the crawl ends.
    async fn crawl(&self, now: DateTime<Utc>) -> Result<CrawlSummary, CrawlError> {
        info!("Starting crawl");
        let mut seen_ids = Vec::new();
        let mut seen_names = Vec::new();

        let result = self.run(now, &mut seen_ids, &mut seen_names).await;

        self.cache_writer.release_ids(seen_ids);
        self.cache_writer.release_names(seen_names);

        if let Ok(summary) = &result {
            crate::success!("Crawl finished: {}", summary);
        }
        result
    }

    async fn run(
        &self,
        now: DateTime<Utc>,
        seen_ids: &mut Vec<String>,
        seen_names: &mut Vec<String>,
    ) -> Result<CrawlSummary, CrawlError> {
        let config = self.config.as_ref();
        let api = self.api.as_ref();
        let today = now.date_naive();
        let mut summary = CrawlSummary::default();

        if let Some(days) = config.auto_purge_days {
            summary.purged = self.purge(now - chrono::Duration::days(days as i64)).await?;
        }

        let followed = self.artists.followed_artists(api, &self.gateway, now).await?;
        summary.followed_artists = followed.all_ids.len();
        summary.newly_followed = followed.newly_added_ids.len();
        if !followed.newly_added_ids.is_empty() {
            info!("Newly followed artists: {}", followed.newly_added_ids.join(","));
        }

        let candidates = discovery::discover_releases(
            Arc::clone(&self.api),
            &self.gateway,
            &self.executor,
            &followed.all_ids,
            config.market.as_deref(),
        )
        .await;
        summary.discovered = candidates.len();

        let cached_ids = self.releases.load_ids().await.unwrap_or_else(|e| {
            warning!("Cannot read release id cache: {}", e);
            BTreeSet::new()
        });
        let cached_names = self.releases.load_names().await.unwrap_or_else(|e| {
            warning!("Cannot read release name cache: {}", e);
            BTreeSet::new()
        });

        let candidates = filter::drop_cached(candidates, &cached_ids, seen_ids);
        summary.after_cache = candidates.len();
        let candidates = filter::drop_duplicates(candidates, &cached_names, seen_names);
        summary.after_duplicates = candidates.len();
        let candidates = filter::drop_outdated(
            candidates,
            today,
            config.lookback_days,
            config.separate_rereleases,
        );
        summary.after_date = candidates.len();
        if candidates.is_empty() {
            return Ok(summary);
        }

        let candidates = filter::resolve_provenance(api, &self.gateway, candidates).await?;
        let bundles = discovery::resolve_tracks(
            Arc::clone(&self.api),
            &self.gateway,
            &self.executor,
            candidates,
        )
        .await;
        summary.resolved = bundles.len();

        let mut buckets = remap::bucketize(bundles);
        if config.intelligent_appears_on {
            if let Some(appears_on) = buckets.remove(&ExtendedCategory::AppearsOn) {
                let followed_set = followed.all_ids.iter().cloned().collect::<HashSet<_>>();
                buckets.insert(
                    ExtendedCategory::AppearsOn,
                    filter::filter_appears_on(appears_on, &followed_set),
                );
            }
        }

        let targets = self.targets.lock().await.clone();
        let enabled = targets
            .iter()
            .filter(|t| t.playlist_id.is_some())
            .map(|t| t.category)
            .collect::<BTreeSet<_>>();
        let engine = RemapEngine::from_config(
            config,
            &enabled,
            today,
            Arc::clone(&self.api),
            self.gateway.clone(),
        );
        engine.apply(&mut buckets).await;

        for batch in remap::route(buckets, &targets) {
            self.write_batch(&batch, now, &mut summary).await?;
        }

        Ok(summary)
    }

    async fn write_batch(
        &self,
        batch: &WriteBatch,
        now: DateTime<Utc>,
        summary: &mut CrawlSummary,
    ) -> Result<(), CrawlError> {
        let outcome = self
            .playlist_writer
            .write(&batch.playlist_id, &batch.track_uris())
            .await?;

        match outcome {
            WriteOutcome::Written { tracks, evicted } => {
                info!(
                    "Wrote {} tracks to playlist {} ({} evicted)",
                    tracks, batch.playlist_id, evicted
                );
                summary.record(batch);
                self.mark_new(&batch.playlist_id, now).await;
                for category in &batch.categories {
                    self.cache_writer
                        .playlist_updated(*category, &batch.playlist_id, now);
                }
                if let Some(forwarder) = &self.forwarder {
                    summary.forwarded += forwarder.forward(&batch.bundles);
                }
            }
            WriteOutcome::Rejected { .. } => {
                summary.rejected_playlists.push(batch.playlist_id.clone());
            }
            WriteOutcome::Skipped => {}
        }

        Ok(())
    }

    /// Marks every target writing into `playlist_id` as new. The playlist
    /// itself is updated once.
    async fn mark_new(&self, playlist_id: &str, now: DateTime<Utc>) {
        let mut targets = self.targets.lock().await;
        let mut matching = targets
            .iter_mut()
            .filter(|t| t.playlist_id.as_deref() == Some(playlist_id));

        let Some(first) = matching.next() else {
            return;
        };
        if let Err(e) = self.notifier.mark_new(first, now).await {
            warning!("Cannot update notifier of playlist {}: {}", playlist_id, e);
            return;
        }
        for target in matching {
            target.last_new_marker = Some(now);
        }
    }

    async fn purge(&self, older_than: DateTime<Utc>) -> Result<usize, GatewayError> {
        let playlist_ids = self
            .targets
            .lock()
            .await
            .iter()
            .filter_map(|t| t.playlist_id.clone())
            .collect::<BTreeSet<_>>();

        let mut purged = 0;
        for playlist_id in playlist_ids {
            let removed =
                playlist::purge_expired(self.api.as_ref(), &self.gateway, &playlist_id, older_than)
                    .await?;
            if removed > 0 {
                info!("Purged {} expired tracks from playlist {}", removed, playlist_id);
            }
            purged += removed;
        }
        Ok(purged)
    }
}
